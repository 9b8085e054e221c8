//! In-memory form of one record: nodes and edges in enumeration order.

pub mod edge;
pub mod node;

pub use edge::{Edge, EdgeKind};
pub use node::{Node, NodeKind};

/// One decoded record. Enumeration order of `nodes` and `edges` is the
/// order they appear in the file and determines extraction order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    /// Path of the source file the record was produced from, if recorded.
    pub source_file: Option<String>,
    pub first_token: Option<Node>,
    pub ast_root: Option<Node>,
}

impl Graph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}
