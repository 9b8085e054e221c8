//! Feature-graph records and method token chains.
//!
//! A record is one protobuf-encoded AST graph of a single source file. This
//! crate decodes records ([`read_graph_file`], [`decode_graph`]) and recovers
//! the linear token sequence of every method in a record by following
//! next-token edges ([`TokenGraph`], [`extract_method_tokens`]).

mod errors;
mod extract;
pub mod model;
mod reader;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use errors::{Boundary, GraphError, Result};
pub use extract::{
    AmbiguityPolicy, ExtractOptions, ExtractStats, MethodSequences, TokenGraph,
    extract_method_tokens,
};
pub use model::{Edge, EdgeKind, Graph, Node, NodeKind};
pub use reader::{decode_graph, read_graph_file};
