//! Record construction helpers for tests: a fluent graph builder and a
//! protobuf encoder producing bytes [`crate::decode_graph`] accepts.

use crate::model::{Edge, EdgeKind, Graph, Node, NodeKind};

/// Marker carried in `contents` by method root nodes.
pub const METHOD: &str = "METHOD";

#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: Graph,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source_file(mut self, path: &str) -> Self {
        self.graph.source_file = Some(path.to_string());
        self
    }

    pub fn node(mut self, id: i64, kind: NodeKind, contents: &str, start: i32, end: i32) -> Self {
        self.graph.nodes.push(Node {
            id,
            kind,
            contents: contents.to_string(),
            start_position: start,
            end_position: end,
            start_line: 1,
            end_line: 1,
        });
        self
    }

    pub fn token(self, id: i64, text: &str, start: i32, end: i32) -> Self {
        self.node(id, NodeKind::Token, text, start, end)
    }

    pub fn identifier(self, id: i64, text: &str, start: i32, end: i32) -> Self {
        self.node(id, NodeKind::IdentifierToken, text, start, end)
    }

    /// An AST element whose span marks a method.
    pub fn method(self, id: i64, start: i32, end: i32) -> Self {
        self.node(id, NodeKind::AstElement, METHOD, start, end)
    }

    pub fn edge(mut self, source: i64, destination: i64, kind: EdgeKind) -> Self {
        self.graph.edges.push(Edge {
            source_id: source,
            destination_id: destination,
            kind,
        });
        self
    }

    pub fn next_token(self, source: i64, destination: i64) -> Self {
        self.edge(source, destination, EdgeKind::NextToken)
    }

    pub fn build(self) -> Graph {
        self.graph
    }
}

/// Tokens laid out back to back, chained by next-token edges, followed by
/// a terminator token `;` (the chain end, which is not part of the method
/// sequence) and one method root spanning them.
///
/// Token ids start at `first_id`; the method root gets the next free id.
pub fn method_graph(first_id: i64, tokens: &[&str]) -> GraphBuilder {
    let mut b = GraphBuilder::new();
    let mut pos = 0;
    let mut id = first_id;
    let mut spans = Vec::new();
    for text in tokens.iter().copied().chain(std::iter::once(";")) {
        let end = pos + text.len() as i32;
        b = b.token(id, text, pos, end);
        spans.push((id, pos, end));
        pos = end + 1;
        id += 1;
    }
    for pair in spans.windows(2) {
        b = b.next_token(pair[0].0, pair[1].0);
    }
    let start = spans[0].1;
    let end = spans[spans.len() - 1].2;
    b.method(id, start, end)
}

/// Encode a graph with the same field layout the reader expects.
pub fn encode_graph(graph: &Graph) -> Vec<u8> {
    let mut out = Vec::new();
    for node in &graph.nodes {
        put_message(&mut out, 1, &encode_node(node));
    }
    for edge in &graph.edges {
        put_message(&mut out, 2, &encode_edge(edge));
    }
    if let Some(path) = &graph.source_file {
        put_message(&mut out, 3, path.as_bytes());
    }
    if let Some(node) = &graph.first_token {
        put_message(&mut out, 4, &encode_node(node));
    }
    if let Some(node) = &graph.ast_root {
        put_message(&mut out, 5, &encode_node(node));
    }
    out
}

fn encode_node(node: &Node) -> Vec<u8> {
    let mut out = Vec::new();
    put_varint_field(&mut out, 1, node.id as u64);
    put_varint_field(&mut out, 2, node.kind.as_i32() as i64 as u64);
    put_message(&mut out, 3, node.contents.as_bytes());
    put_varint_field(&mut out, 4, node.start_position as i64 as u64);
    put_varint_field(&mut out, 5, node.end_position as i64 as u64);
    put_varint_field(&mut out, 6, node.start_line as i64 as u64);
    put_varint_field(&mut out, 7, node.end_line as i64 as u64);
    out
}

fn encode_edge(edge: &Edge) -> Vec<u8> {
    let mut out = Vec::new();
    put_varint_field(&mut out, 1, edge.source_id as u64);
    put_varint_field(&mut out, 2, edge.kind.as_i32() as i64 as u64);
    put_varint_field(&mut out, 3, edge.destination_id as u64);
    out
}

fn put_varint_field(out: &mut Vec<u8>, field: u32, value: u64) {
    put_varint(out, (field as u64) << 3);
    put_varint(out, value);
}

fn put_message(out: &mut Vec<u8>, field: u32, body: &[u8]) {
    put_varint(out, ((field as u64) << 3) | 2);
    put_varint(out, body.len() as u64);
    out.extend_from_slice(body);
}

fn put_varint(out: &mut Vec<u8>, mut value: u64) {
    loop {
        let byte = (value & 0x7F) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return;
        }
        out.push(byte | 0x80);
    }
}
