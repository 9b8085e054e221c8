//! Record reader for protobuf-encoded feature graphs.
//!
//! The schema is small and stable, so the wire format is parsed directly
//! instead of going through generated code.
//!
//! ```text
//! Graph {
//!   node: [FeatureNode]        (field 1, repeated)
//!   edge: [FeatureEdge]        (field 2, repeated)
//!   sourceFile: string         (field 3)
//!   first_token: FeatureNode   (field 4)
//!   ast_root: FeatureNode      (field 5)
//! }
//! FeatureNode {
//!   id: int64 (1)  type: enum (2)  contents: string (3)
//!   startPosition: int32 (4)  endPosition: int32 (5)
//!   startLineNumber: int32 (6)  endLineNumber: int32 (7)
//! }
//! FeatureEdge {
//!   sourceId: int64 (1)  type: enum (2)  destinationId: int64 (3)
//! }
//! ```

use crate::{
    errors::{GraphError, Result},
    model::{Edge, EdgeKind, Graph, Node, NodeKind},
};
use std::path::Path;
use tracing::debug;

const WIRE_VARINT: u32 = 0;
const WIRE_FIXED64: u32 = 1;
const WIRE_LEN: u32 = 2;
const WIRE_FIXED32: u32 = 5;

/// Read and decode one record file.
///
/// # Errors
/// [`GraphError::Io`] when the file cannot be read, [`GraphError::Decode`]
/// when its bytes are not a valid graph.
pub fn read_graph_file(path: impl AsRef<Path>) -> Result<Graph> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| GraphError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let graph = decode_graph(&bytes)?;
    debug!(
        path = %path.display(),
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "decoded record"
    );
    Ok(graph)
}

/// Decode a `Graph` message from raw bytes.
pub fn decode_graph(data: &[u8]) -> Result<Graph> {
    let mut reader = WireReader::new(data, 0);
    let mut graph = Graph::default();

    while reader.has_more() {
        let (field, wire) = reader.read_tag()?;
        match (field, wire) {
            (1, WIRE_LEN) => {
                let (base, body) = reader.read_bytes()?;
                graph.nodes.push(decode_node(body, base)?);
            }
            (2, WIRE_LEN) => {
                let (base, body) = reader.read_bytes()?;
                graph.edges.push(decode_edge(body, base)?);
            }
            (3, WIRE_LEN) => graph.source_file = Some(reader.read_string()?),
            (4, WIRE_LEN) => {
                let (base, body) = reader.read_bytes()?;
                graph.first_token = Some(decode_node(body, base)?);
            }
            (5, WIRE_LEN) => {
                let (base, body) = reader.read_bytes()?;
                graph.ast_root = Some(decode_node(body, base)?);
            }
            _ => reader.skip_field(field, wire)?,
        }
    }

    Ok(graph)
}

fn decode_node(data: &[u8], base: usize) -> Result<Node> {
    let mut reader = WireReader::new(data, base);
    let mut node = Node::default();
    while reader.has_more() {
        let (field, wire) = reader.read_tag()?;
        match (field, wire) {
            (1, WIRE_VARINT) => node.id = reader.read_varint()? as i64,
            (2, WIRE_VARINT) => node.kind = NodeKind::from_i32(reader.read_varint()? as i32),
            (3, WIRE_LEN) => node.contents = reader.read_string()?,
            (4, WIRE_VARINT) => node.start_position = reader.read_varint()? as i32,
            (5, WIRE_VARINT) => node.end_position = reader.read_varint()? as i32,
            (6, WIRE_VARINT) => node.start_line = reader.read_varint()? as i32,
            (7, WIRE_VARINT) => node.end_line = reader.read_varint()? as i32,
            _ => reader.skip_field(field, wire)?,
        }
    }
    Ok(node)
}

fn decode_edge(data: &[u8], base: usize) -> Result<Edge> {
    let mut reader = WireReader::new(data, base);
    let mut edge = Edge::default();
    while reader.has_more() {
        let (field, wire) = reader.read_tag()?;
        match (field, wire) {
            (1, WIRE_VARINT) => edge.source_id = reader.read_varint()? as i64,
            (2, WIRE_VARINT) => edge.kind = EdgeKind::from_i32(reader.read_varint()? as i32),
            (3, WIRE_VARINT) => edge.destination_id = reader.read_varint()? as i64,
            _ => reader.skip_field(field, wire)?,
        }
    }
    Ok(edge)
}

/// Cursor over one protobuf message body.
///
/// `base` is the absolute offset of `data` in the record so that errors
/// point at the right byte.
struct WireReader<'a> {
    data: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> WireReader<'a> {
    fn new(data: &'a [u8], base: usize) -> Self {
        Self { data, pos: 0, base }
    }

    fn has_more(&self) -> bool {
        self.pos < self.data.len()
    }

    fn error(&self, message: impl Into<String>) -> GraphError {
        GraphError::Decode {
            offset: self.base + self.pos,
            message: message.into(),
        }
    }

    fn read_tag(&mut self) -> Result<(u32, u32)> {
        let varint = self.read_varint()?;
        let field = (varint >> 3) as u32;
        let wire = (varint & 0x7) as u32;
        if field == 0 {
            return Err(self.error("field number 0 is not allowed"));
        }
        Ok((field, wire))
    }

    fn read_varint(&mut self) -> Result<u64> {
        let mut result: u64 = 0;
        let mut shift = 0;
        loop {
            let Some(&byte) = self.data.get(self.pos) else {
                return Err(self.error("unexpected end of data inside varint"));
            };
            self.pos += 1;
            result |= ((byte & 0x7F) as u64) << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
            shift += 7;
            if shift >= 64 {
                return Err(self.error("varint overflow"));
            }
        }
    }

    /// Returns the absolute offset of the payload together with the payload.
    fn read_bytes(&mut self) -> Result<(usize, &'a [u8])> {
        let len = self.read_varint()? as usize;
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                self.error(format!(
                    "length-delimited field of {len} bytes extends past end ({} bytes left)",
                    self.data.len() - self.pos
                ))
            })?;
        let start = self.pos;
        self.pos = end;
        Ok((self.base + start, &self.data[start..end]))
    }

    fn read_string(&mut self) -> Result<String> {
        let at = self.base + self.pos;
        let (_, bytes) = self.read_bytes()?;
        String::from_utf8(bytes.to_vec()).map_err(|_| GraphError::Decode {
            offset: at,
            message: "invalid UTF-8 in string field".to_string(),
        })
    }

    fn skip(&mut self, n: usize) -> Result<()> {
        if self.data.len() - self.pos < n {
            return Err(self.error(format!("cannot skip {n} bytes past end")));
        }
        self.pos += n;
        Ok(())
    }

    fn skip_field(&mut self, field: u32, wire: u32) -> Result<()> {
        match wire {
            WIRE_VARINT => self.read_varint().map(|_| ()),
            WIRE_FIXED64 => self.skip(8),
            WIRE_LEN => self.read_bytes().map(|_| ()),
            WIRE_FIXED32 => self.skip(4),
            other => Err(self.error(format!(
                "unsupported wire type {other} for field {field}"
            ))),
        }
    }
}
