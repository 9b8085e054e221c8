//! Unified error types for the crate.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading a record or walking its token chain.
///
/// All variants are per-record: the caller decides whether one bad record
/// aborts a corpus pass.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The record file could not be read.
    #[error("io error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Bytes do not match the feature-graph protobuf schema.
    #[error("decode error at byte {offset}: {message}")]
    Decode { offset: usize, message: String },

    /// A method's declared span has no token starting (or ending) at that position.
    #[error("method span {start}..{end} has no token {boundary} at {position}")]
    MissingTokenBoundary {
        start: i32,
        end: i32,
        boundary: Boundary,
        position: i32,
    },

    /// Following next-token edges revisited `node` before reaching the end token.
    #[error("next-token chain of method span {start}..{end} revisits node {node}")]
    TraversalCycle { start: i32, end: i32, node: i64 },

    /// The chain stopped at `node`, which has no outgoing next-token edge.
    #[error("next-token chain of method span {start}..{end} ends at node {node} before the end token")]
    DanglingTokenChain { start: i32, end: i32, node: i64 },

    /// `node` has several next-token successors and the extractor runs in strict mode.
    #[error("node {node} has {count} outgoing next-token edges")]
    AmbiguousNextToken { node: i64, count: usize },
}

/// Which end of a method span failed to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Start,
    End,
}

impl std::fmt::Display for Boundary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Boundary::Start => f.write_str("starting"),
            Boundary::End => f.write_str("ending"),
        }
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;
