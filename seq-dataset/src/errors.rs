//! Unified error types for the crate.

use feature_graph::GraphError;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level error for dataset preparation.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// I/O or filesystem errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing / serialization errors (vocabulary files, overrides).
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid hyperparameters, e.g. a sequence length below 2.
    #[error("config error: {0}")]
    Config(String),

    /// The data directory does not exist.
    #[error("record directory does not exist: {0}")]
    MissingDirectory(PathBuf),

    /// A record failed to decode or extract and the load policy aborts.
    #[error("record {path}: {source}")]
    Record {
        path: PathBuf,
        #[source]
        source: GraphError,
    },

    /// A persisted vocabulary is missing its reserved symbols or has duplicates.
    #[error("invalid vocabulary: {0}")]
    InvalidVocabulary(String),
}

pub type Result<T> = std::result::Result<T, DatasetError>;
