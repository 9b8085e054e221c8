//! Training-data preparation for token sequence models.
//!
//! This crate turns a directory of feature-graph records into batches:
//! - Discover record files and extract one token sequence per method
//! - Count tokens and build a bounded [`Vocabulary`] with reserved symbols
//! - Tensorize sequences into a fixed-width [`Corpus`]
//! - Iterate the corpus in (optionally shuffled) [`Minibatches`]
//!
//! Everything is synchronous; a record is released before the next is read.

mod config;
mod corpus;
mod discovery;
mod errors;
mod loader;
mod minibatch;
mod tensorize;
pub mod telemetry;
mod vocab;

pub use config::{DatasetConfig, HYPERS_OVERRIDE_ENV, RecordErrorPolicy};
pub use corpus::Corpus;
pub use discovery::{RECORD_EXTENSION, discover_record_files};
pub use errors::{DatasetError, Result};
pub use loader::{
    LoadReport, build_vocab_from_dir, count_tokens, for_each_record, load_corpus_from_dir,
    load_token_sequences, record_sequences,
};
pub use minibatch::{Minibatches, get_minibatch_iterator, get_minibatch_iterator_with_rng};
pub use tensorize::{tensorise_corpus, tensorise_token_sequence};
pub use vocab::{
    END_SYMBOL, PAD_SYMBOL, RESERVED_SYMBOLS, START_SYMBOL, TokenCounter, TokenId, UNK_SYMBOL,
    Vocabulary, build_vocab,
};
