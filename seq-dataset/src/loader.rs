//! Corpus passes over a directory of records.
//!
//! Records are processed one at a time: decode, index, extract, release.
//! Only the frequency counter (vocabulary pass) or the growing corpus
//! (tensorization pass) outlive a record.

use crate::{
    config::{DatasetConfig, RecordErrorPolicy},
    corpus::Corpus,
    discovery::discover_record_files,
    errors::{DatasetError, Result},
    tensorize::{check_length, tensorise_token_sequence},
    vocab::{TokenCounter, Vocabulary},
};
use feature_graph::{ExtractOptions, ExtractStats, GraphError, extract_method_tokens, read_graph_file};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Outcome of one corpus pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Records that were decoded and extracted.
    pub records_ok: usize,
    /// Records dropped under [`RecordErrorPolicy::SkipWithWarning`].
    pub records_skipped: usize,
    /// Token sequences produced.
    pub sequences: usize,
    pub extract: ExtractStats,
}

impl LoadReport {
    fn merge(&mut self, other: &LoadReport) {
        self.records_ok += other.records_ok;
        self.records_skipped += other.records_skipped;
        self.sequences += other.sequences;
        self.extract.merge(&other.extract);
    }
}

/// All method token sequences of one record file, with extraction counters.
pub fn record_sequences(
    path: &Path,
    options: &ExtractOptions,
) -> std::result::Result<(Vec<Vec<String>>, ExtractStats), GraphError> {
    let graph = read_graph_file(path)?;
    extract_method_tokens(&graph, options)
}

/// Apply `policy` to a failed record: abort with its error or log and count it.
fn handle_record_error(
    path: &Path,
    err: GraphError,
    policy: RecordErrorPolicy,
    report: &mut LoadReport,
) -> Result<()> {
    match policy {
        RecordErrorPolicy::Abort => Err(DatasetError::Record {
            path: path.to_path_buf(),
            source: err,
        }),
        RecordErrorPolicy::SkipWithWarning => {
            warn!(path = %path.display(), error = %err, "skipping record");
            report.records_skipped += 1;
            Ok(())
        }
    }
}

/// Run `sink` on the sequences of every record, in file order.
pub fn for_each_record<F>(
    files: &[PathBuf],
    options: &ExtractOptions,
    policy: RecordErrorPolicy,
    mut sink: F,
) -> Result<LoadReport>
where
    F: FnMut(Vec<Vec<String>>) -> Result<()>,
{
    let mut report = LoadReport::default();
    for path in files {
        match record_sequences(path, options) {
            Ok((seqs, stats)) => {
                debug!(path = %path.display(), sequences = seqs.len(), "record loaded");
                report.records_ok += 1;
                report.sequences += seqs.len();
                report.extract.merge(&stats);
                sink(seqs)?;
            }
            Err(err) => handle_record_error(path, err, policy, &mut report)?,
        }
    }
    Ok(report)
}

/// Collect every token sequence from `files`.
pub fn load_token_sequences(
    files: &[PathBuf],
    options: &ExtractOptions,
    policy: RecordErrorPolicy,
) -> Result<(Vec<Vec<String>>, LoadReport)> {
    let mut all = Vec::new();
    let report = for_each_record(files, options, policy, |seqs| {
        all.extend(seqs);
        Ok(())
    })?;
    Ok((all, report))
}

/// Token frequencies over `files`.
///
/// With `parallel`, each rayon worker folds records into its own partial
/// counter; partials are merged in file order, so the first-occurrence
/// order (and therefore the vocabulary) matches the sequential pass.
pub fn count_tokens(
    files: &[PathBuf],
    options: &ExtractOptions,
    policy: RecordErrorPolicy,
    parallel: bool,
) -> Result<(TokenCounter, LoadReport)> {
    if !parallel {
        let mut counter = TokenCounter::new();
        let report = for_each_record(files, options, policy, |seqs| {
            for seq in &seqs {
                counter.add_sequence(seq);
            }
            Ok(())
        })?;
        return Ok((counter, report));
    }

    files
        .par_iter()
        .try_fold(
            || (TokenCounter::new(), LoadReport::default()),
            |(mut counter, mut report), path| {
                match record_sequences(path, options) {
                    Ok((seqs, stats)) => {
                        report.records_ok += 1;
                        report.sequences += seqs.len();
                        report.extract.merge(&stats);
                        for seq in &seqs {
                            counter.add_sequence(seq);
                        }
                    }
                    Err(err) => handle_record_error(path, err, policy, &mut report)?,
                }
                Ok::<_, DatasetError>((counter, report))
            },
        )
        .try_reduce(
            || (TokenCounter::new(), LoadReport::default()),
            |(mut counter, mut report), (other_counter, other_report)| {
                counter.merge(other_counter);
                report.merge(&other_report);
                Ok((counter, report))
            },
        )
}

/// Build the vocabulary from every record under `dir`.
pub fn build_vocab_from_dir(dir: impl AsRef<Path>, cfg: &DatasetConfig) -> Result<(Vocabulary, LoadReport)> {
    let files = discover_record_files(dir.as_ref(), cfg.max_num_files)?;
    let (counter, report) = count_tokens(&files, &cfg.extract, cfg.record_error_policy, cfg.parallel)?;
    let vocab = Vocabulary::from_counter(&counter, cfg.max_vocab_size);
    info!(
        "vocab pass: {} entries from {} distinct tokens ({} records ok, {} skipped)",
        vocab.len(),
        counter.len(),
        report.records_ok,
        report.records_skipped
    );
    Ok((vocab, report))
}

/// Tensorize every method under `dir` into a `[n, cfg.max_seq_length]` corpus.
pub fn load_corpus_from_dir(
    vocab: &Vocabulary,
    dir: impl AsRef<Path>,
    cfg: &DatasetConfig,
) -> Result<(Corpus, LoadReport)> {
    let length = cfg.max_seq_length;
    check_length(length)?;
    let files = discover_record_files(dir.as_ref(), cfg.max_num_files)?;
    let mut corpus = Corpus::new(length)?;
    let report = for_each_record(&files, &cfg.extract, cfg.record_error_policy, |seqs| {
        for seq in &seqs {
            corpus.push_row(&tensorise_token_sequence(vocab, length, seq)?)?;
        }
        Ok(())
    })?;
    info!(
        "tensorize pass: corpus {:?} from {} ({} records ok, {} skipped)",
        corpus.shape(),
        dir.as_ref().display(),
        report.records_ok,
        report.records_skipped
    );
    Ok((corpus, report))
}
