//! Hyperparameters and load policy for one preparation run.
//!
//! Values come from defaults, then `CODESEQ_*` environment variables, then an
//! optional JSON override object (`CODESEQ_HYPERS_OVERRIDE`).

use crate::errors::{DatasetError, Result};
use feature_graph::ExtractOptions;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Environment variable holding a JSON object merged over the defaults.
pub const HYPERS_OVERRIDE_ENV: &str = "CODESEQ_HYPERS_OVERRIDE";

/// What a corpus pass does with a record that fails to decode or extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordErrorPolicy {
    /// Stop the pass and return the record's error.
    Abort,
    /// Log a warning, count the record as skipped, continue.
    #[default]
    SkipWithWarning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Number of corpus tokens kept besides the four reserved symbols.
    pub max_vocab_size: usize,
    /// Length `L` of every tensorized example (must be >= 2).
    pub max_seq_length: usize,
    /// Rows per minibatch (must be > 0).
    pub batch_size: usize,
    /// Cap on the number of record files, taken after sorting paths.
    pub max_num_files: Option<usize>,
    pub record_error_policy: RecordErrorPolicy,
    /// Count token frequencies on the rayon pool.
    pub parallel: bool,
    pub extract: ExtractOptions,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            max_vocab_size: 10_000,
            max_seq_length: 50,
            batch_size: 200,
            max_num_files: None,
            record_error_policy: RecordErrorPolicy::default(),
            parallel: false,
            extract: ExtractOptions::default(),
        }
    }
}

impl DatasetConfig {
    /// Validates config values.
    pub fn validate(&self) -> Result<()> {
        if self.max_seq_length < 2 {
            return Err(DatasetError::Config(format!(
                "max_seq_length must be >= 2, got {}",
                self.max_seq_length
            )));
        }
        if self.batch_size == 0 {
            return Err(DatasetError::Config("batch_size must be > 0".into()));
        }
        if self.extract.method_marker.is_empty() {
            return Err(DatasetError::Config("method marker is empty".into()));
        }
        Ok(())
    }

    /// Apply a JSON object of overrides on top of `self`.
    ///
    /// Unknown keys are rejected so that typos do not pass silently.
    pub fn with_overrides(&self, overrides: &str) -> Result<Self> {
        let patch: serde_json::Value = serde_json::from_str(overrides)?;
        let serde_json::Value::Object(patch) = patch else {
            return Err(DatasetError::Config(
                "hyperparameter overrides must be a JSON object".into(),
            ));
        };
        let mut base = serde_json::to_value(self)?;
        if let serde_json::Value::Object(fields) = &mut base {
            for (key, value) in patch {
                if !fields.contains_key(&key) {
                    return Err(DatasetError::Config(format!(
                        "unknown hyperparameter `{key}`"
                    )));
                }
                debug!(%key, %value, "hyperparameter override");
                fields.insert(key, value);
            }
        }
        Ok(serde_json::from_value(base)?)
    }

    /// Defaults, then `CODESEQ_*` variables, then [`HYPERS_OVERRIDE_ENV`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut cfg = Self::default();

        if let Some(v) = lookup("CODESEQ_MAX_VOCAB_SIZE") {
            cfg.max_vocab_size = parse_usize("CODESEQ_MAX_VOCAB_SIZE", &v)?;
        }
        if let Some(v) = lookup("CODESEQ_MAX_SEQ_LENGTH") {
            cfg.max_seq_length = parse_usize("CODESEQ_MAX_SEQ_LENGTH", &v)?;
        }
        if let Some(v) = lookup("CODESEQ_BATCH_SIZE") {
            cfg.batch_size = parse_usize("CODESEQ_BATCH_SIZE", &v)?;
        }
        if let Some(v) = lookup("CODESEQ_MAX_NUM_FILES") {
            cfg.max_num_files = Some(parse_usize("CODESEQ_MAX_NUM_FILES", &v)?);
        }
        if let Some(v) = lookup("CODESEQ_PARALLEL") {
            cfg.parallel = matches!(v.trim(), "1" | "true" | "yes");
        }
        if let Some(v) = lookup("CODESEQ_ABORT_ON_BAD_RECORD") {
            if matches!(v.trim(), "1" | "true" | "yes") {
                cfg.record_error_policy = RecordErrorPolicy::Abort;
            }
        }
        if let Some(v) = lookup(HYPERS_OVERRIDE_ENV) {
            cfg = cfg.with_overrides(&v)?;
        }

        cfg.validate()?;
        info!(
            max_vocab_size = cfg.max_vocab_size,
            max_seq_length = cfg.max_seq_length,
            batch_size = cfg.batch_size,
            "dataset configuration loaded"
        );
        Ok(cfg)
    }
}

fn parse_usize(key: &str, raw: &str) -> Result<usize> {
    raw.trim()
        .parse()
        .map_err(|_| DatasetError::Config(format!("{key} is not a non-negative integer: {raw:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        DatasetConfig::default().validate().unwrap();
    }

    #[test]
    fn rejects_short_sequences_and_empty_batches() {
        let cfg = DatasetConfig {
            max_seq_length: 1,
            ..DatasetConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(DatasetError::Config(_))));

        let cfg = DatasetConfig {
            batch_size: 0,
            ..DatasetConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(DatasetError::Config(_))));
    }

    #[test]
    fn env_values_apply_before_overrides() {
        let cfg = DatasetConfig::from_lookup(lookup(&[
            ("CODESEQ_BATCH_SIZE", "16"),
            ("CODESEQ_MAX_SEQ_LENGTH", "8"),
            (HYPERS_OVERRIDE_ENV, r#"{"max_seq_length": 12, "parallel": true}"#),
        ]))
        .unwrap();
        assert_eq!(cfg.batch_size, 16);
        assert_eq!(cfg.max_seq_length, 12);
        assert!(cfg.parallel);
    }

    #[test]
    fn nested_extract_options_can_be_overridden() {
        let cfg = DatasetConfig::default()
            .with_overrides(r#"{"extract": {"ambiguity": "reject"}}"#)
            .unwrap();
        assert_eq!(cfg.extract.ambiguity, feature_graph::AmbiguityPolicy::Reject);
        assert_eq!(cfg.extract.method_marker, "METHOD");
    }

    #[test]
    fn unknown_override_keys_fail() {
        let err = DatasetConfig::default()
            .with_overrides(r#"{"max_vocab": 5}"#)
            .unwrap_err();
        assert!(matches!(err, DatasetError::Config(_)));
    }

    #[test]
    fn bad_numbers_fail() {
        let err = DatasetConfig::from_lookup(lookup(&[("CODESEQ_BATCH_SIZE", "lots")])).unwrap_err();
        assert!(matches!(err, DatasetError::Config(_)));
    }

    #[test]
    fn invalid_env_values_fail_validation() {
        let err = DatasetConfig::from_lookup(lookup(&[("CODESEQ_MAX_SEQ_LENGTH", "1")])).unwrap_err();
        assert!(matches!(err, DatasetError::Config(_)));
    }
}
