use std::io::{self, IsTerminal};
use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, filter, fmt};

/// Targets of the dataset pipeline: this crate and the graph reader it drives.
pub const TARGET_PREFIXES: [&str; 2] = ["seq_dataset", "feature_graph"];

/// RFC3339 UTC timer implemented via `chrono`.
/// Example output: `2025-09-12T10:20:30Z`
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        let s = now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        w.write_str(&s)
    }
}

/// Formatting layer for pipeline events only.
///
/// - RFC3339 UTC timestamps
/// - Compact single-line format with `file:line`
/// - ANSI colors only when stdout is a terminal
///
/// Events from other targets pass through untouched, so the binary can
/// stack its own layer next to this one.
pub fn layer<S>() -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let use_ansi = io::stdout().is_terminal();

    let only_pipeline = filter::filter_fn(|meta| is_pipeline_target(meta.target()));

    fmt::layer()
        .with_timer(ChronoRfc3339Utc)
        .with_level(true)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(use_ansi)
        .event_format(fmt::format().compact().with_source_location(true))
        .with_filter(only_pipeline)
}

fn is_pipeline_target(target: &str) -> bool {
    TARGET_PREFIXES.iter().any(|p| target.starts_with(p))
}

/// `seq_dataset=<level>,feature_graph=<level>` directives.
pub fn level_directives(level: Level) -> Vec<Directive> {
    TARGET_PREFIXES
        .iter()
        .map(|prefix| {
            let s = format!("{prefix}={}", level.as_str().to_lowercase());
            Directive::from_str(&s).expect("valid level directive")
        })
        .collect()
}

/// EnvFilter from `RUST_LOG` (or `default`), raised to `level` for the pipeline crates.
pub fn env_filter_with_level(default: &str, level: Level) -> EnvFilter {
    let base = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    level_directives(level)
        .into_iter()
        .fold(base, |f, d| f.add_directive(d))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_pipeline_targets_only() {
        assert!(is_pipeline_target("seq_dataset::loader"));
        assert!(is_pipeline_target("feature_graph::extract"));
        assert!(!is_pipeline_target("rayon_core"));
    }

    #[test]
    fn directives_cover_both_crates() {
        let rendered: Vec<String> = level_directives(Level::DEBUG)
            .iter()
            .map(|d| d.to_string())
            .collect();
        assert_eq!(rendered, vec!["seq_dataset=debug", "feature_graph=debug"]);
    }
}
