//! Record file discovery under a data directory.

use crate::errors::{DatasetError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Extension of serialized graph records.
pub const RECORD_EXTENSION: &str = "proto";

/// Recursively collect `*.proto` files under `dir`, sorted by path.
///
/// With `max_num_files = Some(n)` only the first `n` sorted paths are kept;
/// `Some(0)` is treated as "no cap".
///
/// # Errors
/// [`DatasetError::MissingDirectory`] if `dir` does not exist. Unreadable
/// entries below `dir` are logged and skipped.
pub fn discover_record_files(dir: impl AsRef<Path>, max_num_files: Option<usize>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if !dir.exists() {
        return Err(DatasetError::MissingDirectory(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(true) {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                warn!("discovery: skipping unreadable entry: {}", err);
                continue;
            }
        };
        if entry.file_type().is_file() && has_record_extension(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();

    if let Some(cap) = max_num_files.filter(|n| *n > 0) {
        if files.len() > cap {
            debug!("discovery: capping {} files to {}", files.len(), cap);
            files.truncate(cap);
        }
    }

    info!("discovery: {} record files under {}", files.len(), dir.display());
    Ok(files)
}

fn has_record_extension(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(RECORD_EXTENSION)
}
