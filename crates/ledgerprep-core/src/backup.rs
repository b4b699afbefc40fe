//! Timestamped backups of output files before they are overwritten
//!
//! File naming: `<stem><suffix>_<YYYYmmdd_HHMMSS><ext>`, next to the original,
//! e.g. `for_import_My_Transactions BDO 2024-02-29_backup_20240305_101500.csv`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::info;

use crate::error::{Error, Result};

/// Default suffix inserted between the file stem and the timestamp
pub const DEFAULT_BACKUP_SUFFIX: &str = "_backup";

/// Path a backup of `path` taken at `at` would be written to
pub fn backup_path(path: &Path, suffix: &str, at: NaiveDateTime) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let name = format!("{}{}_{}{}", stem, suffix, at.format("%Y%m%d_%H%M%S"), ext);
    path.with_file_name(name)
}

/// Copy `path` to a timestamped backup beside it.
///
/// Returns the backup path, or `None` when there is nothing to back up.
pub fn create_backup(path: &Path, suffix: &str, at: NaiveDateTime) -> Result<Option<PathBuf>> {
    if !path.exists() {
        return Ok(None);
    }

    let dest = backup_path(path, suffix, at);
    if dest.exists() {
        return Err(Error::Backup(format!(
            "Backup already exists: {}",
            dest.display()
        )));
    }

    fs::copy(path, &dest).map_err(|e| {
        Error::Backup(format!(
            "Failed to back up {} to {}: {}",
            path.display(),
            dest.display(),
            e
        ))
    })?;

    info!("Created backup: {}", dest.display());
    Ok(Some(dest))
}
