//! Cross-run archive of records, deduplicated by title.
//!
//! The archive is append-only: a record, once archived, is never modified or
//! evicted. Each merge adds the batch records whose titles are new and then
//! re-sorts the whole archive newest first.

use crate::error::StorageError;
use crate::models::Record;
use crate::storage::{read_json, write_json};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, instrument, warn};

/// Counts describing one [`accumulate`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeSummary {
    pub before: usize,
    pub added: usize,
    pub after: usize,
}

/// Merge `batch` into `existing`.
///
/// A batch record is appended only if its title is not already present,
/// counting records appended earlier from the same batch (first seen wins).
/// The result is stably sorted by `published_date`, newest first.
pub fn merge(existing: Vec<Record>, batch: Vec<Record>) -> Vec<Record> {
    let mut seen: HashSet<String> = existing.iter().map(|r| r.title.clone()).collect();
    let mut merged = existing;

    for record in batch {
        if seen.insert(record.title.clone()) {
            merged.push(record);
        }
    }

    merged.sort_by(|a, b| b.published_date.cmp(&a.published_date));
    merged
}

/// Load the archive at `path`.
///
/// A missing, unreadable or malformed file is treated as an empty archive.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn load_archive(path: &Path) -> Vec<Record> {
    if !path.exists() {
        info!("No archive yet; starting empty");
        return Vec::new();
    }
    match read_json::<Vec<Record>>(path).await {
        Ok(records) => {
            info!(count = records.len(), "Loaded archive");
            records
        }
        Err(e) => {
            warn!(error = %e, "Archive unreadable; treating as empty");
            Vec::new()
        }
    }
}

/// Rewrite the archive at `path` in full.
pub async fn save_archive(path: &Path, records: &[Record]) -> Result<(), StorageError> {
    write_json(path, records).await?;
    info!(path = %path.display(), count = records.len(), "Saved archive");
    Ok(())
}

/// Load, merge `batch` into, and save the archive at `path`.
#[instrument(level = "info", skip_all, fields(path = %path.display(), batch = batch.len()))]
pub async fn accumulate(path: &Path, batch: Vec<Record>) -> Result<MergeSummary, StorageError> {
    let existing = load_archive(path).await;
    let before = existing.len();
    let merged = merge(existing, batch);
    save_archive(path, &merged).await?;

    let summary = MergeSummary {
        before,
        added: merged.len() - before,
        after: merged.len(),
    };
    info!(added = summary.added, total = summary.after, "Accumulated batch");
    Ok(summary)
}
