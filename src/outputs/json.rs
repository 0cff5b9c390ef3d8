//! JSON output for the link check and per-run batches.
//!
//! Both files are stamped with the run date and rewritten if the tool runs
//! twice on the same day. Archives are handled by [`crate::archive`].

use crate::error::StorageError;
use crate::models::{LinkReport, Record};
use crate::outputs::{Collection, OutputLayout};
use crate::storage::write_json;
use std::path::PathBuf;
use tracing::{info, instrument};

/// Write `files/link_check_<stamp>.json`.
#[instrument(level = "info", skip_all, fields(%stamp))]
pub async fn write_link_report(
    layout: &OutputLayout,
    stamp: &str,
    report: &LinkReport,
) -> Result<PathBuf, StorageError> {
    let path = layout.link_report(stamp);
    write_json(&path, report).await?;
    info!(
        path = %path.display(),
        working = report.working.len(),
        broken = report.broken.len(),
        "Wrote link check report"
    );
    Ok(path)
}

/// Write this run's batch for `collection` to `files/<prefix>_<stamp>.json`.
#[instrument(level = "info", skip_all, fields(?collection, %stamp))]
pub async fn write_batch(
    layout: &OutputLayout,
    collection: Collection,
    stamp: &str,
    records: &[Record],
) -> Result<PathBuf, StorageError> {
    let path = layout.batch(collection, stamp);
    write_json(&path, records).await?;
    info!(path = %path.display(), count = records.len(), "Wrote batch");
    Ok(path)
}
