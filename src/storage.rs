//! File persistence helpers.
//!
//! All JSON is pretty-printed with four-space indentation and raw UTF-8, the
//! format the published site already reads. Whole-file rewrites go through a
//! sibling temporary file and a rename so a crash never leaves a truncated
//! archive behind.

use crate::error::StorageError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::path::Path;
use tokio::fs;
use tracing::{debug, instrument};

/// Serialize `value` as four-space indented JSON.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut serializer = Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    Ok(out)
}

/// Create `dir` and all of its parents.
pub async fn ensure_dir(dir: &Path) -> Result<(), StorageError> {
    fs::create_dir_all(dir)
        .await
        .map_err(|e| StorageError::io(dir, e))
}

/// Replace `path` with `contents` via a temporary file and a rename.
#[instrument(level = "debug", skip_all, fields(path = %path.display(), bytes = contents.len()))]
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent).await?;
    }
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = Path::new(&tmp_name);

    fs::write(tmp, contents)
        .await
        .map_err(|e| StorageError::io(tmp, e))?;
    fs::rename(tmp, path)
        .await
        .map_err(|e| StorageError::io(path, e))?;
    debug!("Wrote file");
    Ok(())
}

/// Serialize `value` and write it atomically to `path`.
pub async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StorageError> {
    let bytes = to_pretty_json(value).map_err(|e| StorageError::json(path, e))?;
    write_atomic(path, &bytes).await
}

/// Read and deserialize a JSON file.
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StorageError> {
    let raw = fs::read(path).await.map_err(|e| StorageError::io(path, e))?;
    serde_json::from_slice(&raw).map_err(|e| StorageError::json(path, e))
}
