//! Whole-file JSON persistence shared by the analysis, feedback and artifact
//! stores. Every store serializes access behind its own mutex and rewrites
//! its snapshot through a temp file followed by a rename.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("malformed store contents: {0}")]
    Malformed(String),
}

/// Reads a collection snapshot. A missing file is an empty store; a snapshot
/// that fails to parse is logged and treated as empty rather than wedging
/// every later request.
pub(crate) fn load_collection<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = fs::read(path).map_err(|err| StoreError::Unavailable(err.to_string()))?;
    match serde_json::from_slice(&raw) {
        Ok(items) => Ok(items),
        Err(err) => {
            warn!(path = %path.display(), %err, "discarding unparsable store snapshot");
            Ok(Vec::new())
        }
    }
}

pub(crate) fn save_collection<T: Serialize>(path: &Path, items: &[T]) -> Result<(), StoreError> {
    let bytes =
        serde_json::to_vec_pretty(items).map_err(|err| StoreError::Malformed(err.to_string()))?;
    atomic_write(path, &bytes)
}

/// Reads a single-document snapshot. Unlike collections, a corrupt document
/// is an error: callers must not mistake half an artifact for no artifact.
pub(crate) fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    if !path.exists() {
        return Err(StoreError::NotFound);
    }
    let raw = fs::read(path).map_err(|err| StoreError::Unavailable(err.to_string()))?;
    serde_json::from_slice(&raw).map_err(|err| StoreError::Malformed(err.to_string()))
}

pub(crate) fn save_document<T: Serialize>(path: &Path, document: &T) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(document)
        .map_err(|err| StoreError::Malformed(err.to_string()))?;
    atomic_write(path, &bytes)
}

/// Write-then-rename so readers only ever observe the previous snapshot or
/// the complete new one.
pub(crate) fn atomic_write(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|err| StoreError::Unavailable(err.to_string()))?;
        }
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = std::path::PathBuf::from(tmp);
    fs::write(&tmp, bytes).map_err(|err| StoreError::Unavailable(err.to_string()))?;
    fs::rename(&tmp, path).map_err(|err| StoreError::Unavailable(err.to_string()))
}
