//! JSON snapshot persistence
//!
//! The whole origin is rewritten after every mutation using a temp file and a
//! rename, so a crash leaves either the previous or the new snapshot on disk.

use crosstab_core::StorageError;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Snapshot file holding the raw entries of one origin.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    /// Snapshot stored at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the snapshot.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load entries. A missing file is an empty origin.
    pub fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(StorageError::ReadFailed(format!(
                    "Failed to read snapshot {}: {e}",
                    self.path.display()
                )))
            }
        };

        serde_json::from_str(&contents).map_err(|e| {
            StorageError::ReadFailed(format!(
                "Failed to parse snapshot {}: {e}",
                self.path.display()
            ))
        })
    }

    /// Atomically replace the snapshot with `entries`.
    pub fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    StorageError::WriteFailed(format!("Failed to create directory: {e}"))
                })?;
            }
        }

        let contents = serde_json::to_string(entries)
            .map_err(|e| StorageError::WriteFailed(format!("Failed to encode snapshot: {e}")))?;

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, contents)
            .map_err(|e| StorageError::WriteFailed(format!("Failed to write snapshot: {e}")))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| StorageError::WriteFailed(format!("Failed to replace snapshot: {e}")))?;

        Ok(())
    }
}
