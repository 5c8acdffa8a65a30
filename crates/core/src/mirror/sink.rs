//! Snapshot destinations.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use super::{MirrorError, MirrorSnapshot};

/// Destination a snapshot is written to. Each write replaces the previous one.
pub trait SnapshotSink: Send + Sync {
    fn write(&self, snapshot: &MirrorSnapshot) -> Result<(), MirrorError>;
}

/// Writes the snapshot as pretty JSON to a file.
///
/// The file is written next to its destination and renamed into place, so
/// readers never see a half-written snapshot.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotSink for JsonFileSink {
    fn write(&self, snapshot: &MirrorSnapshot) -> Result<(), MirrorError> {
        let json = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| MirrorError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, json)?;
        fs::rename(&staging, &self.path)?;

        info!(
            path = %self.path.display(),
            rows = snapshot.len(),
            "Wrote mirror snapshot"
        );
        Ok(())
    }
}
