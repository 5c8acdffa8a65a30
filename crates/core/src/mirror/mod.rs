//! Spreadsheet mirror - a full row-per-tracker snapshot of the catalog.
//!
//! The snapshot is what an external spreadsheet is overwritten with. Stage
//! and status columns come from [`stage_of`] so the sheet always agrees with
//! the API and the dashboard.

mod sink;

pub use sink::{JsonFileSink, SnapshotSink};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{CatalogError, TrackerCatalog};
use crate::tracker::{stage_of, ScanStatus, TrackerRecord};

#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Tracker {0} has no status")]
    MissingStatus(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// One spreadsheet row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorRow {
    #[serde(flatten)]
    pub record: TrackerRecord,
    pub status: ScanStatus,
    /// Stage column.
    pub stage: String,
    /// Status column.
    pub status_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorSnapshot {
    pub generated_at: DateTime<Utc>,
    /// One row per tracker, in insertion order.
    pub rows: Vec<MirrorRow>,
}

impl MirrorSnapshot {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Build a snapshot of every tracker in the catalog.
pub fn build_snapshot(catalog: &dyn TrackerCatalog) -> Result<MirrorSnapshot, MirrorError> {
    let records = catalog.list_all()?;
    let statuses = catalog.list_statuses()?;

    let rows = records
        .into_iter()
        .map(|record| {
            let status = statuses
                .get(&record.id)
                .copied()
                .ok_or_else(|| MirrorError::MissingStatus(record.id.clone()))?;
            let stage = stage_of(&status);
            Ok(MirrorRow {
                record,
                status,
                stage: stage.label().to_string(),
                status_label: stage.status_label().to_string(),
            })
        })
        .collect::<Result<Vec<_>, MirrorError>>()?;

    Ok(MirrorSnapshot {
        generated_at: Utc::now(),
        rows,
    })
}
