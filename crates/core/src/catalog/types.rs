//! Types for the tracker catalog.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::tracker::{EventKind, ScanStatus, TrackerRecord};

/// Errors for catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// The store is busy or unreachable; the caller may retry.
    #[error("Store temporarily unavailable: {0}")]
    Transient(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl CatalogError {
    pub fn is_transient(&self) -> bool {
        matches!(self, CatalogError::Transient(_))
    }
}

/// A new status for one tracker, written as part of a [`commit`](super::TrackerCatalog::commit).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusChange {
    pub tracker_id: String,
    pub status: ScanStatus,
}

impl StatusChange {
    pub fn new(tracker_id: impl Into<String>, status: ScanStatus) -> Self {
        Self {
            tracker_id: tracker_id.into(),
            status,
        }
    }
}

/// One record write in a [`write_records`](super::TrackerCatalog::write_records) batch.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordWrite {
    /// Insert a new record with its initial status.
    Create {
        record: TrackerRecord,
        status: ScanStatus,
    },
    /// Overwrite an existing record, keeping its id and insertion position.
    Update(TrackerRecord),
}

impl RecordWrite {
    pub fn record(&self) -> &TrackerRecord {
        match self {
            RecordWrite::Create { record, .. } | RecordWrite::Update(record) => record,
        }
    }
}

/// Filter for querying scan events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Matched case-insensitively.
    pub tracking_id: Option<String>,
    pub tracker_id: Option<String>,
    pub kind: Option<EventKind>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: i64,
    pub offset: i64,
}

impl EventFilter {
    pub fn new() -> Self {
        Self {
            limit: 100,
            offset: 0,
            ..Default::default()
        }
    }

    pub fn with_tracking_id(mut self, tracking_id: impl Into<String>) -> Self {
        self.tracking_id = Some(tracking_id.into());
        self
    }

    pub fn with_tracker_id(mut self, tracker_id: impl Into<String>) -> Self {
        self.tracker_id = Some(tracker_id.into());
        self
    }

    pub fn with_kind(mut self, kind: EventKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_time_range(
        mut self,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}
