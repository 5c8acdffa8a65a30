//! Tracker catalog - the repository of tracker records, their status flags
//! and the scan history.
//!
//! This is the only component that touches persistent storage. Everything
//! else reads and writes through [`TrackerCatalog`] and never keeps snapshots
//! across operations.

mod sqlite;
mod types;

pub use sqlite::SqliteTrackerCatalog;
pub use types::*;

use std::collections::{HashMap, HashSet};

use crate::tracker::{ScanEvent, ScanStatus, TrackerRecord};

/// Trait for tracker catalog storage.
pub trait TrackerCatalog: Send + Sync {
    /// All records sharing `tracking_id` (case-insensitive), in insertion order.
    fn get_group(&self, tracking_id: &str) -> Result<Vec<TrackerRecord>, CatalogError>;

    /// Get a record by its unique id.
    fn get_record(&self, id: &str) -> Result<TrackerRecord, CatalogError>;

    fn get_status(&self, tracker_id: &str) -> Result<ScanStatus, CatalogError>;

    fn set_status(&self, tracker_id: &str, status: &ScanStatus) -> Result<(), CatalogError>;

    /// Write a batch of status changes and their events atomically.
    ///
    /// Either everything is written or nothing is. A change naming an
    /// unknown tracker aborts the whole batch with `NotFound`.
    fn commit(&self, changes: &[StatusChange], events: &[ScanEvent]) -> Result<(), CatalogError>;

    /// Insert a record together with its initial status.
    ///
    /// Fails with `AlreadyExists` if the id is taken.
    fn create_record(&self, record: &TrackerRecord, status: &ScanStatus)
        -> Result<(), CatalogError>;

    /// Overwrite a record's fields, keeping its id and insertion position.
    fn update_record(&self, record: &TrackerRecord) -> Result<(), CatalogError>;

    /// Apply a batch of record creates and updates in one transaction.
    ///
    /// Either every write lands or none does. A create whose id is taken
    /// aborts the batch with `AlreadyExists`, an update of an unknown id
    /// with `NotFound`.
    fn write_records(&self, writes: &[RecordWrite]) -> Result<(), CatalogError>;

    /// All records in insertion order.
    fn list_all(&self) -> Result<Vec<TrackerRecord>, CatalogError>;

    /// Status of every record, keyed by tracker id.
    fn list_statuses(&self) -> Result<HashMap<String, ScanStatus>, CatalogError>;

    /// Append a single event, returning its assigned id.
    fn append_event(&self, event: &ScanEvent) -> Result<i64, CatalogError>;

    /// Events matching the filter, newest first.
    fn list_events(&self, filter: &EventFilter) -> Result<Vec<ScanEvent>, CatalogError>;

    /// Delete every record (with its status and events) whose id is not in
    /// `preserve_ids`. Returns the number of records deleted.
    fn bulk_clear(&self, preserve_ids: &HashSet<String>) -> Result<usize, CatalogError>;
}
