//! Catalog wrapper that injects transient failures.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::catalog::{CatalogError, EventFilter, RecordWrite, StatusChange, TrackerCatalog};
use crate::tracker::{ScanEvent, ScanStatus, TrackerRecord};

/// Wraps another catalog and fails a configurable number of calls with
/// [`CatalogError::Transient`] before delegating again.
///
/// # Example
///
/// ```rust,ignore
/// use shiptrack_core::testing::{fixtures, FlakyCatalog};
///
/// let flaky = Arc::new(FlakyCatalog::new(fixtures::in_memory_catalog()));
/// flaky.fail_next(1);
/// assert!(flaky.list_all().unwrap_err().is_transient());
/// assert!(flaky.list_all().is_ok());
/// ```
pub struct FlakyCatalog {
    inner: Arc<dyn TrackerCatalog>,
    /// Calls still to fail.
    failures: AtomicUsize,
    /// Writes still to fail; reads pass through.
    write_failures: AtomicUsize,
    /// Total calls received, failed or not.
    calls: AtomicUsize,
}

impl FlakyCatalog {
    pub fn new(inner: Arc<dyn TrackerCatalog>) -> Self {
        Self {
            inner,
            failures: AtomicUsize::new(0),
            write_failures: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail the next `count` calls.
    pub fn fail_next(&self, count: usize) {
        self.failures.store(count, Ordering::SeqCst);
    }

    /// Fail the next `count` writes, letting reads through.
    pub fn fail_next_writes(&self, count: usize) {
        self.write_failures.store(count, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Self::take(&self.failures)
    }

    fn check_write(&self) -> Result<(), CatalogError> {
        self.check()?;
        Self::take(&self.write_failures)
    }

    fn take(counter: &AtomicUsize) -> Result<(), CatalogError> {
        let failed = counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            Err(CatalogError::Transient("injected failure".to_string()))
        } else {
            Ok(())
        }
    }
}

impl TrackerCatalog for FlakyCatalog {
    fn get_group(&self, tracking_id: &str) -> Result<Vec<TrackerRecord>, CatalogError> {
        self.check()?;
        self.inner.get_group(tracking_id)
    }

    fn get_record(&self, id: &str) -> Result<TrackerRecord, CatalogError> {
        self.check()?;
        self.inner.get_record(id)
    }

    fn get_status(&self, tracker_id: &str) -> Result<ScanStatus, CatalogError> {
        self.check()?;
        self.inner.get_status(tracker_id)
    }

    fn set_status(&self, tracker_id: &str, status: &ScanStatus) -> Result<(), CatalogError> {
        self.check_write()?;
        self.inner.set_status(tracker_id, status)
    }

    fn commit(&self, changes: &[StatusChange], events: &[ScanEvent]) -> Result<(), CatalogError> {
        self.check_write()?;
        self.inner.commit(changes, events)
    }

    fn create_record(
        &self,
        record: &TrackerRecord,
        status: &ScanStatus,
    ) -> Result<(), CatalogError> {
        self.check_write()?;
        self.inner.create_record(record, status)
    }

    fn update_record(&self, record: &TrackerRecord) -> Result<(), CatalogError> {
        self.check_write()?;
        self.inner.update_record(record)
    }

    fn write_records(&self, writes: &[RecordWrite]) -> Result<(), CatalogError> {
        self.check_write()?;
        self.inner.write_records(writes)
    }

    fn list_all(&self) -> Result<Vec<TrackerRecord>, CatalogError> {
        self.check()?;
        self.inner.list_all()
    }

    fn list_statuses(&self) -> Result<HashMap<String, ScanStatus>, CatalogError> {
        self.check()?;
        self.inner.list_statuses()
    }

    fn append_event(&self, event: &ScanEvent) -> Result<i64, CatalogError> {
        self.check_write()?;
        self.inner.append_event(event)
    }

    fn list_events(&self, filter: &EventFilter) -> Result<Vec<ScanEvent>, CatalogError> {
        self.check()?;
        self.inner.list_events(filter)
    }

    fn bulk_clear(&self, preserve_ids: &HashSet<String>) -> Result<usize, CatalogError> {
        self.check_write()?;
        self.inner.bulk_clear(preserve_ids)
    }
}
