//! Scan workflow: checkpoint scans, holds, cancellation and maintenance.
//!
//! Every mutating operation follows the same shape: take the group's lock,
//! re-read the group from the catalog, validate, then write all status
//! changes and events in one catalog commit. Transient store failures
//! restart the whole attempt.

mod engine;
mod error;
mod group;
mod hold;
mod locks;
mod maintenance;
mod retry;

pub use engine::{
    BatchScanOutcome, PackingDetails, PackingItem, PackingOutcome, ScanWorkflowEngine,
};
pub use error::{ErrorKind, WorkflowError};
pub use group::{GroupMember, GroupResolver, TrackingGroup};
pub use hold::{CancelOutcome, HoldCancelManager, HoldOutcome, UnholdOutcome};
pub use locks::KeyedLocks;
pub use maintenance::{ClearReport, Maintenance, RepairReport};
pub use retry::{RetryPolicy, Retryable};

use std::sync::Arc;

use crate::catalog::TrackerCatalog;

/// The workflow components wired to one catalog and one lock table.
pub struct Workflow {
    pub resolver: GroupResolver,
    pub engine: ScanWorkflowEngine,
    pub holds: HoldCancelManager,
    pub maintenance: Maintenance,
    locks: Arc<KeyedLocks>,
}

impl Workflow {
    pub fn new(catalog: Arc<dyn TrackerCatalog>, retry: RetryPolicy) -> Self {
        let locks = Arc::new(KeyedLocks::new());
        Self {
            resolver: GroupResolver::new(Arc::clone(&catalog)),
            engine: ScanWorkflowEngine::new(Arc::clone(&catalog), Arc::clone(&locks), retry),
            holds: HoldCancelManager::new(Arc::clone(&catalog), Arc::clone(&locks), retry),
            maintenance: Maintenance::new(catalog, Arc::clone(&locks), retry),
            locks,
        }
    }

    /// The lock table shared by every component, for writers outside the
    /// workflow that touch the same groups.
    pub fn locks(&self) -> &Arc<KeyedLocks> {
        &self.locks
    }
}
