//! Catalog-wide maintenance: inconsistency repair and bulk clear.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::{GroupResolver, KeyedLocks, RetryPolicy, WorkflowError};
use crate::catalog::{StatusChange, TrackerCatalog};
use crate::metrics;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairReport {
    /// Records examined.
    pub checked: usize,
    pub repaired_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearReport {
    pub deleted: usize,
    /// Records kept because they are on hold.
    pub preserved: usize,
}

pub struct Maintenance {
    catalog: Arc<dyn TrackerCatalog>,
    resolver: GroupResolver,
    locks: Arc<KeyedLocks>,
    retry: RetryPolicy,
}

impl Maintenance {
    pub fn new(
        catalog: Arc<dyn TrackerCatalog>,
        locks: Arc<KeyedLocks>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            resolver: GroupResolver::new(Arc::clone(&catalog)),
            catalog,
            locks,
            retry,
        }
    }

    /// Clear checkpoint flags whose prerequisites are missing, group by group.
    pub fn repair(&self) -> Result<RepairReport, WorkflowError> {
        let timer = metrics::OPERATION_DURATION
            .with_label_values(&["repair"])
            .start_timer();

        let tracking_ids = self.retry.run("repair", || self.tracking_ids())?;
        let mut report = RepairReport::default();

        for tracking_id in &tracking_ids {
            let repaired = self.retry.run("repair", || {
                self.locks.with_lock(tracking_id, || self.repair_group(tracking_id))
            })?;
            report.checked += repaired.0;
            report.repaired_ids.extend(repaired.1);
        }

        timer.observe_duration();
        if report.repaired_ids.is_empty() {
            info!(checked = report.checked, "Repair found no inconsistent trackers");
        } else {
            warn!(
                checked = report.checked,
                repaired = report.repaired_ids.len(),
                "Repaired inconsistent trackers"
            );
        }
        Ok(report)
    }

    /// Delete every record not currently on hold.
    ///
    /// All group locks are held for the duration so no scan interleaves
    /// with the delete.
    pub fn clear(&self) -> Result<ClearReport, WorkflowError> {
        let timer = metrics::OPERATION_DURATION
            .with_label_values(&["clear"])
            .start_timer();

        let tracking_ids = self.retry.run("clear", || self.tracking_ids())?;
        let report = self.retry.run("clear", || {
            let keys = tracking_ids.iter().map(String::as_str);
            self.locks.with_locks(keys, || self.clear_unheld())
        })?;

        timer.observe_duration();
        info!(
            deleted = report.deleted,
            preserved = report.preserved,
            "Cleared tracker catalog"
        );
        Ok(report)
    }

    /// Caller holds every group lock.
    fn clear_unheld(&self) -> Result<ClearReport, WorkflowError> {
        let preserve: HashSet<String> = self
            .catalog
            .list_statuses()?
            .into_iter()
            .filter(|(_, status)| status.pending)
            .map(|(id, _)| id)
            .collect();
        let deleted = self.catalog.bulk_clear(&preserve)?;
        Ok(ClearReport {
            deleted,
            preserved: preserve.len(),
        })
    }

    fn tracking_ids(&self) -> Result<BTreeSet<String>, WorkflowError> {
        Ok(self
            .catalog
            .list_all()?
            .into_iter()
            .map(|record| record.tracking_key())
            .collect())
    }

    /// Returns the number of members checked and the ids repaired.
    fn repair_group(&self, tracking_id: &str) -> Result<(usize, Vec<String>), WorkflowError> {
        let mut group = self.resolver.resolve(tracking_id)?;
        let mut changes = Vec::new();
        for member in group.members() {
            let mut status = member.status;
            if status.repair() {
                warn!(
                    tracker_id = %member.id(),
                    before = ?member.status,
                    after = ?status,
                    "Repairing inconsistent status"
                );
                changes.push(StatusChange::new(member.id(), status));
            }
        }

        let repaired: Vec<String> = changes.iter().map(|c| c.tracker_id.clone()).collect();
        if !changes.is_empty() {
            group.commit(self.catalog.as_ref(), changes, Vec::new())?;
        }
        Ok((group.len(), repaired))
    }
}
