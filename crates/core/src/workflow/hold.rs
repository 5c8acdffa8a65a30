//! Hold, resume and cancellation of tracking groups.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::{GroupResolver, KeyedLocks, RetryPolicy, TrackingGroup, WorkflowError};
use crate::catalog::{StatusChange, TrackerCatalog};
use crate::metrics;
use crate::tracker::{Checkpoint, EventKind, EventOutcome, NextStep, ScanEvent, ScanProgress};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldOutcome {
    pub tracking_id: String,
    pub checkpoint: Checkpoint,
    pub held_count: usize,
    pub held_ids: Vec<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnholdOutcome {
    pub tracking_id: String,
    pub checkpoint: Checkpoint,
    pub resumed_count: usize,
    pub resumed_ids: Vec<String>,
    pub progress: ScanProgress,
    pub next_step: NextStep,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelOutcome {
    pub tracking_id: String,
    pub cancelled_count: usize,
    pub cancelled_ids: Vec<String>,
}

/// Places groups on hold, resumes them and cancels them.
pub struct HoldCancelManager {
    catalog: Arc<dyn TrackerCatalog>,
    resolver: GroupResolver,
    locks: Arc<KeyedLocks>,
    retry: RetryPolicy,
}

impl HoldCancelManager {
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

    /// Pause every item of the group before `checkpoint`.
    ///
    /// Each item must have the checkpoints before `checkpoint` done and
    /// `checkpoint` itself still open. Holds are all-or-nothing: a group
    /// with items at different stages cannot be held.
    pub fn hold(
        &self,
        tracking_id: &str,
        checkpoint: Checkpoint,
        reason: Option<&str>,
    ) -> Result<HoldOutcome, WorkflowError> {
        let reason = reason
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::to_string);

        self.execute("hold", tracking_id, || {
            let mut group = self.load(tracking_id)?;
            if group.any_pending() {
                return Err(WorkflowError::AlreadyOnHold {
                    tracking_id: group.tracking_id().to_string(),
                });
            }
            if group.all_done(checkpoint) {
                return Err(WorkflowError::PrerequisiteNotMet {
                    tracking_id: group.tracking_id().to_string(),
                    checkpoint,
                    reason: "checkpoint already done".to_string(),
                });
            }

            for member in group.members() {
                let reason = if member.status.is_done(checkpoint) {
                    Some(format!("item {} already passed {}", member.id(), checkpoint))
                } else if !member.status.prerequisites_met(checkpoint) {
                    let missing = member
                        .status
                        .next_checkpoint()
                        .map(|cp| cp.as_str())
                        .unwrap_or("dispatch");
                    Some(format!("item {} still needs {}", member.id(), missing))
                } else {
                    None
                };
                if let Some(reason) = reason {
                    return Err(WorkflowError::PrerequisiteNotMet {
                        tracking_id: group.tracking_id().to_string(),
                        checkpoint,
                        reason,
                    });
                }
            }

            let mut changes = Vec::with_capacity(group.len());
            let mut events = Vec::with_capacity(group.len());
            for member in group.members() {
                let mut status = member.status;
                status.pending = true;
                changes.push(StatusChange::new(member.id(), status));
                events.push(
                    ScanEvent::for_item(&member.record, EventKind::Pending, EventOutcome::Held)
                        .with_reason(reason.clone()),
                );
            }
            let held_ids: Vec<String> = changes.iter().map(|c| c.tracker_id.clone()).collect();
            group.commit(self.catalog.as_ref(), changes, events)?;

            info!(
                tracking_id = %group.tracking_id(),
                checkpoint = %checkpoint,
                items = held_ids.len(),
                "Placed group on hold"
            );

            Ok(HoldOutcome {
                tracking_id: group.tracking_id().to_string(),
                checkpoint,
                held_count: held_ids.len(),
                held_ids,
                reason: reason.clone(),
            })
        })
    }

    /// Resume a held group and complete the checkpoint it was held at.
    ///
    /// Every held item gets `pending` cleared and `checkpoint` set in one
    /// commit, with an unhold event and a completion event per item.
    pub fn unhold(
        &self,
        tracking_id: &str,
        checkpoint: Checkpoint,
    ) -> Result<UnholdOutcome, WorkflowError> {
        self.execute("unhold", tracking_id, || {
            let mut group = self.load(tracking_id)?;
            let held: Vec<_> = group
                .members()
                .iter()
                .filter(|m| m.status.pending)
                .cloned()
                .collect();
            if held.is_empty() {
                return Err(WorkflowError::NotOnHold {
                    tracking_id: group.tracking_id().to_string(),
                });
            }
            if let Some(mismatch) = held
                .iter()
                .find(|m| m.status.held_checkpoint() != Some(checkpoint))
            {
                return Err(WorkflowError::WrongCheckpoint {
                    tracking_id: group.tracking_id().to_string(),
                    requested: checkpoint,
                    held: mismatch.status.held_checkpoint(),
                });
            }

            let mut changes = Vec::with_capacity(held.len());
            let mut events = Vec::with_capacity(held.len() * 2);
            for member in &held {
                let mut status = member.status;
                status.pending = false;
                status.mark(checkpoint);
                changes.push(StatusChange::new(member.id(), status));
                events.push(ScanEvent::for_item(
                    &member.record,
                    EventKind::Unhold,
                    EventOutcome::Resumed,
                ));
                events.push(ScanEvent::for_item(
                    &member.record,
                    checkpoint.into(),
                    EventOutcome::CompletedOnResume,
                ));
            }
            group.commit(self.catalog.as_ref(), changes, events)?;

            info!(
                tracking_id = %group.tracking_id(),
                checkpoint = %checkpoint,
                items = held.len(),
                "Resumed group"
            );

            Ok(UnholdOutcome {
                tracking_id: group.tracking_id().to_string(),
                checkpoint,
                resumed_count: held.len(),
                resumed_ids: held.iter().map(|m| m.id().to_string()).collect(),
                progress: group.progress(checkpoint),
                next_step: group.next_step(),
            })
        })
    }

    /// Cancel every item of the group, keeping its checkpoint flags.
    pub fn cancel(&self, tracking_id: &str) -> Result<CancelOutcome, WorkflowError> {
        self.execute("cancel", tracking_id, || {
            let mut group = self.resolver.resolve_existing(tracking_id)?;
            if group.all_cancelled() {
                return Err(WorkflowError::AlreadyCancelled {
                    tracking_id: group.tracking_id().to_string(),
                });
            }

            let mut changes = Vec::new();
            let mut events = Vec::new();
            for member in group.members().iter().filter(|m| !m.status.cancelled) {
                let mut status = member.status;
                status.cancelled = true;
                changes.push(StatusChange::new(member.id(), status));
                events.push(ScanEvent::for_item(
                    &member.record,
                    EventKind::Cancelled,
                    EventOutcome::Cancelled,
                ));
            }
            let cancelled_ids: Vec<String> =
                changes.iter().map(|c| c.tracker_id.clone()).collect();
            group.commit(self.catalog.as_ref(), changes, events)?;

            info!(
                tracking_id = %group.tracking_id(),
                items = cancelled_ids.len(),
                "Cancelled group"
            );

            Ok(CancelOutcome {
                tracking_id: group.tracking_id().to_string(),
                cancelled_count: cancelled_ids.len(),
                cancelled_ids,
            })
        })
    }

    fn execute<T>(
        &self,
        operation: &str,
        tracking_id: &str,
        attempt: impl Fn() -> Result<T, WorkflowError>,
    ) -> Result<T, WorkflowError> {
        let timer = metrics::OPERATION_DURATION
            .with_label_values(&[operation])
            .start_timer();

        let result = self
            .retry
            .run(operation, || self.locks.with_lock(tracking_id, &attempt));

        timer.observe_duration();
        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.kind().as_str(),
        };
        metrics::HOLD_OPERATIONS
            .with_label_values(&[operation, outcome])
            .inc();

        result
    }

    fn load(&self, tracking_id: &str) -> Result<TrackingGroup, WorkflowError> {
        let group = self.resolver.resolve_existing(tracking_id)?;
        group.ensure_consistent()?;
        if group.any_cancelled() {
            return Err(WorkflowError::AlreadyCancelled {
                tracking_id: group.tracking_id().to_string(),
            });
        }
        Ok(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::EventFilter;
    use crate::testing::fixtures;
    use crate::tracker::ScanStatus;
    use std::time::Duration;

    fn create_test_manager() -> (Arc<dyn TrackerCatalog>, HoldCancelManager) {
        let catalog = fixtures::in_memory_catalog();
        let manager = HoldCancelManager::new(
            Arc::clone(&catalog),
            Arc::new(KeyedLocks::new()),
            RetryPolicy::new(1, Duration::ZERO),
        );
        (catalog, manager)
    }

    fn set_all(catalog: &Arc<dyn TrackerCatalog>, tracking_id: &str, status: ScanStatus) {
        for record in catalog.get_group(tracking_id).unwrap() {
            catalog.set_status(&record.id, &status).unwrap();
        }
    }

    fn statuses(catalog: &Arc<dyn TrackerCatalog>, tracking_id: &str) -> Vec<ScanStatus> {
        catalog
            .get_group(tracking_id)
            .unwrap()
            .iter()
            .map(|r| catalog.get_status(&r.id).unwrap())
            .collect()
    }

    #[test]
    fn test_hold_then_unhold_completes_checkpoint() {
        let (catalog, manager) = create_test_manager();
        fixtures::seed_group(catalog.as_ref(), "T1", &["1", "2"]);
        set_all(&catalog, "T1", fixtures::status(true, false, false));

        let held = manager
            .hold("T1", Checkpoint::Packing, Some("damaged box"))
            .unwrap();
        assert_eq!(held.held_count, 2);
        assert!(statuses(&catalog, "T1").iter().all(|s| s.pending));

        let resumed = manager.unhold("t1", Checkpoint::Packing).unwrap();
        assert_eq!(resumed.resumed_count, 2);
        assert_eq!(resumed.next_step, NextStep::Dispatch);
        for status in statuses(&catalog, "T1") {
            assert!(!status.pending);
            assert!(status.packing);
        }

        let hold_events = catalog
            .list_events(&EventFilter::new().with_kind(EventKind::Pending))
            .unwrap();
        assert_eq!(hold_events.len(), 2);
        assert_eq!(hold_events[0].reason.as_deref(), Some("damaged box"));
        let completions = catalog
            .list_events(&EventFilter::new().with_kind(EventKind::Packing))
            .unwrap();
        assert!(completions
            .iter()
            .all(|e| e.outcome == EventOutcome::CompletedOnResume));
    }

    #[test]
    fn test_hold_twice_is_idempotent() {
        let (catalog, manager) = create_test_manager();
        fixtures::seed_group(catalog.as_ref(), "T1", &["1"]);

        manager.hold("T1", Checkpoint::Label, None).unwrap();
        let err = manager.hold("T1", Checkpoint::Label, None).unwrap_err();
        assert!(matches!(err, WorkflowError::AlreadyOnHold { .. }));
        assert!(err.is_idempotent());
    }

    #[test]
    fn test_hold_requires_prerequisites() {
        let (catalog, manager) = create_test_manager();
        fixtures::seed_group(catalog.as_ref(), "T1", &["1"]);

        let err = manager.hold("T1", Checkpoint::Dispatch, None).unwrap_err();
        assert!(matches!(err, WorkflowError::PrerequisiteNotMet { .. }));
        assert!(!statuses(&catalog, "T1")[0].pending);
    }

    #[test]
    fn test_hold_rejects_mixed_progress() {
        let (catalog, manager) = create_test_manager();
        let items = fixtures::seed_group(catalog.as_ref(), "T1", &["1", "2"]);
        set_all(&catalog, "T1", fixtures::status(true, false, false));
        catalog
            .set_status(&items[0].id, &fixtures::status(true, true, false))
            .unwrap();

        let err = manager.hold("T1", Checkpoint::Packing, None).unwrap_err();
        assert!(matches!(err, WorkflowError::PrerequisiteNotMet { .. }));
    }

    #[test]
    fn test_hold_completed_checkpoint() {
        let (catalog, manager) = create_test_manager();
        fixtures::seed_group(catalog.as_ref(), "T1", &["1", "2"]);
        set_all(&catalog, "T1", fixtures::status(true, false, false));
        let before = statuses(&catalog, "T1");

        let err = manager.hold("T1", Checkpoint::Label, None).unwrap_err();
        match &err {
            WorkflowError::PrerequisiteNotMet { reason, .. } => {
                assert_eq!(reason, "checkpoint already done")
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!err.is_idempotent());
        assert_eq!(statuses(&catalog, "T1"), before);
    }

    #[test]
    fn test_unhold_wrong_checkpoint_does_not_mutate() {
        let (catalog, manager) = create_test_manager();
        fixtures::seed_group(catalog.as_ref(), "T1", &["1"]);
        set_all(&catalog, "T1", fixtures::status(true, false, false));
        manager.hold("T1", Checkpoint::Packing, None).unwrap();
        let before = statuses(&catalog, "T1");

        let err = manager.unhold("T1", Checkpoint::Dispatch).unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::WrongCheckpoint {
                requested: Checkpoint::Dispatch,
                held: Some(Checkpoint::Packing),
                ..
            }
        ));
        assert_eq!(statuses(&catalog, "T1"), before);
    }

    #[test]
    fn test_unhold_without_hold() {
        let (catalog, manager) = create_test_manager();
        fixtures::seed_group(catalog.as_ref(), "T1", &["1"]);

        assert!(matches!(
            manager.unhold("T1", Checkpoint::Label),
            Err(WorkflowError::NotOnHold { .. })
        ));
    }

    #[test]
    fn test_cancel_keeps_progress_flags() {
        let (catalog, manager) = create_test_manager();
        fixtures::seed_group(catalog.as_ref(), "T1", &["1", "2"]);
        set_all(&catalog, "T1", fixtures::status(true, true, false));

        let outcome = manager.cancel("T1").unwrap();
        assert_eq!(outcome.cancelled_count, 2);
        for status in statuses(&catalog, "T1") {
            assert!(status.cancelled);
            assert!(status.label && status.packing);
        }

        let err = manager.cancel("T1").unwrap_err();
        assert!(matches!(err, WorkflowError::AlreadyCancelled { .. }));
    }

    #[test]
    fn test_cancelled_group_cannot_be_held() {
        let (catalog, manager) = create_test_manager();
        fixtures::seed_group(catalog.as_ref(), "T1", &["1"]);
        manager.cancel("T1").unwrap();

        assert!(matches!(
            manager.hold("T1", Checkpoint::Label, None),
            Err(WorkflowError::AlreadyCancelled { .. })
        ));
        assert!(matches!(
            manager.unhold("T1", Checkpoint::Label),
            Err(WorkflowError::AlreadyCancelled { .. })
        ));
    }

    #[test]
    fn test_cancel_finishes_partially_cancelled_group() {
        let (catalog, manager) = create_test_manager();
        let items = fixtures::seed_group(catalog.as_ref(), "T1", &["1", "2"]);
        let cancelled = ScanStatus {
            cancelled: true,
            ..Default::default()
        };
        catalog.set_status(&items[0].id, &cancelled).unwrap();

        let outcome = manager.cancel("T1").unwrap();
        assert_eq!(outcome.cancelled_ids, vec![items[1].id.clone()]);
    }
}
