//! Tracking groups and the resolver that loads them.

use std::sync::Arc;

use super::WorkflowError;
use crate::catalog::{CatalogError, StatusChange, TrackerCatalog};
use crate::tracker::{Checkpoint, NextStep, ScanEvent, ScanProgress, ScanStatus, TrackerRecord};

/// One item of a group together with its current flags.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMember {
    pub record: TrackerRecord,
    pub status: ScanStatus,
}

impl GroupMember {
    pub fn id(&self) -> &str {
        &self.record.id
    }
}

/// All items sharing one tracking id, in insertion order.
#[derive(Debug, Clone)]
pub struct TrackingGroup {
    tracking_id: String,
    members: Vec<GroupMember>,
}

impl TrackingGroup {
    pub fn new(tracking_id: impl Into<String>, members: Vec<GroupMember>) -> Self {
        Self {
            tracking_id: tracking_id.into(),
            members,
        }
    }

    /// The tracking id as the caller supplied it.
    pub fn tracking_id(&self) -> &str {
        &self.tracking_id
    }

    pub fn members(&self) -> &[GroupMember] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_multi_sku(&self) -> bool {
        self.members.len() > 1
    }

    pub fn any_cancelled(&self) -> bool {
        self.members.iter().any(|m| m.status.cancelled)
    }

    pub fn all_cancelled(&self) -> bool {
        !self.is_empty() && self.members.iter().all(|m| m.status.cancelled)
    }

    pub fn any_pending(&self) -> bool {
        self.members.iter().any(|m| m.status.pending)
    }

    pub fn all_done(&self, checkpoint: Checkpoint) -> bool {
        !self.is_empty() && self.members.iter().all(|m| m.status.is_done(checkpoint))
    }

    pub fn progress(&self, checkpoint: Checkpoint) -> ScanProgress {
        ScanProgress {
            scanned: self
                .members
                .iter()
                .filter(|m| m.status.is_done(checkpoint))
                .count(),
            total: self.members.len(),
        }
    }

    /// First checkpoint not yet complete for every item.
    pub fn next_step(&self) -> NextStep {
        Checkpoint::ALL
            .into_iter()
            .find(|cp| !self.all_done(*cp))
            .map(NextStep::from)
            .unwrap_or(NextStep::Completed)
    }

    /// Members in item-selection order: channel id ascending (empty first),
    /// then tracking id, ties kept in insertion order.
    pub fn selection_order(&self) -> Vec<&GroupMember> {
        let mut ordered: Vec<&GroupMember> = self.members.iter().collect();
        ordered.sort_by(|a, b| {
            (a.record.channel_id.as_str(), a.record.tracking_id.as_str())
                .cmp(&(b.record.channel_id.as_str(), b.record.tracking_id.as_str()))
        });
        ordered
    }

    /// Write `changes` and `events` in one catalog transaction, then reflect
    /// the new flags in this group.
    pub(crate) fn commit(
        &mut self,
        catalog: &dyn TrackerCatalog,
        changes: Vec<StatusChange>,
        events: Vec<ScanEvent>,
    ) -> Result<(), WorkflowError> {
        catalog.commit(&changes, &events)?;
        for change in changes {
            if let Some(member) = self
                .members
                .iter_mut()
                .find(|m| m.record.id == change.tracker_id)
            {
                member.status = change.status;
            }
        }
        Ok(())
    }

    /// Fail with `Inconsistent` if any member violates the checkpoint ordering.
    pub fn ensure_consistent(&self) -> Result<(), WorkflowError> {
        match self.members.iter().find(|m| !m.status.is_consistent()) {
            Some(member) => Err(WorkflowError::Inconsistent {
                tracker_id: member.record.id.clone(),
                reason: format!(
                    "flags {:?} skip a checkpoint; run the repair operation",
                    member.status
                ),
            }),
            None => Ok(()),
        }
    }
}

/// Loads tracking groups from the catalog.
///
/// Always reads through to the catalog; nothing is cached between calls.
#[derive(Clone)]
pub struct GroupResolver {
    catalog: Arc<dyn TrackerCatalog>,
}

impl GroupResolver {
    pub fn new(catalog: Arc<dyn TrackerCatalog>) -> Self {
        Self { catalog }
    }

    /// Resolve `tracking_id` case-insensitively. An unknown id gives an empty group.
    pub fn resolve(&self, tracking_id: &str) -> Result<TrackingGroup, WorkflowError> {
        let records = self.catalog.get_group(tracking_id)?;
        let mut members = Vec::with_capacity(records.len());

        for record in records {
            let status = match self.catalog.get_status(&record.id) {
                Ok(status) => status,
                Err(CatalogError::NotFound(_)) => {
                    return Err(WorkflowError::Inconsistent {
                        tracker_id: record.id.clone(),
                        reason: "record has no status".to_string(),
                    })
                }
                Err(e) => return Err(e.into()),
            };
            members.push(GroupMember { record, status });
        }

        Ok(TrackingGroup::new(tracking_id.trim(), members))
    }

    /// Resolve `tracking_id`, failing with `NotFound` when nothing matches.
    pub fn resolve_existing(&self, tracking_id: &str) -> Result<TrackingGroup, WorkflowError> {
        let group = self.resolve(tracking_id)?;
        if group.is_empty() {
            return Err(WorkflowError::NotFound {
                tracking_id: tracking_id.trim().to_string(),
            });
        }
        Ok(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SqliteTrackerCatalog;

    fn member(id: &str, channel_id: &str, status: ScanStatus) -> GroupMember {
        GroupMember {
            record: TrackerRecord::new(id, "T1").with_channel_id(channel_id),
            status,
        }
    }

    #[test]
    fn test_selection_order_by_channel_then_insertion() {
        let group = TrackingGroup::new(
            "T1",
            vec![
                member("b", "2", ScanStatus::default()),
                member("a", "1", ScanStatus::default()),
                member("empty", "", ScanStatus::default()),
                member("b2", "2", ScanStatus::default()),
            ],
        );

        let ids: Vec<_> = group.selection_order().iter().map(|m| m.id()).collect();
        assert_eq!(ids, vec!["empty", "a", "b", "b2"]);
    }

    #[test]
    fn test_progress_and_next_step() {
        let labelled = ScanStatus {
            label: true,
            ..Default::default()
        };
        let packed = ScanStatus {
            label: true,
            packing: true,
            ..Default::default()
        };
        let group = TrackingGroup::new(
            "T1",
            vec![member("a", "1", packed), member("b", "2", labelled)],
        );

        assert_eq!(
            group.progress(Checkpoint::Packing),
            ScanProgress {
                scanned: 1,
                total: 2
            }
        );
        assert_eq!(group.next_step(), NextStep::Packing);
        assert!(group.is_multi_sku());
    }

    #[test]
    fn test_inconsistent_member_detected() {
        let broken = ScanStatus {
            packing: true,
            ..Default::default()
        };
        let group = TrackingGroup::new("T1", vec![member("a", "", broken)]);
        assert!(matches!(
            group.ensure_consistent(),
            Err(WorkflowError::Inconsistent { .. })
        ));
    }

    #[test]
    fn test_resolver() {
        let catalog: Arc<dyn TrackerCatalog> = Arc::new(SqliteTrackerCatalog::in_memory().unwrap());
        catalog
            .create_record(&TrackerRecord::new("a", "AWB1"), &ScanStatus::default())
            .unwrap();
        let resolver = GroupResolver::new(Arc::clone(&catalog));

        let group = resolver.resolve("awb1").unwrap();
        assert_eq!(group.len(), 1);
        assert!(resolver.resolve("nothing").unwrap().is_empty());
        assert!(matches!(
            resolver.resolve_existing("nothing"),
            Err(WorkflowError::NotFound { .. })
        ));
    }
}
