//! Read-side progress reporting.
//!
//! Everything here is derived from status flags on demand. Nothing is
//! cached and nothing is written.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;

use crate::catalog::TrackerCatalog;
use crate::tracker::{
    stage_of, Checkpoint, NextStep, ScanProgress, ScanStatus, Stage, TrackerRecord,
};
use crate::workflow::{GroupResolver, TrackingGroup, WorkflowError};

const UNKNOWN_COURIER: &str = "Unknown";

/// Scanned/total per checkpoint for one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointCounts {
    pub label: ScanProgress,
    pub packing: ScanProgress,
    pub dispatch: ScanProgress,
}

impl CheckpointCounts {
    pub fn get(&self, checkpoint: Checkpoint) -> ScanProgress {
        match checkpoint {
            Checkpoint::Label => self.label,
            Checkpoint::Packing => self.packing,
            Checkpoint::Dispatch => self.dispatch,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointProgress {
    pub scanned: usize,
    pub total: usize,
    pub percentage: f64,
}

impl From<ScanProgress> for CheckpointProgress {
    fn from(progress: ScanProgress) -> Self {
        Self {
            scanned: progress.scanned,
            total: progress.total,
            percentage: progress.percentage(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupProgress {
    pub tracking_id: String,
    pub total_items: usize,
    pub label: CheckpointProgress,
    pub packing: CheckpointProgress,
    pub dispatch: CheckpointProgress,
    pub is_completed: bool,
    pub next_step: NextStep,
    pub on_hold: bool,
    pub cancelled: bool,
}

/// Group counts for one courier bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourierBucket {
    pub total: usize,
    pub scanned: usize,
    pub pending: usize,
}

impl CourierBucket {
    fn add(&mut self, scanned: bool) {
        self.total += 1;
        if scanned {
            self.scanned += 1;
        } else {
            self.pending += 1;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourierStats {
    pub courier: String,
    pub overall: CourierBucket,
    pub multi_sku: CourierBucket,
    pub single_sku: CourierBucket,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageCount {
    pub stage: Stage,
    pub label: &'static str,
    pub count: usize,
}

/// Catalog-wide summary, counted per record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_records: usize,
    pub total_groups: usize,
    pub by_stage: Vec<StageCount>,
    pub completed: usize,
    pub in_progress: usize,
    pub on_hold: usize,
    pub cancelled: usize,
    pub not_started: usize,
    pub completion_rate: f64,
    pub label: CheckpointProgress,
    pub packing: CheckpointProgress,
    pub dispatch: CheckpointProgress,
}

pub struct ProgressAggregator {
    catalog: Arc<dyn TrackerCatalog>,
    resolver: GroupResolver,
}

impl ProgressAggregator {
    pub fn new(catalog: Arc<dyn TrackerCatalog>) -> Self {
        Self {
            resolver: GroupResolver::new(Arc::clone(&catalog)),
            catalog,
        }
    }

    /// Scanned/total per checkpoint for `tracking_id`.
    pub fn counts(&self, tracking_id: &str) -> Result<CheckpointCounts, WorkflowError> {
        let group = self.resolver.resolve_existing(tracking_id)?;
        Ok(counts_of(&group))
    }

    pub fn group_progress(&self, tracking_id: &str) -> Result<GroupProgress, WorkflowError> {
        let group = self.resolver.resolve_existing(tracking_id)?;
        let counts = counts_of(&group);
        let next_step = group.next_step();

        Ok(GroupProgress {
            tracking_id: group.tracking_id().to_string(),
            total_items: group.len(),
            label: counts.label.into(),
            packing: counts.packing.into(),
            dispatch: counts.dispatch.into(),
            is_completed: next_step == NextStep::Completed,
            next_step,
            on_hold: group.any_pending(),
            cancelled: group.any_cancelled(),
        })
    }

    /// Per-courier group counts.
    ///
    /// Each group counts once. It counts as scanned when at least one of its
    /// items has the `checkpoint` flag set, or any checkpoint flag when
    /// `checkpoint` is `None`. The courier of a group is that of its first item.
    pub fn courier_stats(
        &self,
        checkpoint: Option<Checkpoint>,
    ) -> Result<Vec<CourierStats>, WorkflowError> {
        let groups = self.snapshot_groups()?;
        let mut by_courier: HashMap<String, CourierStats> = HashMap::new();

        for group in &groups {
            let courier = group
                .first()
                .map(|(record, _)| record.courier.trim())
                .filter(|c| !c.is_empty())
                .unwrap_or(UNKNOWN_COURIER)
                .to_string();
            let scanned = group.iter().any(|(_, status)| match checkpoint {
                Some(cp) => status.is_done(cp),
                None => status.any_checkpoint_done(),
            });

            let stats = by_courier
                .entry(courier.clone())
                .or_insert_with(|| CourierStats {
                    courier,
                    overall: CourierBucket::default(),
                    multi_sku: CourierBucket::default(),
                    single_sku: CourierBucket::default(),
                });
            stats.overall.add(scanned);
            if group.len() > 1 {
                stats.multi_sku.add(scanned);
            } else {
                stats.single_sku.add(scanned);
            }
        }

        let mut stats: Vec<CourierStats> = by_courier.into_values().collect();
        stats.sort_by(|a, b| {
            b.overall
                .total
                .cmp(&a.overall.total)
                .then_with(|| a.courier.cmp(&b.courier))
        });
        Ok(stats)
    }

    pub fn dashboard(&self) -> Result<DashboardStats, WorkflowError> {
        let records = self.catalog.list_all()?;
        let statuses = self.catalog.list_statuses()?;

        let mut by_stage: Vec<StageCount> = Stage::ALL
            .into_iter()
            .map(|stage| StageCount {
                stage,
                label: stage.label(),
                count: 0,
            })
            .collect();
        let mut groups = HashSet::new();
        let (mut completed, mut in_progress, mut on_hold, mut cancelled, mut not_started) =
            (0, 0, 0, 0, 0);
        let (mut labelled, mut packed, mut dispatched) = (0, 0, 0);

        for record in &records {
            let status = status_for(&statuses, record)?;
            groups.insert(record.tracking_key());

            let stage = stage_of(&status);
            if let Some(entry) = by_stage.iter_mut().find(|s| s.stage == stage) {
                entry.count += 1;
            }

            if status.cancelled {
                cancelled += 1;
            } else if status.dispatch {
                completed += 1;
            } else if status.pending {
                on_hold += 1;
            } else if status.any_checkpoint_done() {
                in_progress += 1;
            } else {
                not_started += 1;
            }

            labelled += usize::from(status.label);
            packed += usize::from(status.packing);
            dispatched += usize::from(status.dispatch);
        }

        let total = records.len();
        let progress = |scanned| CheckpointProgress::from(ScanProgress { scanned, total });

        Ok(DashboardStats {
            total_records: total,
            total_groups: groups.len(),
            by_stage,
            completed,
            in_progress,
            on_hold,
            cancelled,
            not_started,
            completion_rate: progress(completed).percentage,
            label: progress(labelled),
            packing: progress(packed),
            dispatch: progress(dispatched),
        })
    }

    /// Every group with member statuses, in first-insertion order.
    fn snapshot_groups(&self) -> Result<Vec<Vec<(TrackerRecord, ScanStatus)>>, WorkflowError> {
        let records = self.catalog.list_all()?;
        let statuses = self.catalog.list_statuses()?;

        let mut index: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<Vec<(TrackerRecord, ScanStatus)>> = Vec::new();
        for record in records {
            let status = status_for(&statuses, &record)?;
            let slot = *index.entry(record.tracking_key()).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push((record, status));
        }
        Ok(groups)
    }
}

fn counts_of(group: &TrackingGroup) -> CheckpointCounts {
    CheckpointCounts {
        label: group.progress(Checkpoint::Label),
        packing: group.progress(Checkpoint::Packing),
        dispatch: group.progress(Checkpoint::Dispatch),
    }
}

fn status_for(
    statuses: &HashMap<String, ScanStatus>,
    record: &TrackerRecord,
) -> Result<ScanStatus, WorkflowError> {
    statuses
        .get(&record.id)
        .copied()
        .ok_or_else(|| WorkflowError::Inconsistent {
            tracker_id: record.id.clone(),
            reason: "record has no status".to_string(),
        })
}
