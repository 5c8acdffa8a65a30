//! Checkpoint scanning.
//!
//! Label and dispatch advance every remaining item of a group in one batch.
//! Packing advances exactly one item per scan so an operator can scan each
//! physical package of a multi-SKU shipment in turn.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::{GroupMember, GroupResolver, KeyedLocks, RetryPolicy, TrackingGroup, WorkflowError};
use crate::catalog::{StatusChange, TrackerCatalog};
use crate::metrics;
use crate::tracker::{Checkpoint, EventOutcome, NextStep, ScanEvent, ScanProgress, TrackerRecord};

/// Result of a label or dispatch scan.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchScanOutcome {
    pub tracking_id: String,
    pub checkpoint: Checkpoint,
    pub scanned_count: usize,
    pub scanned_ids: Vec<String>,
    pub progress: ScanProgress,
    pub next_step: NextStep,
}

/// Result of a packing scan.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackingOutcome {
    pub tracking_id: String,
    /// The item that was packed.
    pub item: TrackerRecord,
    pub progress: ScanProgress,
    pub next_step: NextStep,
}

/// One item of a group as shown in a packing preview.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackingItem {
    pub tracker_id: String,
    pub sku_code: String,
    pub alternate_sku_code: String,
    pub product_sku_code: String,
    pub channel_id: String,
    pub order_id: String,
    pub packed: bool,
}

impl From<&GroupMember> for PackingItem {
    fn from(member: &GroupMember) -> Self {
        let record = &member.record;
        Self {
            tracker_id: record.id.clone(),
            sku_code: record.sku_code.clone(),
            alternate_sku_code: record.alternate_sku_code.clone(),
            product_sku_code: record.product_sku_code.clone(),
            channel_id: record.channel_id.clone(),
            order_id: record.order_id.clone(),
            packed: member.status.packing,
        }
    }
}

/// What the next packing scan of a group would pick, without scanning it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackingDetails {
    pub tracking_id: String,
    pub is_multi_sku: bool,
    pub next_item: PackingItem,
    pub progress: ScanProgress,
    pub remaining: usize,
    /// Every item of the group, in selection order.
    pub items: Vec<PackingItem>,
}

/// Enforces checkpoint ordering and records scans.
pub struct ScanWorkflowEngine {
    catalog: Arc<dyn TrackerCatalog>,
    resolver: GroupResolver,
    locks: Arc<KeyedLocks>,
    retry: RetryPolicy,
}

impl ScanWorkflowEngine {
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

    /// Scan the label of every item of the group not yet labelled.
    pub fn scan_label(&self, tracking_id: &str) -> Result<BatchScanOutcome, WorkflowError> {
        self.execute(Checkpoint::Label, tracking_id, || {
            let mut group = self.load(tracking_id)?;
            if group.all_done(Checkpoint::Label) {
                return Err(already_complete(&group, Checkpoint::Label));
            }
            ensure_not_held(&group)?;

            let targets: Vec<GroupMember> = group
                .members()
                .iter()
                .filter(|m| !m.status.label)
                .cloned()
                .collect();
            self.scan_batch(&mut group, Checkpoint::Label, targets)
        })
    }

    /// Pack the next eligible item of the group.
    ///
    /// With a product code, only items whose SKU or alternate SKU matches are
    /// eligible. Among eligible items the first unpacked one in selection
    /// order is chosen; it must already be labelled.
    pub fn scan_packing(
        &self,
        tracking_id: &str,
        product_code: Option<&str>,
    ) -> Result<PackingOutcome, WorkflowError> {
        let product_code = product_code.map(str::trim).filter(|code| !code.is_empty());

        self.execute(Checkpoint::Packing, tracking_id, || {
            let mut group = self.load(tracking_id)?;
            let selected = select_for_packing(&group, product_code)?;

            let mut status = selected.status;
            status.mark(Checkpoint::Packing);
            let event = ScanEvent::for_item(
                &selected.record,
                Checkpoint::Packing.into(),
                EventOutcome::Scanned,
            )
            .with_product_code(product_code.map(str::to_string));

            group.commit(
                self.catalog.as_ref(),
                vec![StatusChange::new(selected.id(), status)],
                vec![event],
            )?;

            let progress = group.progress(Checkpoint::Packing);
            info!(
                tracking_id = %group.tracking_id(),
                tracker_id = %selected.id(),
                scanned = progress.scanned,
                total = progress.total,
                "Packed item"
            );

            Ok(PackingOutcome {
                tracking_id: group.tracking_id().to_string(),
                item: selected.record,
                progress,
                next_step: group.next_step(),
            })
        })
    }

    /// Preview the item the next packing scan would pick.
    ///
    /// Runs the same selection and checks as [`scan_packing`](Self::scan_packing)
    /// and fails the same way, but never writes.
    pub fn next_packing_item(
        &self,
        tracking_id: &str,
        product_code: Option<&str>,
    ) -> Result<PackingDetails, WorkflowError> {
        let product_code = product_code.map(str::trim).filter(|code| !code.is_empty());

        let group = self.load(tracking_id)?;
        let selected = select_for_packing(&group, product_code)?;
        let progress = group.progress(Checkpoint::Packing);

        Ok(PackingDetails {
            tracking_id: group.tracking_id().to_string(),
            is_multi_sku: group.len() > 1,
            next_item: PackingItem::from(&selected),
            remaining: progress.total - progress.scanned,
            progress,
            items: group
                .selection_order()
                .into_iter()
                .map(PackingItem::from)
                .collect(),
        })
    }

    /// Dispatch every item of the group. All items must be labelled and packed.
    pub fn scan_dispatch(&self, tracking_id: &str) -> Result<BatchScanOutcome, WorkflowError> {
        self.execute(Checkpoint::Dispatch, tracking_id, || {
            let mut group = self.load(tracking_id)?;
            if group.all_done(Checkpoint::Dispatch) {
                return Err(already_complete(&group, Checkpoint::Dispatch));
            }
            ensure_not_held(&group)?;

            if let Some(blocked) = group
                .members()
                .iter()
                .find(|m| !m.status.prerequisites_met(Checkpoint::Dispatch))
            {
                let missing = if blocked.status.label { "packed" } else { "labelled" };
                return Err(WorkflowError::PrerequisiteNotMet {
                    tracking_id: group.tracking_id().to_string(),
                    checkpoint: Checkpoint::Dispatch,
                    reason: format!("item {} is not {}", blocked.id(), missing),
                });
            }

            let targets: Vec<GroupMember> = group
                .members()
                .iter()
                .filter(|m| !m.status.dispatch)
                .cloned()
                .collect();
            self.scan_batch(&mut group, Checkpoint::Dispatch, targets)
        })
    }

    /// Retry transient failures, serializing each attempt on the group's lock.
    fn execute<T>(
        &self,
        checkpoint: Checkpoint,
        tracking_id: &str,
        attempt: impl Fn() -> Result<T, WorkflowError>,
    ) -> Result<T, WorkflowError> {
        let operation = format!("scan_{}", checkpoint);
        let timer = metrics::OPERATION_DURATION
            .with_label_values(&[operation.as_str()])
            .start_timer();

        let result = self
            .retry
            .run(&operation, || self.locks.with_lock(tracking_id, &attempt));

        timer.observe_duration();
        let outcome = match &result {
            Ok(_) => "scanned",
            Err(e) => e.kind().as_str(),
        };
        metrics::SCANS_TOTAL
            .with_label_values(&[checkpoint.as_str(), outcome])
            .inc();

        result
    }

    /// Load the group and apply the checks common to every scan.
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

    fn scan_batch(
        &self,
        group: &mut TrackingGroup,
        checkpoint: Checkpoint,
        targets: Vec<GroupMember>,
    ) -> Result<BatchScanOutcome, WorkflowError> {
        let mut changes = Vec::with_capacity(targets.len());
        let mut events = Vec::with_capacity(targets.len());
        for member in &targets {
            let mut status = member.status;
            status.mark(checkpoint);
            changes.push(StatusChange::new(member.id(), status));
            events.push(ScanEvent::for_item(
                &member.record,
                checkpoint.into(),
                EventOutcome::Scanned,
            ));
        }

        group.commit(self.catalog.as_ref(), changes, events)?;

        info!(
            tracking_id = %group.tracking_id(),
            checkpoint = %checkpoint,
            items = targets.len(),
            "Scanned group"
        );

        Ok(BatchScanOutcome {
            tracking_id: group.tracking_id().to_string(),
            checkpoint,
            scanned_count: targets.len(),
            scanned_ids: targets.iter().map(|m| m.id().to_string()).collect(),
            progress: group.progress(checkpoint),
            next_step: group.next_step(),
        })
    }
}

fn already_complete(group: &TrackingGroup, checkpoint: Checkpoint) -> WorkflowError {
    WorkflowError::AlreadyComplete {
        tracking_id: group.tracking_id().to_string(),
        checkpoint,
    }
}

fn ensure_not_held(group: &TrackingGroup) -> Result<(), WorkflowError> {
    if group.any_pending() {
        return Err(WorkflowError::OnHold {
            tracking_id: group.tracking_id().to_string(),
        });
    }
    Ok(())
}

fn select_for_packing(
    group: &TrackingGroup,
    product_code: Option<&str>,
) -> Result<GroupMember, WorkflowError> {
    let mut candidates = group.selection_order();
    if let Some(code) = product_code {
        candidates.retain(|m| m.record.matches_product(code));
        if candidates.is_empty() {
            return Err(WorkflowError::ProductMismatch {
                tracking_id: group.tracking_id().to_string(),
                product_code: code.to_string(),
            });
        }
    }

    let selected = match candidates.into_iter().find(|m| !m.status.packing) {
        Some(member) => member,
        None => return Err(already_complete(group, Checkpoint::Packing)),
    };
    ensure_not_held(group)?;

    if !selected.status.prerequisites_met(Checkpoint::Packing) {
        return Err(WorkflowError::PrerequisiteNotMet {
            tracking_id: group.tracking_id().to_string(),
            checkpoint: Checkpoint::Packing,
            reason: format!("label not scanned for item {}", selected.id()),
        });
    }

    Ok(selected.clone())
}
