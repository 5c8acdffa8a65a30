//! Tracker upload and lookup handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use shiptrack_core::{
    stage_of, tracking_key, Checkpoint, CheckpointCounts, DuplicatePolicy, GroupProgress,
    PackingDetails, ScanStatus, TrackerRecord, UploadRow, UploadSummary, WorkflowError,
};

use super::{require_tracking_id, run_blocking, ApiError};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for uploading shipment rows
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadBody {
    pub rows: Vec<UploadRow>,
    /// skip, allow or update; the configured default when absent
    pub duplicate_policy: Option<String>,
}

/// Query parameters for listing trackers
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTrackersParams {
    pub tracking_id: Option<String>,
}

/// A tracker record with its flags and derived stage
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerView {
    #[serde(flatten)]
    pub record: TrackerRecord,
    pub status: ScanStatus,
    pub stage: String,
    pub status_label: String,
    /// Next checkpoint to scan, absent once dispatched.
    pub next_checkpoint: Option<Checkpoint>,
}

impl TrackerView {
    fn new(record: TrackerRecord, status: ScanStatus) -> Self {
        let stage = stage_of(&status);
        Self {
            record,
            status,
            stage: stage.label().to_string(),
            status_label: stage.status_label().to_string(),
            next_checkpoint: status.next_checkpoint(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListTrackersResponse {
    pub trackers: Vec<TrackerView>,
    pub total: usize,
}

/// Query parameters for the packing preview
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackingDetailsParams {
    pub product_code: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountResponse {
    pub tracking_id: String,
    #[serde(flatten)]
    pub counts: CheckpointCounts,
}

// ============================================================================
// Handlers
// ============================================================================

/// Ingest uploaded rows under a duplicate policy
pub async fn upload(
    State(state): State<Arc<AppState>>,
    Json(body): Json<UploadBody>,
) -> Result<Json<UploadSummary>, ApiError> {
    let policy = match body.duplicate_policy.as_deref() {
        Some(policy) => policy.parse::<DuplicatePolicy>()?,
        None => state.default_policy(),
    };
    run_blocking(move || state.uploads().ingest(&body.rows, policy))
        .await
        .map(Json)
}

/// List trackers with their flags and stage
pub async fn list_trackers(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListTrackersParams>,
) -> Result<Json<ListTrackersResponse>, ApiError> {
    let trackers = run_blocking(move || -> Result<Vec<TrackerView>, ApiError> {
        let catalog = state.catalog();
        let records = match params.tracking_id.as_deref() {
            Some(tracking_id) => catalog.get_group(tracking_id)?,
            None => catalog.list_all()?,
        };
        let statuses = catalog.list_statuses()?;

        records
            .into_iter()
            .map(|record| -> Result<TrackerView, ApiError> {
                let status = statuses.get(&record.id).copied().ok_or_else(|| {
                    WorkflowError::Inconsistent {
                        tracker_id: record.id.clone(),
                        reason: "record has no status".to_string(),
                    }
                })?;
                Ok(TrackerView::new(record, status))
            })
            .collect()
    })
    .await?;

    Ok(Json(ListTrackersResponse {
        total: trackers.len(),
        trackers,
    }))
}

/// Get a single tracker by id
pub async fn get_tracker(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TrackerView>, ApiError> {
    run_blocking(move || -> Result<TrackerView, ApiError> {
        let record = state.catalog().get_record(&id)?;
        let status = state.catalog().get_status(&id)?;
        Ok(TrackerView::new(record, status))
    })
    .await
    .map(Json)
}

/// Scanned/total per checkpoint for a tracking id
pub async fn get_count(
    State(state): State<Arc<AppState>>,
    Path(tracking_id): Path<String>,
) -> Result<Json<CountResponse>, ApiError> {
    let tracking_id = require_tracking_id(&tracking_id)?;
    run_blocking(move || {
        state.progress().counts(&tracking_id).map(|counts| CountResponse {
            tracking_id: tracking_key(&tracking_id),
            counts,
        })
    })
    .await
    .map(Json)
}

/// Percentages and next step for a tracking id
pub async fn get_progress(
    State(state): State<Arc<AppState>>,
    Path(tracking_id): Path<String>,
) -> Result<Json<GroupProgress>, ApiError> {
    let tracking_id = require_tracking_id(&tracking_id)?;
    run_blocking(move || state.progress().group_progress(&tracking_id))
        .await
        .map(Json)
}

/// Preview the item the next packing scan would pick, without scanning it
pub async fn get_packing_details(
    State(state): State<Arc<AppState>>,
    Path(tracking_id): Path<String>,
    Query(params): Query<PackingDetailsParams>,
) -> Result<Json<PackingDetails>, ApiError> {
    let tracking_id = require_tracking_id(&tracking_id)?;
    run_blocking(move || {
        state
            .workflow()
            .engine
            .next_packing_item(&tracking_id, params.product_code.as_deref())
    })
    .await
    .map(Json)
}
