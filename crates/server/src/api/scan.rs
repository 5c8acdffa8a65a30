//! Scan, hold and cancel handlers.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shiptrack_core::{
    BatchScanOutcome, CancelOutcome, EventFilter, EventKind, HoldOutcome, PackingOutcome,
    ScanEvent, UnholdOutcome,
};

use super::{parse_checkpoint, require_tracking_id, run_blocking, ApiError};
use crate::state::AppState;

/// Maximum allowed limit for event queries
const MAX_LIMIT: i64 = 1000;

/// Default limit for event queries
const DEFAULT_LIMIT: i64 = 100;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for label, packing and dispatch scans
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanBody {
    pub tracking_id: String,
    /// Scanned product code; packing only.
    pub product_code: Option<String>,
}

/// Request body for placing a group on hold
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldBody {
    pub tracking_id: String,
    pub checkpoint_type: String,
    pub reason: Option<String>,
}

/// Request body for resuming a group
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnholdBody {
    pub tracking_id: String,
    pub checkpoint_type: String,
}

/// Request body for cancelling a group
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelBody {
    pub tracking_id: String,
}

/// Query parameters for listing scan events
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEventsParams {
    pub tracking_id: Option<String>,
    pub tracker_id: Option<String>,
    /// Event type: label, packing, dispatch, pending, unhold or cancelled
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ListEventsResponse {
    pub events: Vec<ScanEvent>,
    pub limit: i64,
    pub offset: i64,
}

// ============================================================================
// Handlers
// ============================================================================

/// Scan the label of every unlabelled item of a group
pub async fn scan_label(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ScanBody>,
) -> Result<Json<BatchScanOutcome>, ApiError> {
    let tracking_id = require_tracking_id(&body.tracking_id)?;
    run_blocking(move || state.workflow().engine.scan_label(&tracking_id))
        .await
        .map(Json)
}

/// Pack the next item of a group, optionally the one matching a product code
pub async fn scan_packing(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ScanBody>,
) -> Result<Json<PackingOutcome>, ApiError> {
    let tracking_id = require_tracking_id(&body.tracking_id)?;
    run_blocking(move || {
        state
            .workflow()
            .engine
            .scan_packing(&tracking_id, body.product_code.as_deref())
    })
    .await
    .map(Json)
}

/// Dispatch every item of a group
pub async fn scan_dispatch(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ScanBody>,
) -> Result<Json<BatchScanOutcome>, ApiError> {
    let tracking_id = require_tracking_id(&body.tracking_id)?;
    run_blocking(move || state.workflow().engine.scan_dispatch(&tracking_id))
        .await
        .map(Json)
}

/// Place a group on hold before a checkpoint
pub async fn hold(
    State(state): State<Arc<AppState>>,
    Json(body): Json<HoldBody>,
) -> Result<Json<HoldOutcome>, ApiError> {
    let tracking_id = require_tracking_id(&body.tracking_id)?;
    let checkpoint = parse_checkpoint(&body.checkpoint_type)?;
    run_blocking(move || {
        state
            .workflow()
            .holds
            .hold(&tracking_id, checkpoint, body.reason.as_deref())
    })
    .await
    .map(Json)
}

/// Resume a held group, completing the checkpoint it was held at
pub async fn unhold(
    State(state): State<Arc<AppState>>,
    Json(body): Json<UnholdBody>,
) -> Result<Json<UnholdOutcome>, ApiError> {
    let tracking_id = require_tracking_id(&body.tracking_id)?;
    let checkpoint = parse_checkpoint(&body.checkpoint_type)?;
    run_blocking(move || state.workflow().holds.unhold(&tracking_id, checkpoint))
        .await
        .map(Json)
}

/// Cancel every item of a group
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CancelBody>,
) -> Result<Json<CancelOutcome>, ApiError> {
    let tracking_id = require_tracking_id(&body.tracking_id)?;
    run_blocking(move || state.workflow().holds.cancel(&tracking_id))
        .await
        .map(Json)
}

/// List scan history, newest first
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListEventsParams>,
) -> Result<Json<ListEventsResponse>, ApiError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut filter = EventFilter::new()
        .with_limit(limit)
        .with_offset(offset)
        .with_time_range(params.from, params.to);
    if let Some(tracking_id) = params.tracking_id {
        filter = filter.with_tracking_id(tracking_id);
    }
    if let Some(tracker_id) = params.tracker_id {
        filter = filter.with_tracker_id(tracker_id);
    }
    if let Some(kind) = params.kind {
        let kind = EventKind::parse(&kind)
            .ok_or_else(|| ApiError::bad_request(format!("Unknown event type '{}'", kind)))?;
        filter = filter.with_kind(kind);
    }

    let events = run_blocking(move || state.catalog().list_events(&filter)).await?;

    Ok(Json(ListEventsResponse {
        events,
        limit,
        offset,
    }))
}
