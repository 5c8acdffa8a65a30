//! Reporting, mirror and maintenance handlers.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shiptrack_core::{
    build_snapshot, ClearReport, CourierStats, DashboardStats, MirrorSnapshot, RepairReport,
};
use tracing::info;

use super::{parse_checkpoint, run_blocking, ApiError};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for courier statistics
#[derive(Debug, Deserialize)]
pub struct CourierStatsParams {
    /// label, packing or dispatch; any checkpoint when absent
    pub checkpoint: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CourierStatsResponse {
    pub couriers: Vec<CourierStats>,
}

/// Response for a mirror write
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorWriteResponse {
    pub rows: usize,
    pub generated_at: DateTime<Utc>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Per-courier group counts
pub async fn courier_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CourierStatsParams>,
) -> Result<Json<CourierStatsResponse>, ApiError> {
    let checkpoint = params
        .checkpoint
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .map(parse_checkpoint)
        .transpose()?;

    let couriers = run_blocking(move || state.progress().courier_stats(checkpoint)).await?;
    Ok(Json(CourierStatsResponse { couriers }))
}

/// Catalog-wide dashboard summary
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardStats>, ApiError> {
    run_blocking(move || state.progress().dashboard())
        .await
        .map(Json)
}

/// Build the spreadsheet mirror snapshot without writing it
pub async fn mirror_snapshot(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MirrorSnapshot>, ApiError> {
    run_blocking(move || build_snapshot(state.catalog()))
        .await
        .map(Json)
}

/// Build the snapshot and write it to the configured mirror
pub async fn write_mirror(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MirrorWriteResponse>, ApiError> {
    if state.mirror().is_none() {
        return Err(ApiError::new(
            StatusCode::CONFLICT,
            "mirror_not_configured",
            "No mirror destination is configured",
        ));
    }

    run_blocking(move || -> Result<MirrorWriteResponse, ApiError> {
        let snapshot = build_snapshot(state.catalog())?;
        if let Some(sink) = state.mirror() {
            sink.write(&snapshot)?;
        }
        info!(rows = snapshot.len(), "Mirror updated");
        Ok(MirrorWriteResponse {
            rows: snapshot.len(),
            generated_at: snapshot.generated_at,
        })
    })
    .await
    .map(Json)
}

/// Clear checkpoint flags whose prerequisites are missing
pub async fn repair(State(state): State<Arc<AppState>>) -> Result<Json<RepairReport>, ApiError> {
    run_blocking(move || state.workflow().maintenance.repair())
        .await
        .map(Json)
}

/// Delete every tracker not currently on hold
pub async fn clear(State(state): State<Arc<AppState>>) -> Result<Json<ClearReport>, ApiError> {
    run_blocking(move || state.workflow().maintenance.clear())
        .await
        .map(Json)
}
