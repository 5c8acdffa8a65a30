//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Checkpoint scans by outcome
//! - Hold, unhold and cancel operations
//! - Upload reconciliation
//! - Store retries and operation latency

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Scan Workflow Metrics
// =============================================================================

/// Scans total by checkpoint and result.
pub static SCANS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("shiptrack_scans_total", "Total checkpoint scan attempts"),
        &["checkpoint", "result"], // result: "scanned" or an error kind
    )
    .unwrap()
});

/// Hold operations total by operation and result.
pub static HOLD_OPERATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "shiptrack_hold_operations_total",
            "Total hold, unhold and cancel operations",
        ),
        &["operation", "result"], // operation: "hold", "unhold", "cancel"
    )
    .unwrap()
});

// =============================================================================
// Upload Metrics
// =============================================================================

/// Uploaded rows by result.
pub static UPLOAD_ROWS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("shiptrack_upload_rows_total", "Total uploaded rows processed"),
        &["result"], // "created", "updated", "skipped"
    )
    .unwrap()
});

// =============================================================================
// Store Metrics
// =============================================================================

/// Retries after transient store failures.
pub static STORE_RETRIES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "shiptrack_store_retries_total",
        "Total retries after transient store failures",
    )
    .unwrap()
});

/// Duration of workflow operations, including retries.
pub static OPERATION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "shiptrack_operation_duration_seconds",
            "Duration of workflow operations",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
        &["operation"],
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(SCANS_TOTAL.clone()),
        Box::new(HOLD_OPERATIONS.clone()),
        Box::new(UPLOAD_ROWS.clone()),
        Box::new(STORE_RETRIES.clone()),
        Box::new(OPERATION_DURATION.clone()),
    ]
}
