//! Workflow error taxonomy.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::CatalogError;
use crate::tracker::Checkpoint;

/// Errors for scan, hold and maintenance operations.
///
/// Every variant names the tracking id (or tracker id) it concerns. All
/// validation failures are raised before anything is written.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("No trackers found for tracking id {tracking_id}")]
    NotFound { tracking_id: String },

    #[error("{checkpoint} prerequisites not met for {tracking_id}: {reason}")]
    PrerequisiteNotMet {
        tracking_id: String,
        checkpoint: Checkpoint,
        reason: String,
    },

    #[error("{checkpoint} already complete for {tracking_id}")]
    AlreadyComplete {
        tracking_id: String,
        checkpoint: Checkpoint,
    },

    #[error("{tracking_id} is already on hold")]
    AlreadyOnHold { tracking_id: String },

    #[error("{tracking_id} is cancelled")]
    AlreadyCancelled { tracking_id: String },

    #[error("Product code '{product_code}' does not match any item of {tracking_id}")]
    ProductMismatch {
        tracking_id: String,
        product_code: String,
    },

    #[error("{tracking_id} is held at {}, not {requested}", .held.map(|c| c.as_str()).unwrap_or("no checkpoint"))]
    WrongCheckpoint {
        tracking_id: String,
        requested: Checkpoint,
        held: Option<Checkpoint>,
    },

    #[error("{tracking_id} is not on hold")]
    NotOnHold { tracking_id: String },

    #[error("{tracking_id} is on hold; unhold it before scanning")]
    OnHold { tracking_id: String },

    #[error("Store temporarily unavailable: {0}")]
    Transient(String),

    #[error("Tracker {tracker_id} is inconsistent: {reason}")]
    Inconsistent { tracker_id: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(String),
}

/// Machine-readable kind of a [`WorkflowError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    PrerequisiteNotMet,
    AlreadyComplete,
    AlreadyOnHold,
    AlreadyCancelled,
    ProductMismatch,
    WrongCheckpoint,
    NotOnHold,
    OnHold,
    Transient,
    Inconsistent,
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::PrerequisiteNotMet => "prerequisite_not_met",
            ErrorKind::AlreadyComplete => "already_complete",
            ErrorKind::AlreadyOnHold => "already_on_hold",
            ErrorKind::AlreadyCancelled => "already_cancelled",
            ErrorKind::ProductMismatch => "product_mismatch",
            ErrorKind::WrongCheckpoint => "wrong_checkpoint",
            ErrorKind::NotOnHold => "not_on_hold",
            ErrorKind::OnHold => "on_hold",
            ErrorKind::Transient => "transient",
            ErrorKind::Inconsistent => "inconsistent",
            ErrorKind::Storage => "storage",
        }
    }
}

impl WorkflowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WorkflowError::NotFound { .. } => ErrorKind::NotFound,
            WorkflowError::PrerequisiteNotMet { .. } => ErrorKind::PrerequisiteNotMet,
            WorkflowError::AlreadyComplete { .. } => ErrorKind::AlreadyComplete,
            WorkflowError::AlreadyOnHold { .. } => ErrorKind::AlreadyOnHold,
            WorkflowError::AlreadyCancelled { .. } => ErrorKind::AlreadyCancelled,
            WorkflowError::ProductMismatch { .. } => ErrorKind::ProductMismatch,
            WorkflowError::WrongCheckpoint { .. } => ErrorKind::WrongCheckpoint,
            WorkflowError::NotOnHold { .. } => ErrorKind::NotOnHold,
            WorkflowError::OnHold { .. } => ErrorKind::OnHold,
            WorkflowError::Transient(_) => ErrorKind::Transient,
            WorkflowError::Inconsistent { .. } => ErrorKind::Inconsistent,
            WorkflowError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// True for conditions that mean "nothing left to do" rather than a failure.
    ///
    /// A retried request that already went through lands here.
    pub fn is_idempotent(&self) -> bool {
        matches!(
            self,
            WorkflowError::AlreadyComplete { .. }
                | WorkflowError::AlreadyOnHold { .. }
                | WorkflowError::AlreadyCancelled { .. }
        )
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, WorkflowError::Transient(_))
    }
}

impl From<CatalogError> for WorkflowError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::Transient(msg) => WorkflowError::Transient(msg),
            other => WorkflowError::Storage(other.to_string()),
        }
    }
}
