//! Error responses shared by all handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shiptrack_core::{CatalogError, ErrorKind, MirrorError, UploadError, WorkflowError};

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable error kind.
    pub kind: String,
    /// True when the request changed nothing because there was nothing left to do.
    pub idempotent: bool,
}

/// A failed request: status code plus body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl ApiError {
    pub fn new(status: StatusCode, kind: &str, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: error.into(),
                kind: kind.to_string(),
                idempotent: false,
            },
        }
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_request", error)
    }

    pub fn internal(error: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::PrerequisiteNotMet
        | ErrorKind::AlreadyComplete
        | ErrorKind::AlreadyOnHold
        | ErrorKind::AlreadyCancelled
        | ErrorKind::WrongCheckpoint
        | ErrorKind::NotOnHold
        | ErrorKind::OnHold => StatusCode::CONFLICT,
        ErrorKind::ProductMismatch => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Transient => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Inconsistent | ErrorKind::Storage => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<WorkflowError> for ApiError {
    fn from(e: WorkflowError) -> Self {
        let kind = e.kind();
        Self {
            status: status_for(kind),
            body: ErrorResponse {
                error: e.to_string(),
                kind: kind.as_str().to_string(),
                idempotent: e.is_idempotent(),
            },
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::NotFound(_) => {
                Self::new(StatusCode::NOT_FOUND, "not_found", e.to_string())
            }
            other => WorkflowError::from(other).into(),
        }
    }
}

impl From<UploadError> for ApiError {
    fn from(e: UploadError) -> Self {
        match &e {
            UploadError::InvalidPolicy(_) => {
                Self::new(StatusCode::BAD_REQUEST, "invalid_policy", e.to_string())
            }
            UploadError::TooManyRows { .. } => {
                Self::new(StatusCode::PAYLOAD_TOO_LARGE, "too_many_rows", e.to_string())
            }
            _ if e.is_transient() => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "transient", e.to_string())
            }
            _ => Self::new(StatusCode::INTERNAL_SERVER_ERROR, "storage", e.to_string()),
        }
    }
}

impl From<MirrorError> for ApiError {
    fn from(e: MirrorError) -> Self {
        match e {
            MirrorError::Catalog(source) => source.into(),
            other => Self::new(StatusCode::INTERNAL_SERVER_ERROR, "mirror", other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shiptrack_core::Checkpoint;

    #[test]
    fn test_workflow_error_mapping() {
        let err = ApiError::from(WorkflowError::AlreadyComplete {
            tracking_id: "T1".to_string(),
            checkpoint: Checkpoint::Label,
        });
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.body.kind, "already_complete");
        assert!(err.body.idempotent);

        let err = ApiError::from(WorkflowError::ProductMismatch {
            tracking_id: "T1".to_string(),
            product_code: "X".to_string(),
        });
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(!err.body.idempotent);

        let err = ApiError::from(WorkflowError::Transient("busy".to_string()));
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_catalog_not_found_is_404() {
        let err = ApiError::from(CatalogError::NotFound("abc".to_string()));
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_upload_error_mapping() {
        let err = ApiError::from(UploadError::InvalidPolicy("merge".to_string()));
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err = ApiError::from(UploadError::Load(CatalogError::Transient("busy".to_string())));
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
