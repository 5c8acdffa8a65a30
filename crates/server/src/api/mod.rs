pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod scan;
pub mod system;
pub mod trackers;

pub use error::{ApiError, ErrorResponse};
pub use routes::create_router;

/// Run a synchronous core operation on the blocking pool.
///
/// Core operations take store locks and may sleep between retries, so they
/// never run on the async workers.
pub(crate) async fn run_blocking<T, E>(
    operation: impl FnOnce() -> Result<T, E> + Send + 'static,
) -> Result<T, ApiError>
where
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    match tokio::task::spawn_blocking(operation).await {
        Ok(result) => result.map_err(Into::into),
        Err(e) => Err(ApiError::internal(format!("Worker task failed: {}", e))),
    }
}

/// Read a required, non-blank tracking id from a request.
pub(crate) fn require_tracking_id(tracking_id: &str) -> Result<String, ApiError> {
    let trimmed = tracking_id.trim();
    if trimmed.is_empty() {
        return Err(ApiError::bad_request("trackingId is required"));
    }
    Ok(trimmed.to_string())
}

/// Parse a checkpoint name from a request.
pub(crate) fn parse_checkpoint(value: &str) -> Result<shiptrack_core::Checkpoint, ApiError> {
    value
        .parse()
        .map_err(|e: shiptrack_core::UnknownCheckpoint| ApiError::bad_request(e.to_string()))
}
