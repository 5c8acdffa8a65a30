use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{handlers, middleware::metrics_middleware, scan, system, trackers};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health, config and metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::metrics))
        // Scans
        .route("/scan/label", post(scan::scan_label))
        .route("/scan/packing", post(scan::scan_packing))
        .route("/scan/dispatch", post(scan::scan_dispatch))
        .route("/scan/pending", post(scan::hold))
        .route("/scan/unhold", post(scan::unhold))
        .route("/scan/cancelled", post(scan::cancel))
        .route("/scan/events", get(scan::list_events))
        // Trackers
        .route("/trackers", get(trackers::list_trackers))
        .route("/trackers/upload", post(trackers::upload))
        .route("/trackers/{id}", get(trackers::get_tracker))
        .route("/tracker/{tracking_id}/count", get(trackers::get_count))
        .route("/tracker/{tracking_id}/progress", get(trackers::get_progress))
        .route(
            "/tracker/{tracking_id}/packing-details",
            get(trackers::get_packing_details),
        )
        // Reporting
        .route("/statistics/couriers", get(system::courier_stats))
        .route("/dashboard/stats", get(system::dashboard))
        .route("/mirror/snapshot", get(system::mirror_snapshot))
        // Maintenance
        .route("/system/mirror", post(system::write_mirror))
        .route("/system/repair", post(system::repair))
        .route("/system/clear", post(system::clear))
        .route_layer(middleware::from_fn(metrics_middleware))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
