//! Common test utilities for in-process API testing.
//!
//! The fixture builds the real router over a SQLite catalog in a temporary
//! directory, so requests exercise the full handler, workflow and storage path.

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use shiptrack_core::{
    Config, DatabaseConfig, MirrorConfig, ServerConfig, SqliteTrackerCatalog,
    TrackerCatalog,
};
use shiptrack_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
#[allow(unused_imports)]
pub use shiptrack_core::testing::fixtures;

/// Test fixture running the API in-process.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Direct handle on the catalog behind the router
    pub catalog: Arc<dyn TrackerCatalog>,
    /// Temporary directory for the test database and mirror output
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

#[allow(dead_code)]
impl TestFixture {
    /// Create a fixture without a mirror destination.
    pub fn new() -> Self {
        Self::build(false)
    }

    /// Create a fixture whose mirror writes to `mirror.json` in the temp dir.
    pub fn with_mirror() -> Self {
        Self::build(true)
    }

    fn build(mirror: bool) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            database: DatabaseConfig {
                path: db_path.clone(),
                ..Default::default()
            },
            mirror: MirrorConfig {
                path: mirror.then(|| temp_dir.path().join("mirror.json")),
            },
            ..Default::default()
        };

        let catalog: Arc<dyn TrackerCatalog> = Arc::new(
            SqliteTrackerCatalog::new(&db_path, config.database.busy_timeout())
                .expect("Failed to create catalog"),
        );

        let state = Arc::new(AppState::new(config, Arc::clone(&catalog)));
        let router = create_router(state);

        Self {
            router,
            catalog,
            temp_dir,
        }
    }

    /// Path the mirror writes to when enabled.
    pub fn mirror_path(&self) -> PathBuf {
        self.temp_dir.path().join("mirror.json")
    }

    /// Upload rows under the given policy and return the response.
    pub async fn upload(&self, rows: Value, policy: Option<&str>) -> TestResponse {
        let mut body = json!({ "rows": rows });
        if let Some(policy) = policy {
            body["duplicatePolicy"] = json!(policy);
        }
        self.post("/api/v1/trackers/upload", body).await
    }

    /// Upload a two-item group (channels 2 then 1) and a single-item group.
    pub async fn seed_default(&self) {
        let response = self
            .upload(
                json!([
                    { "trackingId": "T1", "skuCode": "SKU-B", "channelId": "2", "courier": "Delhivery" },
                    { "trackingId": "T1", "skuCode": "SKU-A", "channelId": "1", "courier": "Delhivery" },
                    { "trackingId": "T2", "skuCode": "SKU-C", "channelId": "1", "courier": "BlueDart" }
                ]),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "seed upload failed: {}", response.body);
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request without a body.
    pub async fn post_empty(&self, path: &str) -> TestResponse {
        self.request("POST", path, None).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body_bytes).into_owned()))
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
