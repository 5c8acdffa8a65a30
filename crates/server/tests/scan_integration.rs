//! Scan, hold and cancel endpoints exercised end to end.

mod common;

use axum::http::StatusCode;
use common::TestFixture;
use serde_json::json;

#[tokio::test]
async fn test_full_scan_sequence() {
    let fixture = TestFixture::new();
    fixture.seed_default().await;

    let response = fixture
        .post("/api/v1/scan/label", json!({ "trackingId": "T1" }))
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["checkpoint"], "label");
    assert_eq!(response.body["scannedCount"], 2);
    assert_eq!(response.body["nextStep"], "packing");

    // Lowest channel id is packed first regardless of upload order
    let response = fixture
        .post("/api/v1/scan/packing", json!({ "trackingId": "T1" }))
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["item"]["channelId"], "1");
    assert_eq!(response.body["progress"]["scanned"], 1);
    assert_eq!(response.body["progress"]["total"], 2);
    assert_eq!(response.body["nextStep"], "packing");

    let response = fixture
        .post("/api/v1/scan/packing", json!({ "trackingId": "T1" }))
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["item"]["channelId"], "2");
    assert_eq!(response.body["nextStep"], "dispatch");

    let response = fixture
        .post("/api/v1/scan/dispatch", json!({ "trackingId": "T1" }))
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["scannedCount"], 2);
    assert_eq!(response.body["nextStep"], "completed");

    let response = fixture.get("/api/v1/tracker/T1/progress").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["isCompleted"], true);
    assert_eq!(response.body["dispatch"]["percentage"], 100.0);
}

#[tokio::test]
async fn test_tracking_id_is_case_insensitive() {
    let fixture = TestFixture::new();
    fixture.seed_default().await;

    let response = fixture
        .post("/api/v1/scan/label", json!({ "trackingId": "  t1 " }))
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["scannedCount"], 2);
}

#[tokio::test]
async fn test_repeated_label_scan_is_idempotent_conflict() {
    let fixture = TestFixture::new();
    fixture.seed_default().await;

    fixture
        .post("/api/v1/scan/label", json!({ "trackingId": "T2" }))
        .await;
    let response = fixture
        .post("/api/v1/scan/label", json!({ "trackingId": "T2" }))
        .await;

    assert_status!(response, StatusCode::CONFLICT);
    assert_eq!(response.body["kind"], "already_complete");
    assert_eq!(response.body["idempotent"], true);
}

#[tokio::test]
async fn test_unknown_tracking_id_is_not_found() {
    let fixture = TestFixture::new();

    let response = fixture
        .post("/api/v1/scan/label", json!({ "trackingId": "NOPE" }))
        .await;
    assert_status!(response, StatusCode::NOT_FOUND);
    assert_eq!(response.body["kind"], "not_found");
}

#[tokio::test]
async fn test_blank_tracking_id_is_bad_request() {
    let fixture = TestFixture::new();

    let response = fixture
        .post("/api/v1/scan/label", json!({ "trackingId": "   " }))
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["kind"], "invalid_request");
}

#[tokio::test]
async fn test_malformed_body_is_rejected() {
    let fixture = TestFixture::new();

    let response = fixture.post_raw("/api/v1/scan/label", "{not json").await;
    assert!(response.status.is_client_error());
}

#[tokio::test]
async fn test_packing_before_label_is_conflict() {
    let fixture = TestFixture::new();
    fixture.seed_default().await;

    let response = fixture
        .post("/api/v1/scan/packing", json!({ "trackingId": "T1" }))
        .await;
    assert_status!(response, StatusCode::CONFLICT);
    assert_eq!(response.body["kind"], "prerequisite_not_met");
    assert_eq!(response.body["idempotent"], false);
}

#[tokio::test]
async fn test_dispatch_before_packing_is_conflict() {
    let fixture = TestFixture::new();
    fixture.seed_default().await;

    fixture
        .post("/api/v1/scan/label", json!({ "trackingId": "T1" }))
        .await;
    let response = fixture
        .post("/api/v1/scan/dispatch", json!({ "trackingId": "T1" }))
        .await;

    assert_status!(response, StatusCode::CONFLICT);
    assert_eq!(response.body["kind"], "prerequisite_not_met");
    assert!(response.body["error"].as_str().unwrap().contains("packed"));
}

#[tokio::test]
async fn test_packing_by_product_code() {
    let fixture = TestFixture::new();
    fixture.seed_default().await;

    fixture
        .post("/api/v1/scan/label", json!({ "trackingId": "T1" }))
        .await;

    let response = fixture
        .post(
            "/api/v1/scan/packing",
            json!({ "trackingId": "T1", "productCode": "sku-b" }),
        )
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["item"]["skuCode"], "SKU-B");

    let response = fixture
        .post(
            "/api/v1/scan/packing",
            json!({ "trackingId": "T1", "productCode": "SKU-Z" }),
        )
        .await;
    assert_status!(response, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["kind"], "product_mismatch");

    // Blank codes behave like no code
    let response = fixture
        .post(
            "/api/v1/scan/packing",
            json!({ "trackingId": "T1", "productCode": "  " }),
        )
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["item"]["skuCode"], "SKU-A");
}

#[tokio::test]
async fn test_hold_blocks_scans_until_unhold() {
    let fixture = TestFixture::new();
    fixture.seed_default().await;

    fixture
        .post("/api/v1/scan/label", json!({ "trackingId": "T1" }))
        .await;

    let response = fixture
        .post(
            "/api/v1/scan/pending",
            json!({ "trackingId": "T1", "checkpointType": "packing", "reason": "damaged box" }),
        )
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["heldCount"], 2);
    assert_eq!(response.body["reason"], "damaged box");

    let response = fixture
        .post("/api/v1/scan/packing", json!({ "trackingId": "T1" }))
        .await;
    assert_status!(response, StatusCode::CONFLICT);
    assert_eq!(response.body["kind"], "on_hold");

    let response = fixture
        .post(
            "/api/v1/scan/pending",
            json!({ "trackingId": "T1", "checkpointType": "packing" }),
        )
        .await;
    assert_status!(response, StatusCode::CONFLICT);
    assert_eq!(response.body["kind"], "already_on_hold");

    let response = fixture
        .post(
            "/api/v1/scan/unhold",
            json!({ "trackingId": "T1", "checkpointType": "dispatch" }),
        )
        .await;
    assert_status!(response, StatusCode::CONFLICT);
    assert_eq!(response.body["kind"], "wrong_checkpoint");

    let response = fixture
        .post(
            "/api/v1/scan/unhold",
            json!({ "trackingId": "T1", "checkpointType": "packing" }),
        )
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["resumedCount"], 2);
    assert_eq!(response.body["nextStep"], "dispatch");

    let response = fixture.get("/api/v1/tracker/T1/count").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["packing"]["scanned"], 2);
}

#[tokio::test]
async fn test_unhold_without_hold_is_conflict() {
    let fixture = TestFixture::new();
    fixture.seed_default().await;

    let response = fixture
        .post(
            "/api/v1/scan/unhold",
            json!({ "trackingId": "T2", "checkpointType": "label" }),
        )
        .await;
    assert_status!(response, StatusCode::CONFLICT);
    assert_eq!(response.body["kind"], "not_on_hold");
}

#[tokio::test]
async fn test_unknown_checkpoint_is_bad_request() {
    let fixture = TestFixture::new();
    fixture.seed_default().await;

    let response = fixture
        .post(
            "/api/v1/scan/pending",
            json!({ "trackingId": "T2", "checkpointType": "shipping" }),
        )
        .await;
    assert_status!(response, StatusCode::BAD_REQUEST);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("unknown checkpoint"));
}

#[tokio::test]
async fn test_cancel_is_terminal() {
    let fixture = TestFixture::new();
    fixture.seed_default().await;

    let response = fixture
        .post("/api/v1/scan/cancelled", json!({ "trackingId": "T1" }))
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["cancelledCount"], 2);

    let response = fixture
        .post("/api/v1/scan/label", json!({ "trackingId": "T1" }))
        .await;
    assert_status!(response, StatusCode::CONFLICT);
    assert_eq!(response.body["kind"], "already_cancelled");

    let response = fixture
        .post("/api/v1/scan/cancelled", json!({ "trackingId": "T1" }))
        .await;
    assert_status!(response, StatusCode::CONFLICT);
    assert_eq!(response.body["kind"], "already_cancelled");
    assert_eq!(response.body["idempotent"], true);
}

#[tokio::test]
async fn test_event_history_is_filterable() {
    let fixture = TestFixture::new();
    fixture.seed_default().await;

    fixture
        .post("/api/v1/scan/label", json!({ "trackingId": "T1" }))
        .await;
    fixture
        .post("/api/v1/scan/label", json!({ "trackingId": "T2" }))
        .await;
    fixture
        .post(
            "/api/v1/scan/pending",
            json!({ "trackingId": "T1", "checkpointType": "packing", "reason": "audit" }),
        )
        .await;

    let response = fixture.get("/api/v1/scan/events?trackingId=T1").await;
    assert_status!(response, StatusCode::OK);
    let events = response.body["events"].as_array().unwrap();
    assert_eq!(events.len(), 4);
    assert!(events.iter().all(|e| e["trackingId"] == "T1"));

    let response = fixture
        .get("/api/v1/scan/events?trackingId=T1&type=pending")
        .await;
    let events = response.body["events"].as_array().unwrap();
    assert_eq!(events.len(), 2);
    assert!(events.iter().all(|e| e["outcome"] == "held"));
    assert!(events.iter().all(|e| e["reason"] == "audit"));

    let response = fixture.get("/api/v1/scan/events?limit=1").await;
    assert_eq!(response.body["events"].as_array().unwrap().len(), 1);
    assert_eq!(response.body["limit"], 1);

    let response = fixture.get("/api/v1/scan/events?type=shipping").await;
    assert_status!(response, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_packing_details_preview_is_read_only() {
    let fixture = TestFixture::new();
    fixture.seed_default().await;
    fixture
        .post("/api/v1/scan/label", json!({ "trackingId": "T1" }))
        .await;

    let first = fixture.get("/api/v1/tracker/t1/packing-details").await;
    assert_status!(first, StatusCode::OK);
    assert_eq!(first.body["nextItem"]["channelId"], "1");
    assert_eq!(first.body["nextItem"]["skuCode"], "SKU-A");
    assert_eq!(first.body["isMultiSku"], true);
    assert_eq!(first.body["remaining"], 2);
    let items = first.body["items"].as_array().unwrap();
    assert_eq!(items[0]["skuCode"], "SKU-A");
    assert_eq!(items[1]["skuCode"], "SKU-B");
    assert!(items.iter().all(|item| item["packed"] == false));

    let second = fixture.get("/api/v1/tracker/T1/packing-details").await;
    assert_status!(second, StatusCode::OK);
    assert_eq!(second.body["nextItem"], first.body["nextItem"]);

    let count = fixture.get("/api/v1/tracker/T1/count").await;
    assert_eq!(count.body["packing"]["scanned"], 0);

    let scanned = fixture
        .post("/api/v1/scan/packing", json!({ "trackingId": "T1" }))
        .await;
    assert_eq!(scanned.body["item"]["id"], first.body["nextItem"]["trackerId"]);

    let response = fixture
        .get("/api/v1/tracker/T1/packing-details?productCode=sku-z")
        .await;
    assert_status!(response, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_hold_on_completed_checkpoint_is_conflict() {
    let fixture = TestFixture::new();
    fixture.seed_default().await;
    fixture
        .post("/api/v1/scan/label", json!({ "trackingId": "T2" }))
        .await;

    let response = fixture
        .post(
            "/api/v1/scan/pending",
            json!({ "trackingId": "T2", "checkpointType": "label" }),
        )
        .await;
    assert_status!(response, StatusCode::CONFLICT);
    assert_eq!(response.body["kind"], "prerequisite_not_met");
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("checkpoint already done"));
}
