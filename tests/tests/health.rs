//! Health check endpoint tests.
//!
//! Health state is process-wide, so transitions are exercised inside a
//! single test.

use axum::http::StatusCode;
use integration_tests::{fixtures, mocks::FailingStore, setup::TestContext};
use serde_json::Value;
use std::sync::Arc;

#[tokio::test]
async fn test_health_endpoint_structure() {
    let ctx = TestContext::new();

    ctx.post_event(&fixtures::button_click("/", "session-a", "Hire me"))
        .await
        .assert_status_ok();

    let response = ctx.server.get("/health").await;
    response.assert_status_ok();

    let body: Value = response.json();
    for field in ["status", "storeConnected", "geoAvailable", "bufferDepth", "components", "telemetry"] {
        assert!(body.get(field).is_some(), "Response should have '{}' field", field);
    }
    assert_eq!(body["bufferDepth"], 1);
    assert!(body["telemetry"]["eventsReceived"].as_u64().unwrap() >= 1);

    let names: Vec<&str> = body["components"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert!(names.contains(&"store"));
    assert!(names.contains(&"geo"));
}

#[tokio::test]
async fn test_liveness() {
    let ctx = TestContext::new();
    ctx.server.get("/health/live").await.assert_status_ok();
}

#[tokio::test]
async fn test_readiness_follows_store() {
    let failing = Arc::new(FailingStore::new());
    let ctx = TestContext::with_store(failing.clone());

    failing.set_fail_reads(true);
    assert!(!event_store::probe(failing.as_ref()).await);
    ctx.server
        .get("/health/ready")
        .await
        .assert_status(StatusCode::SERVICE_UNAVAILABLE);

    let body: Value = ctx.server.get("/health").await.json();
    assert_eq!(body["status"], "unhealthy");
    assert_eq!(body["storeConnected"], false);

    failing.set_fail_reads(false);
    assert!(event_store::probe(failing.as_ref()).await);
    ctx.server.get("/health/ready").await.assert_status_ok();
}
