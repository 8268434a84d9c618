//! Failure handling: store outages on the write and read paths.

use axum::http::StatusCode;
use chrono::Utc;
use ingestion::{FlushFailurePolicy, FlushOutcome, IngestionConfig};
use integration_tests::{fixtures, mocks::FailingStore, setup::TestContext};
use serde_json::Value;
use std::sync::Arc;

#[tokio::test]
async fn test_flush_failure_drops_batch_by_default() {
    let ctx = TestContext::with_store(Arc::new(FailingStore::new()));
    ctx.store.set_fail_writes(true);

    // Caller is acknowledged regardless of the storage outcome
    ctx.post_event(&fixtures::page_view("/", "session-a"))
        .await
        .assert_status_ok();

    assert_eq!(ctx.flush().await, FlushOutcome::Dropped(1));
    assert_eq!(ctx.ingestion.pending(), 0);

    ctx.store.set_fail_writes(false);
    assert_eq!(ctx.flush().await, FlushOutcome::Empty);
    assert!(ctx.store.events().is_empty());
}

#[tokio::test]
async fn test_flush_failure_requeues_when_configured() {
    let config = IngestionConfig {
        failure_policy: FlushFailurePolicy::Requeue,
        ..Default::default()
    };
    let ctx = TestContext::with_config(Arc::new(FailingStore::new()), config);
    ctx.store.set_fail_writes(true);

    for session in ["a", "b"] {
        ctx.post_event(&fixtures::page_view("/", session))
            .await
            .assert_status_ok();
    }

    assert_eq!(ctx.flush().await, FlushOutcome::Requeued(2));
    assert_eq!(ctx.ingestion.pending(), 2);

    // Arrived while the store was down; lands after the requeued batch
    ctx.post_event(&fixtures::page_view("/", "c"))
        .await
        .assert_status_ok();

    ctx.store.set_fail_writes(false);
    assert_eq!(ctx.flush().await, FlushOutcome::Persisted(3));

    let sessions: Vec<_> = ctx
        .store
        .events()
        .iter()
        .map(|e| e.session_id.clone().unwrap_or_default())
        .collect();
    assert_eq!(sessions, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_read_failure_is_generic_and_not_cached() {
    let ctx = TestContext::with_store(Arc::new(FailingStore::new()));
    ctx.store.set_fail_reads(true);

    for path in ["/api/analytics/metrics", "/api/analytics/realtime", "/api/analytics/events"] {
        let response = ctx.server.get(path).await;
        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);

        let body: Value = response.json();
        assert_eq!(body["code"], "STORE_001", "path: {}", path);
        assert_eq!(body["error"], "Internal server error");
        assert!(!body.to_string().contains("connection refused"));
    }

    // Next request retries from scratch instead of replaying the failure
    ctx.store.set_fail_reads(false);
    ctx.store
        .seed(&[fixtures::stored_page_view("/", "a", Utc::now())])
        .await;

    let body: Value = ctx.server.get("/api/analytics/metrics").await.json();
    assert_eq!(body["totalEvents"], 1);

    let body: Value = ctx.server.get("/api/analytics/realtime").await.json();
    assert_eq!(body["activeUsers"], 1);
}
