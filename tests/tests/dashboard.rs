//! Dashboard endpoint tests: metrics, real-time, and raw-event listings.
//!
//! `CountingStore::reads()` tells a cache hit (no store access) from a
//! recomputation.

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use integration_tests::{fixtures, setup::TestContext};
use serde_json::Value;

#[tokio::test]
async fn test_metrics_served_from_cache_within_ttl() {
    let ctx = TestContext::new();
    ctx.store
        .seed(&fixtures::stored_page_views(5, Utc::now()))
        .await;

    let first = ctx.server.get("/api/analytics/metrics").await;
    first.assert_status_ok();
    let reads = ctx.store.reads();
    assert!(reads > 0);

    let second = ctx.server.get("/api/analytics/metrics").await;
    second.assert_status_ok();

    assert_eq!(ctx.store.reads(), reads, "second request should not touch the store");
    assert_eq!(first.json::<Value>(), second.json::<Value>());
}

#[tokio::test]
async fn test_metrics_use_grouped_reads_not_raw_rows() {
    let ctx = TestContext::new();
    ctx.store
        .seed(&fixtures::stored_page_views(40, Utc::now()))
        .await;

    let body: Value = ctx.server.get("/api/analytics/metrics").await.json();

    assert_eq!(body["totalPageViews"], 40);
    assert!(ctx.store.reads() > 0);
    assert_eq!(ctx.store.fetches(), 0, "metrics must not fetch raw event rows");
}

#[tokio::test]
async fn test_distinct_filters_are_cached_separately() {
    let ctx = TestContext::new();
    ctx.store
        .seed(&fixtures::stored_page_views(3, Utc::now()))
        .await;

    ctx.server.get("/api/analytics/metrics").await.assert_status_ok();
    let after_unfiltered = ctx.store.reads();

    ctx.server
        .get("/api/analytics/metrics")
        .add_query_param("page", "/about")
        .await
        .assert_status_ok();
    let after_filtered = ctx.store.reads();
    assert!(after_filtered > after_unfiltered);

    // Same filter again is a hit
    ctx.server
        .get("/api/analytics/metrics")
        .add_query_param("page", "/about")
        .await
        .assert_status_ok();
    assert_eq!(ctx.store.reads(), after_filtered);
}

#[tokio::test]
async fn test_ingest_invalidates_cached_metrics() {
    let ctx = TestContext::new();

    let before: Value = ctx.server.get("/api/analytics/metrics").await.json();
    assert_eq!(before["totalEvents"], 0);
    let reads = ctx.store.reads();

    ctx.post_event(&fixtures::page_view("/", "session-a"))
        .await
        .assert_status_ok();

    // Invalidated on enqueue: recomputed, event still buffered
    let buffered: Value = ctx.server.get("/api/analytics/metrics").await.json();
    assert!(ctx.store.reads() > reads);
    assert_eq!(buffered["totalEvents"], 0);

    // Invalidated again after the flush lands
    ctx.flush().await;
    let persisted: Value = ctx.server.get("/api/analytics/metrics").await.json();
    assert_eq!(persisted["totalEvents"], 1);
    assert_eq!(persisted["totalPageViews"], 1);
}

#[tokio::test]
async fn test_metrics_payload() {
    let ctx = TestContext::new();

    let bodies = [
        fixtures::page_view("/", "a"),
        fixtures::page_view("/", "b"),
        fixtures::page_view("/projects", "a"),
        fixtures::button_click("/", "b", "Resume"),
        fixtures::contact_form("c", true),
        fixtures::contact_form("d", false),
    ];
    for body in &bodies {
        ctx.post_event(body).await.assert_status_ok();
    }
    ctx.flush().await;

    let m: Value = ctx.server.get("/api/analytics/metrics").await.json();

    assert_eq!(m["totalEvents"], 6);
    assert_eq!(m["totalPageViews"], 3);
    assert_eq!(m["uniqueVisitors"], 4);

    assert_eq!(m["topPages"][0]["page"], "/");
    assert_eq!(m["topPages"][0]["views"], 2);
    assert_eq!(m["topPages"][1]["page"], "/projects");

    assert_eq!(m["topReferrers"][0]["referrer"], "https://news.ycombinator.com/");
    assert_eq!(m["topReferrers"][0]["visits"], 3);

    assert_eq!(m["deviceTypes"][0]["device"], "Desktop");
    assert_eq!(m["deviceTypes"][0]["count"], 6);

    // Only page views were geolocated
    assert_eq!(m["topCountries"][0]["country"], "Portugal");
    assert_eq!(m["topCountries"][0]["visits"], 3);
    assert_eq!(m["topCountries"][0]["percentage"], 100.0);
    assert_eq!(m["topCities"][0]["city"], "Lisbon");

    assert_eq!(m["contactFormStats"]["submissions"], 2);
    assert_eq!(m["contactFormStats"]["successful"], 1);
    assert_eq!(m["contactFormStats"]["successRate"], 50.0);

    let daily = m["dailyActivity"].as_array().unwrap();
    assert_eq!(daily.len(), 1);
    assert_eq!(daily[0]["date"], Utc::now().format("%Y-%m-%d").to_string());
    assert_eq!(daily[0]["pageViews"], 3);
    assert_eq!(daily[0]["visitors"], 4);

    let hourly: u64 = m["hourlyActivity"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["count"].as_u64().unwrap())
        .sum();
    assert_eq!(hourly, 6);

    assert_eq!(m["eventTypes"][0]["eventType"], "page_view");
    assert_eq!(m["eventTypes"][0]["count"], 3);
}

#[tokio::test]
async fn test_metrics_respect_filters() {
    let ctx = TestContext::new();
    let now = Utc::now();

    let mut old = fixtures::stored_page_view("/", "old", now - Duration::days(3));
    old.referrer = Some("https://github.com/".into());
    ctx.store
        .seed(&[
            old,
            fixtures::stored_page_view("/", "a", now),
            fixtures::stored_page_view("/blog", "b", now),
        ])
        .await;

    let since = (now - Duration::hours(1)).to_rfc3339();
    let m: Value = ctx
        .server
        .get("/api/analytics/metrics")
        .add_query_param("startDate", &since)
        .await
        .json();
    assert_eq!(m["totalEvents"], 2);

    let m: Value = ctx
        .server
        .get("/api/analytics/metrics")
        .add_query_param("page", "/blog")
        .await
        .json();
    assert_eq!(m["totalEvents"], 1);
    assert_eq!(m["topPages"][0]["page"], "/blog");
}

#[tokio::test]
async fn test_invalid_filters_rejected() {
    let ctx = TestContext::new();

    for (key, value) in [("startDate", "yesterday"), ("eventType", "hover")] {
        let response = ctx
            .server
            .get("/api/analytics/metrics")
            .add_query_param(key, value)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["code"], "VALID_003");
    }
}

#[tokio::test]
async fn test_realtime_window() {
    let ctx = TestContext::new();
    let now = Utc::now();

    let stale = fixtures::stored_page_view("/old", "gone", now - Duration::minutes(6));
    let recent = fixtures::stored_page_view("/", "a", now - Duration::minutes(1));
    let newest = fixtures::stored_page_view("/projects", "b", now - Duration::seconds(10));
    ctx.store
        .seed(&[stale.clone(), recent.clone(), newest.clone()])
        .await;

    let response = ctx.server.get("/api/analytics/realtime").await;
    response.assert_status_ok();
    let rt: Value = response.json();

    assert_eq!(rt["activeUsers"], 2);
    assert_eq!(rt["windowSeconds"], 300);

    let recent_ids: Vec<&str> = rt["recentEvents"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_str().unwrap())
        .collect();
    assert_eq!(recent_ids, vec![newest.id.to_string(), recent.id.to_string()]);

    let pages: Vec<&str> = rt["activePages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["page"].as_str().unwrap())
        .collect();
    assert!(!pages.contains(&"/old"));
}

#[tokio::test]
async fn test_events_second_page() {
    let ctx = TestContext::new();
    let events = fixtures::stored_page_views(25, Utc::now() - Duration::minutes(1));
    ctx.store.seed(&events).await;

    let response = ctx
        .server
        .get("/api/analytics/events")
        .add_query_param("page", "2")
        .add_query_param("limit", "10")
        .await;
    response.assert_status_ok();
    let list: Value = response.json();

    assert_eq!(list["total"], 25);
    assert_eq!(list["totalPages"], 3);
    assert_eq!(list["page"], 2);
    assert_eq!(list["limit"], 10);

    // Newest first: ranks 11..=20 by recency
    let ids: Vec<String> = list["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_str().unwrap().to_string())
        .collect();
    let expected: Vec<String> = (5..15).rev().map(|i| events[i].id.to_string()).collect();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn test_events_defaults_and_filters() {
    let ctx = TestContext::new();
    let now = Utc::now();
    ctx.store
        .seed(&[
            fixtures::stored_page_view("/", "a", now),
            fixtures::stored_page_view("/blog", "b", now),
            fixtures::stored_page_view("/blog", "c", now),
        ])
        .await;

    let list: Value = ctx.server.get("/api/analytics/events").await.json();
    assert_eq!(list["page"], 1);
    assert_eq!(list["limit"], 50);
    assert_eq!(list["total"], 3);
    assert_eq!(list["totalPages"], 1);

    let list: Value = ctx
        .server
        .get("/api/analytics/events")
        .add_query_param("pagePath", "/blog")
        .await
        .json();
    assert_eq!(list["total"], 2);
    assert!(list["events"]
        .as_array()
        .unwrap()
        .iter()
        .all(|e| e["page"] == "/blog"));

    let list: Value = ctx
        .server
        .get("/api/analytics/events")
        .add_query_param("eventType", "button_click")
        .await
        .json();
    assert_eq!(list["total"], 0);
    assert_eq!(list["totalPages"], 0);
    assert_eq!(list["events"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_events_invalid_pagination_rejected() {
    let ctx = TestContext::new();

    for (page, limit) in [("0", "10"), ("1", "0"), ("1", "101"), ("two", "10")] {
        let response = ctx
            .server
            .get("/api/analytics/events")
            .add_query_param("page", page)
            .add_query_param("limit", limit)
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["code"], "VALID_003", "page={} limit={}", page, limit);
    }
}
