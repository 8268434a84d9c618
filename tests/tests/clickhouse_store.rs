//! ClickHouse store round trip.
//!
//! Requires Docker (or `ANALYTICS_TEST_CLICKHOUSE_URL`). Run with
//! `cargo test -p integration-tests --test clickhouse_store -- --ignored`.

use analytics_core::{EventFilters, EventType};
use chrono::{Duration, DurationRound, Utc};
use event_store::{query::truncate_events, ClickHouseClient, EventStore, MemoryStore, StoreBackend, StoreConfig};
use integration_tests::{containers::TestClickHouse, fixtures};

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_clickhouse_round_trip() {
    let clickhouse = TestClickHouse::start().await;
    let config = StoreConfig {
        backend: StoreBackend::ClickHouse,
        clickhouse: clickhouse.config.clone(),
    };

    let store = event_store::connect(&config)
        .await
        .expect("Failed to connect to ClickHouse");
    truncate_events(&ClickHouseClient::new(clickhouse.config.clone()))
        .await
        .expect("Failed to truncate events");

    // DateTime64(3) keeps milliseconds
    let end = Utc::now()
        .duration_trunc(Duration::milliseconds(1))
        .expect("truncate timestamp");
    let mut events = fixtures::stored_page_views(3, end);
    events[1].page = Some("/projects".into());
    events[1].location = fixtures::lisbon();
    events[1].user_agent = Some(fixtures::USER_AGENT.into());

    assert_eq!(store.insert_batch(&events).await.unwrap(), 3);

    let fetched = store.fetch(&EventFilters::new()).await.unwrap();
    assert_eq!(fetched, events, "fetch returns oldest first with all fields intact");

    let page = store.list(&EventFilters::new(), 1, 1).await.unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.events.len(), 1);
    assert_eq!(page.events[0].id, events[1].id);

    let filtered = store
        .list(&EventFilters::new().with_page("/projects"), 0, 10)
        .await
        .unwrap();
    assert_eq!(filtered.total, 1);

    let none = store
        .list(&EventFilters::new().with_event_type(EventType::ButtonClick), 0, 10)
        .await
        .unwrap();
    assert_eq!(none.total, 0);
    assert!(none.events.is_empty());

    // Grouped reads agree with the in-process grouping
    let memory = MemoryStore::new();
    memory.insert_batch(&events).await.unwrap();
    let filters = EventFilters::new();
    assert_eq!(
        store.rollup(&filters, 10).await.unwrap(),
        memory.rollup(&filters, 10).await.unwrap()
    );
    assert_eq!(
        store.daily(&filters).await.unwrap(),
        memory.daily(&filters).await.unwrap()
    );
}
