//! Event persistence.
//!
//! The ingestion flush writes batches through [`EventStore`]; the metrics,
//! real-time, and listing endpoints read back through it.

pub mod client;
pub mod config;
pub mod health;
pub mod insert;
pub mod memory;
pub mod query;
pub mod rollup;
pub mod schema;
pub mod tally;

pub use client::*;
pub use config::*;
pub use memory::MemoryStore;
pub use rollup::{DailyRollup, Rollup};

use analytics_core::{Event, EventFilters, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// One page of a listing plus the filtered total it was cut from.
#[derive(Debug, Clone, Default)]
pub struct EventPage {
    pub total: u64,
    pub events: Vec<Event>,
}

/// Append-only event log.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Persist a batch. All-or-nothing from the caller's point of view.
    async fn insert_batch(&self, events: &[Event]) -> Result<usize>;

    /// All events matching `filters`, oldest first. Meant for short ranges
    /// such as the real-time window.
    async fn fetch(&self, filters: &EventFilters) -> Result<Vec<Event>>;

    /// Grouped counts over events matching `filters`, with ranked lists cut
    /// to `top_n`.
    async fn rollup(&self, filters: &EventFilters, top_n: usize) -> Result<Rollup>;

    /// Page views and distinct visitors per UTC day, oldest day first.
    async fn daily(&self, filters: &EventFilters) -> Result<Vec<DailyRollup>>;

    /// Newest-first slice of matching events with the total count, both
    /// taken from the same snapshot.
    async fn list(&self, filters: &EventFilters, offset: usize, limit: usize) -> Result<EventPage>;

    /// Connectivity check for readiness probes.
    async fn ping(&self) -> Result<()>;
}

/// ClickHouse-backed store.
#[derive(Clone)]
pub struct ClickHouseStore {
    client: ClickHouseClient,
}

impl ClickHouseStore {
    pub fn new(client: ClickHouseClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ClickHouseClient {
        &self.client
    }
}

#[async_trait]
impl EventStore for ClickHouseStore {
    async fn insert_batch(&self, events: &[Event]) -> Result<usize> {
        insert::insert_events(&self.client, events).await
    }

    async fn fetch(&self, filters: &EventFilters) -> Result<Vec<Event>> {
        query::fetch_events(&self.client, filters).await
    }

    async fn rollup(&self, filters: &EventFilters, top_n: usize) -> Result<Rollup> {
        query::rollup(&self.client, filters, top_n).await
    }

    async fn daily(&self, filters: &EventFilters) -> Result<Vec<DailyRollup>> {
        query::daily(&self.client, filters).await
    }

    async fn list(&self, filters: &EventFilters, offset: usize, limit: usize) -> Result<EventPage> {
        let (total, events) = query::list_events(&self.client, filters, offset, limit).await?;
        Ok(EventPage { total, events })
    }

    async fn ping(&self) -> Result<()> {
        health::check_connection(&self.client).await
    }
}

/// Build the configured backend, bootstrapping the ClickHouse schema when
/// enabled.
pub async fn connect(config: &StoreConfig) -> Result<Arc<dyn EventStore>> {
    match config.backend {
        StoreBackend::Memory => {
            info!("Using in-memory event store");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::ClickHouse => {
            let client = ClickHouseClient::new(config.clickhouse.clone());
            if config.clickhouse.init_schema {
                health::init_schema(&client).await?;
            }
            let store = ClickHouseStore::new(client);
            store.ping().await?;
            Ok(Arc::new(store))
        }
    }
}

/// Ping the store and record the result in the health registry.
pub async fn probe(store: &dyn EventStore) -> bool {
    match store.ping().await {
        Ok(()) => {
            telemetry::health().store.set_healthy();
            true
        }
        Err(e) => {
            telemetry::health().store.set_unhealthy(e.to_string());
            false
        }
    }
}
