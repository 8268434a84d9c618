//! Common test setup functions.

use analytics::{AggregationConfig, CacheConfig, Dashboard, MetricsCache, RealtimeConfig};
use api::{router, AppState};
use axum_test::TestServer;
use enrichment::{GeoConfig, GeoEnricher, GeoLookup};
use event_store::EventStore;
use ingestion::{IngestionConfig, IngestionService};
use std::sync::Arc;

use crate::mocks::{CountingStore, StaticGeoLookup};

/// Test context wired exactly like the binary, minus the flush timer.
///
/// - The real axum router with all layers
/// - A mock store implementing `EventStore`
/// - `StaticGeoLookup` instead of the HTTP provider
///
/// Tests drive flushes explicitly through `flush()`, so nothing depends on
/// wall-clock timing.
pub struct TestContext<S = CountingStore> {
    pub store: Arc<S>,
    pub geo: Arc<StaticGeoLookup>,
    pub cache: Arc<MetricsCache>,
    pub ingestion: Arc<IngestionService>,
    pub server: TestServer,
}

impl TestContext {
    /// Context backed by a fresh [`CountingStore`].
    pub fn new() -> Self {
        Self::with_store(Arc::new(CountingStore::new()))
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: EventStore + 'static> TestContext<S> {
    pub fn with_store(store: Arc<S>) -> Self {
        Self::with_config(store, IngestionConfig::default())
    }

    pub fn with_config(store: Arc<S>, config: IngestionConfig) -> Self {
        let geo = Arc::new(StaticGeoLookup::default());
        let dyn_store: Arc<dyn EventStore> = store.clone();

        let enricher = Arc::new(GeoEnricher::new(
            geo.clone() as Arc<dyn GeoLookup>,
            &GeoConfig::default(),
        ));
        let cache = Arc::new(MetricsCache::new(&CacheConfig::default()));

        let ingestion = Arc::new(IngestionService::new(
            dyn_store.clone(),
            enricher,
            cache.clone(),
            config,
        ));
        let dashboard = Dashboard::new(
            dyn_store,
            cache.clone(),
            AggregationConfig::default(),
            RealtimeConfig::default(),
        );

        let server = TestServer::new(router(AppState::new(ingestion.clone(), dashboard)))
            .expect("Failed to create test server");

        Self {
            store,
            geo,
            cache,
            ingestion,
            server,
        }
    }

    /// POST an event body as a browser behind a proxy would.
    pub async fn post_event(&self, body: &serde_json::Value) -> axum_test::TestResponse {
        self.server
            .post("/api/analytics/event")
            .add_header("x-forwarded-for", format!("{}, 10.0.0.1", crate::fixtures::CLIENT_IP))
            .add_header("user-agent", crate::fixtures::USER_AGENT)
            .json(body)
            .await
    }

    /// Flush the ingestion buffer now.
    pub async fn flush(&self) -> ingestion::FlushOutcome {
        self.ingestion.flush().await
    }
}
