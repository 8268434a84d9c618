//! TTL cache for dashboard payloads.
//!
//! Keys are prefixed with a generation number. Invalidation bumps the
//! generation and clears the maps, so a computation that started before an
//! invalidation lands under a key nobody reads anymore.

use crate::aggregate::MetricsPayload;
use crate::pagination::EventList;
use crate::realtime::RealtimePayload;
use analytics_core::{Error, Result};
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use telemetry::metrics;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Real-time payload and raw listings
    #[serde(default = "default_realtime_ttl_secs")]
    pub realtime_ttl_secs: u64,
    /// Aggregate metrics
    #[serde(default = "default_historical_ttl_secs")]
    pub historical_ttl_secs: u64,
    /// Per-band entry cap
    #[serde(default = "default_max_entries")]
    pub max_entries: u64,
}

fn default_realtime_ttl_secs() -> u64 {
    15
}

fn default_historical_ttl_secs() -> u64 {
    180
}

fn default_max_entries() -> u64 {
    1_000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            realtime_ttl_secs: default_realtime_ttl_secs(),
            historical_ttl_secs: default_historical_ttl_secs(),
            max_entries: default_max_entries(),
        }
    }
}

/// TTL class of a cached payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBand {
    Realtime,
    Historical,
}

impl CacheConfig {
    pub fn ttl(&self, band: CacheBand) -> Duration {
        match band {
            CacheBand::Realtime => Duration::from_secs(self.realtime_ttl_secs),
            CacheBand::Historical => Duration::from_secs(self.historical_ttl_secs),
        }
    }
}

/// Memoizes dashboard payloads by canonical filter key.
pub struct MetricsCache {
    generation: AtomicU64,
    metrics: Cache<String, Arc<MetricsPayload>>,
    realtime: Cache<String, Arc<RealtimePayload>>,
    events: Cache<String, Arc<EventList>>,
}

impl MetricsCache {
    pub fn new(config: &CacheConfig) -> Self {
        fn build<V: Send + Sync + 'static>(config: &CacheConfig, band: CacheBand) -> Cache<String, Arc<V>> {
            Cache::builder()
                .max_capacity(config.max_entries)
                .time_to_live(config.ttl(band))
                .build()
        }

        Self {
            generation: AtomicU64::new(0),
            metrics: build(config, CacheBand::Historical),
            realtime: build(config, CacheBand::Realtime),
            events: build(config, CacheBand::Realtime),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Drop every cached payload.
    pub fn invalidate_all(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.metrics.invalidate_all();
        self.realtime.invalidate_all();
        self.events.invalidate_all();
        metrics().cache_invalidations.inc();
    }

    pub async fn metrics<F>(&self, key: &str, compute: F) -> Result<Arc<MetricsPayload>>
    where
        F: Future<Output = Result<MetricsPayload>>,
    {
        self.get_or_compute(&self.metrics, key, compute).await
    }

    pub async fn realtime<F>(&self, key: &str, compute: F) -> Result<Arc<RealtimePayload>>
    where
        F: Future<Output = Result<RealtimePayload>>,
    {
        self.get_or_compute(&self.realtime, key, compute).await
    }

    pub async fn events<F>(&self, key: &str, compute: F) -> Result<Arc<EventList>>
    where
        F: Future<Output = Result<EventList>>,
    {
        self.get_or_compute(&self.events, key, compute).await
    }

    /// Concurrent misses on one key share a single computation. A failed
    /// computation is not stored.
    async fn get_or_compute<V, F>(&self, cache: &Cache<String, Arc<V>>, key: &str, compute: F) -> Result<Arc<V>>
    where
        V: Send + Sync + 'static,
        F: Future<Output = Result<V>>,
    {
        let key = format!("{}#{}", self.generation(), key);
        let computed = AtomicBool::new(false);

        let result = cache
            .try_get_with(key.clone(), async {
                computed.store(true, Ordering::Relaxed);
                compute.await.map(Arc::new)
            })
            .await;

        if computed.load(Ordering::Relaxed) {
            metrics().cache_misses.inc();
            debug!(key = %key, "Cache miss");
        } else {
            metrics().cache_hits.inc();
        }

        result.map_err(|e| Arc::try_unwrap(e).unwrap_or_else(|shared| Error::query(shared.to_string())))
    }
}
