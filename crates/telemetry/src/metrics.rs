//! In-process metrics.
//!
//! Lock-free atomics only; recording must never block a request path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Monotonic counter.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Point-in-time value (buffer depth and similar).
#[derive(Debug, Default)]
pub struct Gauge(AtomicU64);

impl Gauge {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn set(&self, val: u64) {
        self.0.store(val, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }
}

/// Latency histogram with fixed millisecond buckets.
#[derive(Debug)]
pub struct Histogram {
    /// Buckets: 1ms, 5ms, 10ms, 25ms, 50ms, 100ms, 250ms, 500ms, 1s, 5s, +Inf
    buckets: [AtomicU64; 11],
    sum: AtomicU64,
    count: AtomicU64,
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

impl Histogram {
    const BUCKET_BOUNDS: [u64; 10] = [1, 5, 10, 25, 50, 100, 250, 500, 1000, 5000];

    pub fn new() -> Self {
        Self {
            buckets: Default::default(),
            sum: AtomicU64::new(0),
            count: AtomicU64::new(0),
        }
    }

    /// Records a value in milliseconds.
    pub fn observe(&self, ms: u64) {
        self.sum.fetch_add(ms, Ordering::Relaxed);
        self.count.fetch_add(1, Ordering::Relaxed);

        let idx = Self::BUCKET_BOUNDS
            .iter()
            .position(|&bound| ms <= bound)
            .unwrap_or(Self::BUCKET_BOUNDS.len());
        self.buckets[idx].fetch_add(1, Ordering::Relaxed);
    }

    /// Records the time elapsed since `start`.
    pub fn observe_since(&self, start: Instant) {
        self.observe(start.elapsed().as_millis() as u64);
    }

    pub fn count(&self) -> u64 {
        self.count.load(Ordering::Relaxed)
    }

    pub fn sum(&self) -> u64 {
        self.sum.load(Ordering::Relaxed)
    }

    pub fn mean(&self) -> f64 {
        let count = self.count();
        if count == 0 {
            0.0
        } else {
            self.sum() as f64 / count as f64
        }
    }

    /// Bucket counts keyed by upper bound; `None` is the overflow bucket.
    pub fn buckets(&self) -> Vec<(Option<u64>, u64)> {
        Self::BUCKET_BOUNDS
            .iter()
            .map(|&b| Some(b))
            .chain(std::iter::once(None))
            .zip(self.buckets.iter())
            .map(|(bound, count)| (bound, count.load(Ordering::Relaxed)))
            .collect()
    }
}

/// Process-wide metrics.
#[derive(Debug, Default)]
pub struct Metrics {
    // Ingestion
    pub events_received: Counter,
    pub events_rejected: Counter,
    pub events_enqueued: Counter,

    // Flush
    pub flushes: Counter,
    pub flushes_skipped: Counter,
    pub flush_errors: Counter,
    pub events_persisted: Counter,
    pub events_dropped: Counter,
    pub events_requeued: Counter,

    // Geo enrichment
    pub geo_lookups: Counter,
    pub geo_cache_hits: Counter,
    pub geo_failures: Counter,
    pub geo_skipped: Counter,

    // Metrics cache
    pub cache_hits: Counter,
    pub cache_misses: Counter,
    pub cache_invalidations: Counter,

    // Latency
    pub ingest_latency_ms: Histogram,
    pub flush_latency_ms: Histogram,
    pub geo_latency_ms: Histogram,
    pub aggregate_latency_ms: Histogram,

    pub buffer_depth: Gauge,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Serializable view of [`Metrics`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub events_received: u64,
    pub events_rejected: u64,
    pub events_enqueued: u64,
    pub flushes: u64,
    pub flushes_skipped: u64,
    pub flush_errors: u64,
    pub events_persisted: u64,
    pub events_dropped: u64,
    pub events_requeued: u64,
    pub geo_lookups: u64,
    pub geo_cache_hits: u64,
    pub geo_failures: u64,
    pub geo_skipped: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub cache_invalidations: u64,
    pub ingest_latency_mean_ms: f64,
    pub flush_latency_mean_ms: f64,
    pub geo_latency_mean_ms: f64,
    pub aggregate_latency_mean_ms: f64,
    pub buffer_depth: u64,
}

impl Metrics {
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            events_received: self.events_received.get(),
            events_rejected: self.events_rejected.get(),
            events_enqueued: self.events_enqueued.get(),
            flushes: self.flushes.get(),
            flushes_skipped: self.flushes_skipped.get(),
            flush_errors: self.flush_errors.get(),
            events_persisted: self.events_persisted.get(),
            events_dropped: self.events_dropped.get(),
            events_requeued: self.events_requeued.get(),
            geo_lookups: self.geo_lookups.get(),
            geo_cache_hits: self.geo_cache_hits.get(),
            geo_failures: self.geo_failures.get(),
            geo_skipped: self.geo_skipped.get(),
            cache_hits: self.cache_hits.get(),
            cache_misses: self.cache_misses.get(),
            cache_invalidations: self.cache_invalidations.get(),
            ingest_latency_mean_ms: self.ingest_latency_ms.mean(),
            flush_latency_mean_ms: self.flush_latency_ms.mean(),
            geo_latency_mean_ms: self.geo_latency_ms.mean(),
            aggregate_latency_mean_ms: self.aggregate_latency_ms.mean(),
            buffer_depth: self.buffer_depth.get(),
        }
    }
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
