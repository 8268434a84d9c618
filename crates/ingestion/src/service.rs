//! Ingestion service: accept, enrich, buffer, and periodically persist.

use crate::batch::IngestionBuffer;
use crate::config::{FlushFailurePolicy, IngestionConfig};
use analytics::MetricsCache;
use analytics_core::Event;
use enrichment::GeoEnricher;
use event_store::EventStore;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use telemetry::{health, metrics};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Result of one flush attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Another flush was already running
    Skipped,
    /// Nothing buffered
    Empty,
    Persisted(usize),
    /// Store failed; batch discarded
    Dropped(usize),
    /// Store failed; batch put back for the next tick
    Requeued(usize),
}

/// Holds the flushing flag for the duration of one flush, released on drop
/// so a panicking or cancelled write cannot wedge the timer.
struct FlushGuard<'a>(&'a AtomicBool);

impl<'a> FlushGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns the pending-event buffer and its flush lifecycle.
///
/// Constructed once at startup. [`start`](Self::start) spawns the flush
/// timer; [`shutdown`](Self::shutdown) stops it and flushes what is left.
pub struct IngestionService {
    buffer: IngestionBuffer,
    store: Arc<dyn EventStore>,
    enricher: Arc<GeoEnricher>,
    cache: Arc<MetricsCache>,
    config: IngestionConfig,
    flushing: AtomicBool,
    shutdown_tx: watch::Sender<bool>,
    flush_task: Mutex<Option<JoinHandle<()>>>,
}

impl IngestionService {
    pub fn new(
        store: Arc<dyn EventStore>,
        enricher: Arc<GeoEnricher>,
        cache: Arc<MetricsCache>,
        config: IngestionConfig,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);

        Self {
            buffer: IngestionBuffer::new(),
            store,
            enricher,
            cache,
            config,
            flushing: AtomicBool::new(false),
            shutdown_tx,
            flush_task: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &IngestionConfig {
        &self.config
    }

    /// Events waiting for the next flush.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Enrich a freshly received event and enqueue it.
    ///
    /// Enrichment is bounded by the enricher's timeout and never fails, so
    /// this only waits on the geolocation lookup, never on storage.
    pub async fn ingest(&self, mut event: Event) {
        let start = Instant::now();

        self.enricher.enrich(&mut event).await;
        self.enqueue(event);

        metrics().ingest_latency_ms.observe_since(start);
    }

    /// Append to the buffer and invalidate cached dashboard payloads.
    pub fn enqueue(&self, event: Event) {
        debug!(event_id = %event.id, event_type = %event.event_type, "Enqueued event");

        let depth = self.buffer.push(event);
        metrics().events_enqueued.inc();
        metrics().buffer_depth.set(depth as u64);

        self.cache.invalidate_all();
    }

    /// Drain the buffer and write it as one batch.
    pub async fn flush(&self) -> FlushOutcome {
        let Some(_guard) = FlushGuard::acquire(&self.flushing) else {
            metrics().flushes_skipped.inc();
            debug!("Flush already in progress, skipping");
            return FlushOutcome::Skipped;
        };

        let batch = self.buffer.take();
        metrics().buffer_depth.set(self.buffer.len() as u64);

        if batch.is_empty() {
            return FlushOutcome::Empty;
        }

        let count = batch.len();
        let start = Instant::now();
        metrics().flushes.inc();

        let outcome = match self.store.insert_batch(&batch).await {
            Ok(written) => {
                metrics().events_persisted.inc_by(written as u64);
                health().store.set_healthy();
                // Dashboards computed while these were buffered did not see them
                self.cache.invalidate_all();

                debug!(
                    count = written,
                    latency_ms = %start.elapsed().as_millis(),
                    "Flushed events"
                );
                FlushOutcome::Persisted(written)
            }
            Err(e) => {
                metrics().flush_errors.inc();
                health().store.set_unhealthy(e.to_string());

                match self.config.failure_policy {
                    FlushFailurePolicy::Discard => {
                        metrics().events_dropped.inc_by(count as u64);
                        error!(count, error = %e, "Batch write failed, dropping batch");
                        FlushOutcome::Dropped(count)
                    }
                    FlushFailurePolicy::Requeue => {
                        self.buffer.requeue(batch);
                        metrics().events_requeued.inc_by(count as u64);
                        metrics().buffer_depth.set(self.buffer.len() as u64);
                        warn!(count, error = %e, "Batch write failed, requeued for next flush");
                        FlushOutcome::Requeued(count)
                    }
                }
            }
        };

        metrics().flush_latency_ms.observe_since(start);
        outcome
    }

    /// Spawn the flush timer. Calling twice is a no-op.
    pub fn start(self: &Arc<Self>) {
        let mut task = self.flush_task.lock();
        if task.is_some() {
            return;
        }

        let service = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        let period = self.config.flush_interval();

        *task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // First tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        service.flush().await;
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }

            debug!("Flush timer stopped");
        }));

        info!(interval_ms = period.as_millis() as u64, policy = ?self.config.failure_policy, "Ingestion flush timer started");
    }

    /// Stop the timer and flush outstanding events.
    pub async fn shutdown(&self) -> FlushOutcome {
        let _ = self.shutdown_tx.send(true);

        let task = self.flush_task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                error!(error = %e, "Flush timer task failed");
            }
        }

        let outcome = self.flush().await;
        match outcome {
            FlushOutcome::Persisted(n) => info!(count = n, "Final flush persisted outstanding events"),
            FlushOutcome::Empty => info!("No outstanding events at shutdown"),
            FlushOutcome::Requeued(n) | FlushOutcome::Dropped(n) => {
                error!(count = n, "Final flush failed, events lost")
            }
            FlushOutcome::Skipped => warn!("Final flush skipped, a flush was still running"),
        }
        outcome
    }
}
