//! Mock collaborators for testing.

use analytics_core::{Error, Event, EventFilters, GeoLocation, Result, StoreErrorCode};
use async_trait::async_trait;
use enrichment::GeoLookup;
use event_store::{DailyRollup, EventPage, EventStore, MemoryStore, Rollup};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// In-memory store that counts every call.
///
/// Reads are what the dashboard cache is supposed to avoid, so tests compare
/// `reads()` before and after a request to tell a hit from a recomputation.
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    inserts: AtomicUsize,
    fetches: AtomicUsize,
    rollups: AtomicUsize,
    lists: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed events without touching the counters.
    pub async fn seed(&self, events: &[Event]) {
        self.inner
            .insert_batch(events)
            .await
            .expect("memory store insert cannot fail");
    }

    pub fn events(&self) -> Vec<Event> {
        self.inner.all()
    }

    pub fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    /// Raw-row `fetch` calls.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Every read: raw fetches, grouped rollups, and listings.
    pub fn reads(&self) -> usize {
        self.fetches() + self.rollups.load(Ordering::SeqCst) + self.lists.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventStore for CountingStore {
    async fn insert_batch(&self, events: &[Event]) -> Result<usize> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.inner.insert_batch(events).await
    }

    async fn fetch(&self, filters: &EventFilters) -> Result<Vec<Event>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch(filters).await
    }

    async fn rollup(&self, filters: &EventFilters, top_n: usize) -> Result<Rollup> {
        self.rollups.fetch_add(1, Ordering::SeqCst);
        self.inner.rollup(filters, top_n).await
    }

    async fn daily(&self, filters: &EventFilters) -> Result<Vec<DailyRollup>> {
        self.rollups.fetch_add(1, Ordering::SeqCst);
        self.inner.daily(filters).await
    }

    async fn list(&self, filters: &EventFilters, offset: usize, limit: usize) -> Result<EventPage> {
        self.lists.fetch_add(1, Ordering::SeqCst);
        self.inner.list(filters, offset, limit).await
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

/// Store whose reads and writes can be switched to fail.
#[derive(Default)]
pub struct FailingStore {
    inner: MemoryStore,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Seed events regardless of the failure switches.
    pub async fn seed(&self, events: &[Event]) {
        self.inner
            .insert_batch(events)
            .await
            .expect("memory store insert cannot fail");
    }

    pub fn events(&self) -> Vec<Event> {
        self.inner.all()
    }

    fn check(&self, flag: &AtomicBool, op: &str) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            return Err(Error::store(
                StoreErrorCode::Unavailable,
                format!("mock store {} failure: connection refused", op),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl EventStore for FailingStore {
    async fn insert_batch(&self, events: &[Event]) -> Result<usize> {
        self.check(&self.fail_writes, "write")?;
        self.inner.insert_batch(events).await
    }

    async fn fetch(&self, filters: &EventFilters) -> Result<Vec<Event>> {
        self.check(&self.fail_reads, "read")?;
        self.inner.fetch(filters).await
    }

    async fn rollup(&self, filters: &EventFilters, top_n: usize) -> Result<Rollup> {
        self.check(&self.fail_reads, "read")?;
        self.inner.rollup(filters, top_n).await
    }

    async fn daily(&self, filters: &EventFilters) -> Result<Vec<DailyRollup>> {
        self.check(&self.fail_reads, "read")?;
        self.inner.daily(filters).await
    }

    async fn list(&self, filters: &EventFilters, offset: usize, limit: usize) -> Result<EventPage> {
        self.check(&self.fail_reads, "read")?;
        self.inner.list(filters, offset, limit).await
    }

    async fn ping(&self) -> Result<()> {
        self.check(&self.fail_reads, "ping")
    }
}

/// Geolocation provider returning a fixed location and recording the IPs
/// it was asked about.
pub struct StaticGeoLookup {
    location: GeoLocation,
    requested: Mutex<Vec<String>>,
}

impl StaticGeoLookup {
    pub fn new(location: GeoLocation) -> Self {
        Self {
            location,
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().clone()
    }
}

impl Default for StaticGeoLookup {
    fn default() -> Self {
        Self::new(crate::fixtures::lisbon())
    }
}

#[async_trait]
impl GeoLookup for StaticGeoLookup {
    async fn lookup(&self, ip: &str) -> Result<GeoLocation> {
        self.requested.lock().push(ip.to_string());
        Ok(self.location.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_failing_store_toggles() {
        let store = FailingStore::new();
        let events = vec![crate::fixtures::stored_page_view("/", "s1", chrono::Utc::now())];

        store.set_fail_writes(true);
        assert!(store.insert_batch(&events).await.is_err());

        store.set_fail_writes(false);
        assert_eq!(store.insert_batch(&events).await.unwrap(), 1);

        store.set_fail_reads(true);
        assert!(store.fetch(&EventFilters::new()).await.is_err());
        assert!(store.ping().await.is_err());
    }

    #[tokio::test]
    async fn test_counting_store_counts_reads() {
        let store = CountingStore::new();
        store.fetch(&EventFilters::new()).await.unwrap();
        store.rollup(&EventFilters::new(), 10).await.unwrap();
        store.list(&EventFilters::new(), 0, 10).await.unwrap();
        assert_eq!(store.reads(), 3);
        assert_eq!(store.fetches(), 1);
        assert_eq!(store.inserts(), 0);
    }
}
