//! In-memory event store.

use crate::rollup::{daily_events, rollup_events};
use crate::{DailyRollup, EventPage, EventStore, Rollup};
use analytics_core::{Event, EventFilters, Result};
use async_trait::async_trait;
use parking_lot::RwLock;

/// Append-only event log held in process memory.
///
/// Reads take the lock once, so every result reflects a single snapshot.
#[derive(Debug, Default)]
pub struct MemoryStore {
    events: RwLock<Vec<Event>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every stored event in insertion order.
    pub fn all(&self) -> Vec<Event> {
        self.events.read().clone()
    }
}

#[async_trait]
impl EventStore for MemoryStore {
    async fn insert_batch(&self, events: &[Event]) -> Result<usize> {
        self.events.write().extend_from_slice(events);
        Ok(events.len())
    }

    async fn fetch(&self, filters: &EventFilters) -> Result<Vec<Event>> {
        Ok(oldest_first(&self.events.read(), filters).into_iter().cloned().collect())
    }

    async fn rollup(&self, filters: &EventFilters, top_n: usize) -> Result<Rollup> {
        let events = self.events.read();
        Ok(rollup_events(oldest_first(&events, filters), top_n))
    }

    async fn daily(&self, filters: &EventFilters) -> Result<Vec<DailyRollup>> {
        let events = self.events.read();
        Ok(daily_events(oldest_first(&events, filters)))
    }

    async fn list(&self, filters: &EventFilters, offset: usize, limit: usize) -> Result<EventPage> {
        let events = self.events.read();

        let mut matched: Vec<&Event> = events.iter().filter(|e| filters.matches(e)).collect();
        matched.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        Ok(EventPage {
            total: matched.len() as u64,
            events: matched.into_iter().skip(offset).take(limit).cloned().collect(),
        })
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

fn oldest_first<'a>(events: &'a [Event], filters: &EventFilters) -> Vec<&'a Event> {
    let mut matched: Vec<&Event> = events.iter().filter(|e| filters.matches(e)).collect();
    // Stable sort keeps insertion order for equal timestamps
    matched.sort_by_key(|e| e.timestamp);
    matched
}
