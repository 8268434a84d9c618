//! Pending-event buffer.

use analytics_core::Event;
use parking_lot::Mutex;

/// Ordered list of events awaiting persistence.
///
/// A drain swaps the whole list out under the lock, so an event pushed
/// concurrently lands either in the drained batch or in the next one, never
/// both and never neither.
#[derive(Debug, Default)]
pub struct IngestionBuffer {
    events: Mutex<Vec<Event>>,
}

impl IngestionBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event. Returns the new depth.
    pub fn push(&self, event: Event) -> usize {
        let mut events = self.events.lock();
        events.push(event);
        events.len()
    }

    /// Take ownership of everything buffered so far.
    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock())
    }

    /// Restore a failed batch ahead of anything pushed since it was taken.
    pub fn requeue(&self, mut batch: Vec<Event>) {
        let mut events = self.events.lock();
        batch.append(&mut events);
        *events = batch;
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
