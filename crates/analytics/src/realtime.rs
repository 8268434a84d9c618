//! "Active now" metrics over a trailing window.

use analytics_core::{Event, EventFilters, Result, VisitorKey};
use chrono::{DateTime, Duration, Utc};
use event_store::tally::Tally;
use event_store::EventStore;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
    /// Number of raw events returned newest-first
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

fn default_window_secs() -> u64 {
    300
}

fn default_recent_limit() -> usize {
    20
}

fn default_max_pages() -> usize {
    10
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            recent_limit: default_recent_limit(),
            max_pages: default_max_pages(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimePayload {
    pub active_users: u64,
    pub active_pages: Vec<ActivePage>,
    pub recent_events: Vec<Event>,
    pub window_seconds: u64,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivePage {
    pub page: String,
    /// Distinct visitors seen on the page within the window
    pub users: u64,
}

#[derive(Clone)]
pub struct RealtimeTracker {
    store: Arc<dyn EventStore>,
    config: RealtimeConfig,
}

impl RealtimeTracker {
    pub fn new(store: Arc<dyn EventStore>, config: RealtimeConfig) -> Self {
        Self { store, config }
    }

    pub async fn compute(&self) -> Result<RealtimePayload> {
        self.compute_at(Utc::now()).await
    }

    /// Window is `[now - window, now]`.
    pub async fn compute_at(&self, now: DateTime<Utc>) -> Result<RealtimePayload> {
        let since = now - Duration::seconds(self.config.window_secs as i64);
        let filters = EventFilters::new().with_range(Some(since), Some(now));

        let events = self.store.fetch(&filters).await?;
        Ok(summarize_window(events, &self.config, now))
    }
}

/// Build the payload from the window's events, oldest first.
pub fn summarize_window(events: Vec<Event>, config: &RealtimeConfig, now: DateTime<Utc>) -> RealtimePayload {
    let mut active = HashSet::new();
    let mut page_visitors: HashMap<&str, HashSet<VisitorKey>> = HashMap::new();
    let mut pages = Tally::new();

    for event in &events {
        let Some(key) = event.visitor_key() else {
            continue;
        };
        active.insert(key);

        if let Some(page) = event.page.as_deref() {
            if page_visitors.entry(page).or_default().insert(key) {
                pages.add(page);
            }
        }
    }

    let active_users = active.len() as u64;
    let active_pages = pages
        .ranked(Some(config.max_pages))
        .into_iter()
        .map(|(page, users)| ActivePage {
            page: page.to_string(),
            users,
        })
        .collect();

    let recent_events = events
        .iter()
        .rev()
        .take(config.recent_limit)
        .cloned()
        .collect();

    RealtimePayload {
        active_users,
        active_pages,
        recent_events,
        window_seconds: config.window_secs,
        generated_at: now,
    }
}
