//! Cached entry points for the dashboard endpoints.

use crate::aggregate::{AggregationConfig, AggregationEngine, MetricsPayload};
use crate::cache::MetricsCache;
use crate::pagination::{EventList, EventQuery, PageRequest};
use crate::realtime::{RealtimeConfig, RealtimePayload, RealtimeTracker};
use analytics_core::{EventFilters, Result};
use event_store::EventStore;
use std::sync::Arc;

/// Aggregate, real-time and listing queries behind a shared [`MetricsCache`].
#[derive(Clone)]
pub struct Dashboard {
    cache: Arc<MetricsCache>,
    aggregation: AggregationEngine,
    realtime: RealtimeTracker,
    query: EventQuery,
}

impl Dashboard {
    pub fn new(
        store: Arc<dyn EventStore>,
        cache: Arc<MetricsCache>,
        aggregation: AggregationConfig,
        realtime: RealtimeConfig,
    ) -> Self {
        Self {
            cache,
            aggregation: AggregationEngine::new(store.clone(), aggregation),
            realtime: RealtimeTracker::new(store.clone(), realtime),
            query: EventQuery::new(store),
        }
    }

    pub fn cache(&self) -> &Arc<MetricsCache> {
        &self.cache
    }

    pub async fn metrics(&self, filters: &EventFilters) -> Result<Arc<MetricsPayload>> {
        self.cache
            .metrics(&filters.cache_key("metrics"), self.aggregation.compute(filters))
            .await
    }

    pub async fn realtime(&self) -> Result<Arc<RealtimePayload>> {
        self.cache.realtime("realtime", self.realtime.compute()).await
    }

    pub async fn events(&self, request: PageRequest, filters: &EventFilters) -> Result<Arc<EventList>> {
        let key = format!("{}{}", filters.cache_key("events"), request.cache_suffix());
        self.cache.events(&key, self.query.list(request, filters)).await
    }
}
