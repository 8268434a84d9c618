//! Read side of the analytics service.
//!
//! - [`aggregate`]: full metrics payload for a filter set
//! - [`realtime`]: activity over a trailing window
//! - [`pagination`]: newest-first raw event listings
//! - [`cache`]: TTL memoization shared by all three

pub mod aggregate;
pub mod cache;
pub mod dashboard;
pub mod pagination;
pub mod realtime;

pub use aggregate::{AggregationConfig, AggregationEngine, MetricsPayload};
pub use cache::{CacheBand, CacheConfig, MetricsCache};
pub use dashboard::Dashboard;
pub use pagination::{EventList, EventQuery, PageRequest};
pub use realtime::{RealtimeConfig, RealtimePayload, RealtimeTracker};
