//! Geolocation enrichment.
//!
//! Resolves a client IP to a coarse location for page views and session
//! starts. Lookups are best-effort: every failure path yields an empty
//! location and ingestion carries on.

pub mod config;
pub mod enricher;
pub mod lookup;

pub use config::GeoConfig;
pub use enricher::GeoEnricher;
pub use lookup::{GeoLookup, HttpGeoLookup, NoopGeoLookup};
