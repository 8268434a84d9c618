//! Best-effort IP geolocation for incoming events.

use crate::config::GeoConfig;
use crate::lookup::{GeoLookup, HttpGeoLookup, NoopGeoLookup};
use analytics_core::{Event, GeoLocation, Result};
use moka::future::Cache;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use telemetry::{health, metrics};
use tracing::{debug, warn};

/// Addresses that never reach the provider.
const SKIPPED_IPS: [&str; 4] = ["", "unknown", "127.0.0.1", "::1"];

/// Geolocation enricher with a per-IP result cache.
#[derive(Clone)]
pub struct GeoEnricher {
    lookup: Arc<dyn GeoLookup>,
    /// Successful, non-empty lookups only
    cache: Cache<String, GeoLocation>,
    timeout: Duration,
    enabled: bool,
}

impl GeoEnricher {
    pub fn new(lookup: Arc<dyn GeoLookup>, config: &GeoConfig) -> Self {
        Self {
            lookup,
            cache: Cache::builder()
                .max_capacity(config.cache_capacity)
                .time_to_live(config.cache_ttl())
                .build(),
            timeout: config.timeout(),
            enabled: config.enabled,
        }
    }

    /// Build from configuration with the HTTP provider.
    pub fn from_config(config: &GeoConfig) -> Result<Self> {
        let lookup: Arc<dyn GeoLookup> = if config.enabled {
            Arc::new(HttpGeoLookup::new(config)?)
        } else {
            Arc::new(NoopGeoLookup)
        };
        Ok(Self::new(lookup, config))
    }

    /// Enricher that never looks anything up.
    pub fn disabled() -> Self {
        let config = GeoConfig {
            enabled: false,
            ..Default::default()
        };
        Self::new(Arc::new(NoopGeoLookup), &config)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Resolve an IP. Never fails: skipped addresses, timeouts and provider
    /// errors all yield an empty location.
    pub async fn resolve(&self, ip: Option<&str>) -> GeoLocation {
        if !self.enabled {
            return GeoLocation::default();
        }

        let Some(ip) = lookup_target(ip) else {
            metrics().geo_skipped.inc();
            return GeoLocation::default();
        };

        if let Some(cached) = self.cache.get(&ip).await {
            metrics().geo_cache_hits.inc();
            return cached;
        }

        metrics().geo_lookups.inc();
        let start = Instant::now();
        let result = tokio::time::timeout(self.timeout, self.lookup.lookup(&ip)).await;
        metrics().geo_latency_ms.observe_since(start);

        match result {
            Ok(Ok(location)) => {
                health().geo.set_healthy();
                if !location.is_empty() {
                    self.cache.insert(ip, location.clone()).await;
                }
                location
            }
            Ok(Err(e)) => {
                metrics().geo_failures.inc();
                health().geo.set_unhealthy(e.to_string());
                warn!(ip = %ip, error = %e, "Geolocation lookup failed");
                GeoLocation::default()
            }
            Err(_) => {
                metrics().geo_failures.inc();
                health().geo.set_unhealthy("lookup timed out");
                warn!(ip = %ip, timeout_ms = self.timeout.as_millis() as u64, "Geolocation lookup timed out");
                GeoLocation::default()
            }
        }
    }

    /// Attach a location to page views and session starts that lack one.
    pub async fn enrich(&self, event: &mut Event) {
        if !event.event_type.is_geo_enriched() || !event.location.is_empty() {
            return;
        }

        event.location = self.resolve(event.ip_address.as_deref()).await;

        debug!(
            event_id = %event.id,
            country = ?event.location.country,
            "Enriched event location"
        );
    }
}

/// Normalized address to look up, or `None` when it should be skipped.
///
/// Anything that does not parse as an IP address is skipped so header
/// contents never end up in the provider URL.
fn lookup_target(ip: Option<&str>) -> Option<String> {
    let ip = ip.map(str::trim).unwrap_or("");
    if SKIPPED_IPS.contains(&ip) {
        return None;
    }

    let addr: IpAddr = ip.parse().ok()?;
    if addr.is_loopback() || addr.is_unspecified() {
        return None;
    }
    Some(addr.to_string())
}
