//! Geolocation providers.

use crate::config::GeoConfig;
use analytics_core::{Error, GeoLocation, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

/// Resolves an IP address to a location.
#[async_trait]
pub trait GeoLookup: Send + Sync {
    async fn lookup(&self, ip: &str) -> Result<GeoLocation>;
}

/// ipapi-style HTTP provider (`GET {base_url}/{ip}/json/`).
#[derive(Clone)]
pub struct HttpGeoLookup {
    base_url: String,
    http_client: reqwest::Client,
}

/// Provider response. `error: true` comes back with HTTP 200 for reserved
/// ranges and rate limiting.
#[derive(Debug, Deserialize)]
struct IpApiResponse {
    #[serde(default)]
    error: bool,
    reason: Option<String>,
    country_name: Option<String>,
    country: Option<String>,
    region: Option<String>,
    city: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

impl From<IpApiResponse> for GeoLocation {
    fn from(r: IpApiResponse) -> Self {
        let non_empty = |s: Option<String>| s.filter(|s| !s.trim().is_empty());

        GeoLocation {
            country: non_empty(r.country_name).or_else(|| non_empty(r.country)),
            region: non_empty(r.region),
            city: non_empty(r.city),
            latitude: r.latitude,
            longitude: r.longitude,
        }
    }
}

impl HttpGeoLookup {
    pub fn new(config: &GeoConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("site-analytics/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }
}

#[async_trait]
impl GeoLookup for HttpGeoLookup {
    async fn lookup(&self, ip: &str) -> Result<GeoLocation> {
        let url = format!("{}/{}/json/", self.base_url, ip);

        debug!(url = %url, "Calling geolocation provider");

        let response = self.http_client.get(&url).send().await.map_err(|e| {
            warn!(error = %e, "Geolocation request failed");
            Error::internal(format!("geolocation provider unavailable: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Error::internal(format!(
                "geolocation provider returned {}",
                status
            )));
        }

        let body: IpApiResponse = response.json().await.map_err(|e| {
            warn!(error = %e, "Failed to parse geolocation response");
            Error::internal(format!("invalid geolocation response: {}", e))
        })?;

        if body.error {
            return Err(Error::internal(format!(
                "geolocation provider error: {}",
                body.reason.as_deref().unwrap_or("unspecified")
            )));
        }

        Ok(body.into())
    }
}

/// Provider used when lookups are disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopGeoLookup;

#[async_trait]
impl GeoLookup for NoopGeoLookup {
    async fn lookup(&self, _ip: &str) -> Result<GeoLocation> {
        Ok(GeoLocation::default())
    }
}
