//! Geolocation configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoConfig {
    /// Disable to skip all lookups
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Provider base URL; requests go to `{base_url}/{ip}/json/`
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-lookup timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// How long a resolved location is reused for the same IP
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_base_url() -> String {
    "https://ipapi.co".to_string()
}

fn default_timeout_ms() -> u64 {
    1500
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_cache_capacity() -> u64 {
    10_000
}

impl Default for GeoConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl GeoConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
