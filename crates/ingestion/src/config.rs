//! Ingestion configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What happens to a batch the store refused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlushFailurePolicy {
    /// Log and drop the batch (at-most-once delivery)
    #[default]
    Discard,
    /// Put the batch back at the head of the buffer for the next tick
    Requeue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Flush timer period in milliseconds
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
    #[serde(default)]
    pub failure_policy: FlushFailurePolicy,
}

fn default_flush_interval_ms() -> u64 {
    2000
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            flush_interval_ms: default_flush_interval_ms(),
            failure_policy: FlushFailurePolicy::default(),
        }
    }
}

impl IngestionConfig {
    pub fn flush_interval(&self) -> Duration {
        Duration::from_millis(self.flush_interval_ms.max(1))
    }
}
