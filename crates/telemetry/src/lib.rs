//! Process telemetry for the analytics service.
//!
//! Counters and histograms live in a global registry so every crate can
//! record without threading handles through constructors. The API exposes
//! a snapshot alongside the health report.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::*;
pub use metrics::*;
pub use tracing_setup::*;
