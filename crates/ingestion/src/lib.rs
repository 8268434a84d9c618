//! Write side of the analytics service.
//!
//! Events are acknowledged as soon as they are buffered; a timer drains the
//! buffer into the event store as one batch per tick.

pub mod batch;
pub mod config;
pub mod service;

pub use batch::IngestionBuffer;
pub use config::{FlushFailurePolicy, IngestionConfig};
pub use service::{FlushOutcome, IngestionService};
