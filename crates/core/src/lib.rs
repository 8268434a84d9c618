//! Core types, filters, and validation for the site analytics service.

pub mod device;
pub mod error;
pub mod events;
pub mod filters;
pub mod ingest;
pub mod limits;

pub use device::*;
pub use error::{Error, Result, StoreErrorCode, ValidationErrorCode};
pub use events::*;
pub use filters::*;
pub use ingest::*;
