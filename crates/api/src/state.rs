//! Application state shared across handlers.

use analytics::Dashboard;
use ingestion::IngestionService;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Write side: buffer and flush lifecycle
    pub ingestion: Arc<IngestionService>,
    /// Read side: cached aggregate, real-time and listing queries
    pub dashboard: Dashboard,
}

impl AppState {
    pub fn new(ingestion: Arc<IngestionService>, dashboard: Dashboard) -> Self {
        Self { ingestion, dashboard }
    }
}
