//! Paginated raw-event listing.

use analytics::{EventList, PageRequest};
use analytics_core::FilterParams;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::response::ApiError;
use crate::state::AppState;

/// Listing query. `page` is the page number here, so the page-path filter
/// travels as `pagePath`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub page_path: Option<String>,
    pub event_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl EventsParams {
    fn filter_params(&self) -> FilterParams {
        FilterParams {
            start_date: self.start_date.clone(),
            end_date: self.end_date.clone(),
            page: self.page_path.clone(),
            event_type: self.event_type.clone(),
        }
    }
}

/// GET /api/analytics/events?page&limit&pagePath&eventType&startDate&endDate
pub async fn events_handler(
    State(state): State<AppState>,
    params: Result<Query<EventsParams>, QueryRejection>,
) -> Result<Json<Arc<EventList>>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::invalid_query(e.body_text()))?;

    let request = PageRequest::parse(params.page.as_deref(), params.limit.as_deref())?;
    let filters = params.filter_params().resolve()?;

    let list = state.dashboard.events(request, &filters).await?;
    Ok(Json(list))
}
