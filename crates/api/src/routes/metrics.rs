//! Aggregate metrics endpoint.

use analytics::MetricsPayload;
use analytics_core::FilterParams;
use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use std::sync::Arc;

use crate::response::ApiError;
use crate::state::AppState;

/// GET /api/analytics/metrics?startDate&endDate&page&eventType
pub async fn metrics_handler(
    State(state): State<AppState>,
    params: Result<Query<FilterParams>, QueryRejection>,
) -> Result<Json<Arc<MetricsPayload>>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::invalid_query(e.body_text()))?;
    let filters = params.resolve()?;

    let payload = state.dashboard.metrics(&filters).await?;
    Ok(Json(payload))
}
