//! Real-time activity endpoint.

use analytics::RealtimePayload;
use axum::{extract::State, Json};
use std::sync::Arc;

use crate::response::ApiError;
use crate::state::AppState;

/// GET /api/analytics/realtime
pub async fn realtime_handler(State(state): State<AppState>) -> Result<Json<Arc<RealtimePayload>>, ApiError> {
    let payload = state.dashboard.realtime().await?;
    Ok(Json(payload))
}
