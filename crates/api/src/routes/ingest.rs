//! Event ingestion endpoint.
//!
//! Accepts one event per request, stamps it with the server-side context
//! (user agent, client IP, receive time) and hands it to the ingestion
//! service. The response never waits on storage.

use analytics_core::{IncomingEvent, RequestContext};
use axum::{body::Bytes, extract::State, Json};
use chrono::Utc;
use telemetry::metrics;
use tracing::{debug, warn};

use crate::extractors::{ClientIp, UserAgent};
use crate::response::{ApiError, IngestResponse};
use crate::state::AppState;

/// POST /api/analytics/event
pub async fn ingest_handler(
    State(state): State<AppState>,
    ClientIp(ip_address): ClientIp,
    UserAgent(user_agent): UserAgent,
    body: Bytes,
) -> Result<Json<IngestResponse>, ApiError> {
    metrics().events_received.inc();

    let ctx = RequestContext {
        user_agent,
        ip_address,
    };

    let event = IncomingEvent::parse(&body)
        .and_then(|incoming| incoming.into_event(ctx, Utc::now()))
        .map_err(|e| {
            metrics().events_rejected.inc();
            warn!(error = %e, payload_size = body.len(), "Rejected event");
            ApiError::from(e)
        })?;

    debug!(
        event_id = %event.id,
        event_type = %event.event_type,
        page = event.page.as_deref().unwrap_or(""),
        "Received event"
    );

    state.ingestion.ingest(event).await;

    Ok(Json(IngestResponse::success(1)))
}
