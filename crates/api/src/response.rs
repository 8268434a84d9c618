//! Standardized API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use telemetry::{ComponentHealthReport, HealthStatus, MetricsSnapshot};
use tracing::error;

/// Acknowledgment for an accepted event.
#[derive(Debug, Serialize, Deserialize)]
pub struct IngestResponse {
    pub success: bool,
    pub received: usize,
    pub timestamp: i64,
}

impl IngestResponse {
    pub fn success(received: usize) -> Self {
        Self {
            success: true,
            received,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub store_connected: bool,
    pub geo_available: bool,
    /// Events buffered but not yet flushed
    pub buffer_depth: u64,
    pub components: Vec<ComponentHealthReport>,
    pub telemetry: MetricsSnapshot,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

/// API error carrying a status and an `{error, code}` body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub response: ErrorResponse,
}

impl ApiError {
    pub fn with_code(status: StatusCode, code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            status,
            response: ErrorResponse::new(msg, code),
        }
    }

    pub fn invalid_query(msg: impl Into<String>) -> Self {
        Self::with_code(StatusCode::BAD_REQUEST, "VALID_003", msg)
    }

    /// Server fault. The body never carries the underlying cause.
    pub fn internal(code: impl Into<String>) -> Self {
        Self::with_code(StatusCode::INTERNAL_SERVER_ERROR, code, "Internal server error")
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.response)).into_response()
    }
}

impl From<analytics_core::Error> for ApiError {
    fn from(err: analytics_core::Error) -> Self {
        let status = StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!(error = %err, "Request failed");
            return ApiError::internal(err.error_code().unwrap_or("INTERNAL"));
        }

        match &err {
            analytics_core::Error::ValidationWithCode { code, message, .. } => {
                ApiError::with_code(status, *code, message)
            }
            _ => ApiError::with_code(status, "VALID_001", err.to_string()),
        }
    }
}
