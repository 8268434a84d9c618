//! Ingestion payload parsing and normalization.
//!
//! This module handles:
//! - Parsing the client body (camelCase JSON object)
//! - Validating field lengths and the per-type `data` shape
//! - Normalizing into an [`Event`] stamped with server-side context

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use crate::error::{Error, Result, ValidationErrorCode};
use crate::events::{Event, EventData, EventType, GeoLocation};
use crate::limits::{MAX_EVENT_BODY_BYTES, MAX_EVENT_DATA_BYTES, MAX_IP_LEN, MAX_USER_AGENT_LEN};

/// Event as received from the site frontend.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IncomingEvent {
    /// Event type (validated against [`EventType`])
    pub event_type: String,

    /// Page path
    #[validate(length(max = 2000))]
    pub page: Option<String>,

    /// Referrer URL
    #[validate(length(max = 2048))]
    pub referrer: Option<String>,

    /// Persistent visitor ID
    #[validate(length(max = 128))]
    pub user_id: Option<String>,

    /// Session ID
    #[validate(length(max = 128))]
    pub session_id: Option<String>,

    /// Per-type payload
    pub data: Option<Value>,
}

/// Server-derived request attributes.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub user_agent: Option<String>,
    /// Client IP, or `"unknown"` when no header carried one
    pub ip_address: String,
}

impl IncomingEvent {
    /// Parse a request body.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() > MAX_EVENT_BODY_BYTES {
            return Err(Error::validation_code(
                ValidationErrorCode::PayloadTooLarge,
                format!(
                    "payload size {}KB exceeds {}KB limit",
                    bytes.len() / 1024,
                    MAX_EVENT_BODY_BYTES / 1024
                ),
            ));
        }

        let value: Value = serde_json::from_slice(bytes).map_err(|e| malformed(format!("invalid JSON: {}", e)))?;

        if !value.is_object() {
            return Err(malformed("request body must be a JSON object"));
        }

        serde_json::from_value(value).map_err(|e| malformed(format!("invalid event: {}", e)))
    }

    /// Validate and normalize into an event received at `now`.
    pub fn into_event(self, ctx: RequestContext, now: DateTime<Utc>) -> Result<Event> {
        self.validate().map_err(|e| malformed(e.to_string()))?;

        let event_type = EventType::parse(self.event_type.trim()).map_err(|e| malformed(e.to_string()))?;

        if let Some(ref data) = self.data {
            let size = serde_json::to_vec(data).map(|v| v.len()).unwrap_or(0);
            if size > MAX_EVENT_DATA_BYTES {
                return Err(malformed(format!(
                    "data {}KB exceeds {}KB limit",
                    size / 1024,
                    MAX_EVENT_DATA_BYTES / 1024
                )));
            }
        }

        let data = EventData::parse(event_type, self.data).map_err(|e| malformed(e.to_string()))?;

        Ok(Event {
            id: Uuid::new_v4(),
            event_type,
            page: non_empty(self.page),
            referrer: non_empty(self.referrer),
            user_agent: non_empty(ctx.user_agent).map(|ua| truncate_chars(&ua, MAX_USER_AGENT_LEN)),
            ip_address: normalize_ip(&ctx.ip_address),
            session_id: non_empty(self.session_id),
            user_id: non_empty(self.user_id),
            data,
            timestamp: now,
            location: GeoLocation::default(),
        })
    }
}

fn malformed(msg: impl Into<String>) -> Error {
    Error::validation_code(ValidationErrorCode::InvalidFormat, msg)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn normalize_ip(ip: &str) -> Option<String> {
    let ip = ip.trim();
    if ip.is_empty() || ip == "unknown" || ip.len() > MAX_IP_LEN {
        None
    } else {
        Some(ip.to_string())
    }
}
