//! Event type definitions for the analytics service.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;
use validator::Validate;

use crate::error::{Error, Result};

/// All supported event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    PageView,
    SessionStart,
    SessionEnd,
    ButtonClick,
    ProjectView,
    BlogPostView,
    ContactFormSubmission,
    ScrollDepth,
    ExternalLinkClick,
    ResumeDownload,
}

impl EventType {
    pub const ALL: [EventType; 10] = [
        Self::PageView,
        Self::SessionStart,
        Self::SessionEnd,
        Self::ButtonClick,
        Self::ProjectView,
        Self::BlogPostView,
        Self::ContactFormSubmission,
        Self::ScrollDepth,
        Self::ExternalLinkClick,
        Self::ResumeDownload,
    ];

    /// Returns the string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PageView => "page_view",
            Self::SessionStart => "session_start",
            Self::SessionEnd => "session_end",
            Self::ButtonClick => "button_click",
            Self::ProjectView => "project_view",
            Self::BlogPostView => "blog_post_view",
            Self::ContactFormSubmission => "contact_form_submission",
            Self::ScrollDepth => "scroll_depth",
            Self::ExternalLinkClick => "external_link_click",
            Self::ResumeDownload => "resume_download",
        }
    }

    /// Parse from the wire representation.
    pub fn parse(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::InvalidEventType(s.to_string()))
    }

    /// Only these types trigger a geolocation lookup, to bound external calls.
    pub fn is_geo_enriched(&self) -> bool {
        matches!(self, Self::PageView | Self::SessionStart)
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Button click event data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ButtonClickData {
    #[validate(length(min = 1, max = 200))]
    pub button_text: String,
    #[validate(length(max = 128))]
    pub button_id: Option<String>,
    #[validate(length(max = 128))]
    pub section: Option<String>,
}

/// Project view event data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProjectViewData {
    #[validate(length(min = 1, max = 128))]
    pub project_id: String,
    #[validate(length(max = 200))]
    pub project_name: Option<String>,
}

/// Contact form submission event data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ContactFormData {
    /// Whether the form was delivered successfully
    pub success: bool,
    #[validate(length(max = 500))]
    pub error: Option<String>,
}

/// Scroll depth event data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ScrollDepthData {
    /// Scroll depth as percentage (0-100)
    #[validate(range(min = 0.0, max = 100.0))]
    pub depth: f64,
}

/// External link click event data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ExternalLinkData {
    #[validate(length(min = 1, max = 2048))]
    pub url: String,
    #[validate(length(max = 200))]
    pub label: Option<String>,
}

/// Event payload, shaped by the event type.
///
/// Types with a known payload get a typed variant; everything else carries
/// a free-form object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventData {
    ButtonClick(ButtonClickData),
    ProjectView(ProjectViewData),
    ContactForm(ContactFormData),
    ScrollDepth(ScrollDepthData),
    ExternalLink(ExternalLinkData),
    Other(Map<String, Value>),
}

impl Default for EventData {
    fn default() -> Self {
        Self::Other(Map::new())
    }
}

impl EventData {
    /// Parse and validate the client payload for the given event type.
    pub fn parse(event_type: EventType, value: Option<Value>) -> Result<Self> {
        let value = value.filter(|v| !v.is_null());

        match event_type {
            EventType::ButtonClick => typed(event_type, value).map(Self::ButtonClick),
            EventType::ProjectView => typed(event_type, value).map(Self::ProjectView),
            EventType::ContactFormSubmission => typed(event_type, value).map(Self::ContactForm),
            EventType::ScrollDepth => typed(event_type, value).map(Self::ScrollDepth),
            EventType::ExternalLinkClick => typed(event_type, value).map(Self::ExternalLink),
            _ => match value {
                None => Ok(Self::default()),
                Some(Value::Object(map)) => Ok(Self::Other(map)),
                Some(_) => Err(Error::invalid_data(
                    event_type.as_str(),
                    "data must be a JSON object",
                )),
            },
        }
    }

    /// Rebuild a payload read back from storage.
    ///
    /// Stored rows are immutable, so a payload that no longer matches its
    /// typed shape degrades to a free-form object instead of failing the read.
    pub fn from_stored(event_type: EventType, raw: &str) -> Self {
        let value: Option<Value> = serde_json::from_str(raw).ok();

        match Self::parse(event_type, value.clone()) {
            Ok(data) => data,
            Err(_) => match value {
                Some(Value::Object(map)) => Self::Other(map),
                _ => Self::default(),
            },
        }
    }

    /// Serialize for storage.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Success flag for contact form submissions.
    pub fn contact_form_success(&self) -> Option<bool> {
        match self {
            Self::ContactForm(data) => Some(data.success),
            _ => None,
        }
    }
}

fn typed<T>(event_type: EventType, value: Option<Value>) -> Result<T>
where
    T: DeserializeOwned + Validate,
{
    let value = value.ok_or_else(|| Error::invalid_data(event_type.as_str(), "data is required"))?;

    let data: T = serde_json::from_value(value)
        .map_err(|e| Error::invalid_data(event_type.as_str(), e.to_string()))?;

    data.validate()
        .map_err(|e| Error::invalid_data(event_type.as_str(), e.to_string()))?;

    Ok(data)
}

/// Coarse location resolved from the client IP.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoLocation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl GeoLocation {
    pub fn is_empty(&self) -> bool {
        self.country.is_none()
            && self.region.is_none()
            && self.city.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
    }
}

/// A single analytics event. Immutable once persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Unique event ID
    pub id: Uuid,
    pub event_type: EventType,
    /// Page path
    pub page: Option<String>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    /// Client-supplied correlation key for one browsing visit
    pub session_id: Option<String>,
    /// Persistent visitor ID
    pub user_id: Option<String>,
    pub data: EventData,
    /// Server receive timestamp
    pub timestamp: DateTime<Utc>,
    /// Populated by geolocation enrichment
    #[serde(flatten)]
    pub location: GeoLocation,
}

impl Event {
    /// Creates a new event with a generated ID and no optional fields.
    pub fn new(event_type: EventType, data: EventData, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type,
            page: None,
            referrer: None,
            user_agent: None,
            ip_address: None,
            session_id: None,
            user_id: None,
            data,
            timestamp,
            location: GeoLocation::default(),
        }
    }

    /// Identifier used for visitor counts: session first, then user.
    pub fn visitor_key(&self) -> Option<VisitorKey<'_>> {
        fn non_empty(id: &Option<String>) -> Option<&str> {
            id.as_deref().filter(|k| !k.is_empty())
        }

        non_empty(&self.session_id)
            .map(VisitorKey::Session)
            .or_else(|| non_empty(&self.user_id).map(VisitorKey::User))
    }
}

/// Distinct-visitor identity. Session and user IDs live in separate
/// namespaces, so equal strings from different sources stay distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisitorKey<'a> {
    Session(&'a str),
    User(&'a str),
}
