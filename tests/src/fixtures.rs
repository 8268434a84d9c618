//! Test fixtures and event generators.

use analytics_core::{Event, EventData, EventType, GeoLocation};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

/// Public address used as the client IP in requests.
pub const CLIENT_IP: &str = "203.0.113.7";

pub const USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15";

/// Location returned by the static geolocation provider.
pub fn lisbon() -> GeoLocation {
    GeoLocation {
        country: Some("Portugal".into()),
        region: Some("Lisbon".into()),
        city: Some("Lisbon".into()),
        latitude: Some(38.7223),
        longitude: Some(-9.1393),
    }
}

/// Page view request body.
pub fn page_view(page: &str, session_id: &str) -> Value {
    json!({
        "eventType": "page_view",
        "page": page,
        "referrer": "https://news.ycombinator.com/",
        "sessionId": session_id,
    })
}

/// Button click request body.
pub fn button_click(page: &str, session_id: &str, text: &str) -> Value {
    json!({
        "eventType": "button_click",
        "page": page,
        "sessionId": session_id,
        "data": { "buttonText": text, "section": "hero" },
    })
}

/// Contact form submission request body.
pub fn contact_form(session_id: &str, success: bool) -> Value {
    json!({
        "eventType": "contact_form_submission",
        "page": "/contact",
        "sessionId": session_id,
        "data": { "success": success },
    })
}

/// Page view as it would look after ingestion, for seeding stores.
pub fn stored_page_view(page: &str, session_id: &str, timestamp: DateTime<Utc>) -> Event {
    let mut event = Event::new(EventType::PageView, EventData::default(), timestamp);
    event.page = Some(page.to_string());
    event.session_id = Some(session_id.to_string());
    event
}

/// `n` page views one second apart, ending at `end`.
pub fn stored_page_views(n: usize, end: DateTime<Utc>) -> Vec<Event> {
    (0..n)
        .map(|i| {
            let ts = end - chrono::Duration::seconds((n - 1 - i) as i64);
            stored_page_view("/", &format!("session-{}", i), ts)
        })
        .collect()
}
