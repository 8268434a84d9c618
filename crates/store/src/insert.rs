//! Row mapping and batch insert for ClickHouse.

use crate::client::ClickHouseClient;
use analytics_core::{Error, Event, EventData, EventType, GeoLocation, Result, StoreErrorCode};
use chrono::{TimeZone, Utc};
use clickhouse::Row;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Flattened event row for the `events` table.
#[derive(Debug, Clone, Row, Serialize, Deserialize)]
pub struct EventRow {
    pub id: String,
    pub event_type: String,
    pub page: Option<String>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    pub data: String, // JSON blob
    pub timestamp: i64, // DateTime64(3) as milliseconds
    pub country: Option<String>,
    pub region: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl From<&Event> for EventRow {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id.to_string(),
            event_type: event.event_type.as_str().to_string(),
            page: event.page.clone(),
            referrer: event.referrer.clone(),
            user_agent: event.user_agent.clone(),
            ip_address: event.ip_address.clone(),
            session_id: event.session_id.clone(),
            user_id: event.user_id.clone(),
            data: event.data.to_json(),
            timestamp: event.timestamp.timestamp_millis(),
            country: event.location.country.clone(),
            region: event.location.region.clone(),
            city: event.location.city.clone(),
            latitude: event.location.latitude,
            longitude: event.location.longitude,
        }
    }
}

impl EventRow {
    /// Rebuild the domain event.
    pub fn into_event(self) -> Result<Event> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| Error::internal(format!("bad event id '{}': {}", self.id, e)))?;
        let event_type = EventType::parse(&self.event_type)?;
        let timestamp = Utc
            .timestamp_millis_opt(self.timestamp)
            .single()
            .ok_or_else(|| Error::internal(format!("bad timestamp {}", self.timestamp)))?;

        Ok(Event {
            id,
            event_type,
            page: self.page,
            referrer: self.referrer,
            user_agent: self.user_agent,
            ip_address: self.ip_address,
            session_id: self.session_id,
            user_id: self.user_id,
            data: EventData::from_stored(event_type, &self.data),
            timestamp,
            location: GeoLocation {
                country: self.country,
                region: self.region,
                city: self.city,
                latitude: self.latitude,
                longitude: self.longitude,
            },
        })
    }
}

/// Insert a batch as a single ClickHouse insert.
pub async fn insert_events(client: &ClickHouseClient, events: &[Event]) -> Result<usize> {
    if events.is_empty() {
        return Ok(0);
    }

    let start = std::time::Instant::now();

    let mut insert = client
        .inner()
        .insert("events")
        .map_err(|e| store_error("insert", e))?;

    for event in events {
        insert
            .write(&EventRow::from(event))
            .await
            .map_err(|e| store_error("write", e))?;
    }

    insert.end().await.map_err(|e| store_error("end", e))?;

    debug!(
        count = events.len(),
        latency_ms = %start.elapsed().as_millis(),
        "Inserted events to ClickHouse"
    );

    Ok(events.len())
}

pub(crate) fn store_error(stage: &str, e: clickhouse::error::Error) -> Error {
    Error::store(StoreErrorCode::Unavailable, format!("{} error: {}", stage, e))
}
