//! Filter vocabulary shared by the metrics, real-time, and events endpoints.

use chrono::{DateTime, NaiveDate, SecondsFormat, TimeZone, Utc};
use serde::Deserialize;

use crate::error::{Error, Result, ValidationErrorCode};
use crate::events::{Event, EventType};

/// Resolved filter set. `None` means "no filter on this dimension".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilters {
    /// Inclusive lower bound
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound
    pub end_date: Option<DateTime<Utc>>,
    /// Exact page path
    pub page: Option<String>,
    pub event_type: Option<EventType>,
}

impl EventFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_range(mut self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        self.start_date = start;
        self.end_date = end;
        self
    }

    pub fn with_page(mut self, page: impl Into<String>) -> Self {
        self.page = Some(page.into());
        self
    }

    pub fn with_event_type(mut self, event_type: EventType) -> Self {
        self.event_type = Some(event_type);
        self
    }

    /// Whether an event falls inside this filter set.
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(start) = self.start_date {
            if event.timestamp < start {
                return false;
            }
        }
        if let Some(end) = self.end_date {
            if event.timestamp > end {
                return false;
            }
        }
        if let Some(ref page) = self.page {
            if event.page.as_deref() != Some(page.as_str()) {
                return false;
            }
        }
        if let Some(event_type) = self.event_type {
            if event.event_type != event_type {
                return false;
            }
        }
        true
    }

    /// Canonical cache key: fixed field order, absent fields rendered empty.
    pub fn cache_key(&self, endpoint: &str) -> String {
        let ts = |d: Option<DateTime<Utc>>| {
            d.map(|d| d.to_rfc3339_opts(SecondsFormat::Millis, true))
                .unwrap_or_default()
        };

        format!(
            "{}|start={}|end={}|page={}|type={}",
            endpoint,
            ts(self.start_date),
            ts(self.end_date),
            self.page.as_deref().unwrap_or(""),
            self.event_type.map(|t| t.as_str()).unwrap_or(""),
        )
    }
}

/// Raw filter query parameters (camelCase, as sent by the dashboard).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<String>,
    pub event_type: Option<String>,
}

impl FilterParams {
    /// Validate and resolve into an [`EventFilters`].
    pub fn resolve(&self) -> Result<EventFilters> {
        let start_date = non_empty(&self.start_date)
            .map(|s| parse_date(s, DateBound::Start))
            .transpose()?;
        let end_date = non_empty(&self.end_date)
            .map(|s| parse_date(s, DateBound::End))
            .transpose()?;

        if let (Some(start), Some(end)) = (start_date, end_date) {
            if start > end {
                return Err(invalid_query("startDate must not be after endDate"));
            }
        }

        let event_type = non_empty(&self.event_type)
            .map(|s| EventType::parse(s).map_err(|_| invalid_query(format!("unknown eventType '{}'", s))))
            .transpose()?;

        Ok(EventFilters {
            start_date,
            end_date,
            page: non_empty(&self.page).map(str::to_string),
            event_type,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum DateBound {
    Start,
    End,
}

/// Accepts RFC 3339 timestamps or `YYYY-MM-DD`. A date-only end bound
/// covers the whole UTC day.
fn parse_date(raw: &str, bound: DateBound) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }

    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| invalid_query(format!("invalid date '{}'", raw)))?;

    let naive = match bound {
        DateBound::Start => date.and_hms_milli_opt(0, 0, 0, 0),
        DateBound::End => date.and_hms_milli_opt(23, 59, 59, 999),
    }
    .ok_or_else(|| invalid_query(format!("invalid date '{}'", raw)))?;

    Ok(Utc.from_utc_datetime(&naive))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn invalid_query(msg: impl Into<String>) -> Error {
    Error::validation_code(ValidationErrorCode::InvalidQuery, msg)
}
