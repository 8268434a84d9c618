//! Paginated raw-event listings.

use analytics_core::limits::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use analytics_core::{Error, Event, EventFilters, Result, ValidationErrorCode};
use event_store::EventStore;
use serde::Serialize;
use std::sync::Arc;

/// Validated 1-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, limit: u32) -> Result<Self> {
        if page < 1 {
            return Err(invalid("page must be at least 1"));
        }
        if !(1..=MAX_PAGE_LIMIT).contains(&limit) {
            return Err(invalid(format!("limit must be between 1 and {}", MAX_PAGE_LIMIT)));
        }
        Ok(Self { page, limit })
    }

    /// Parse raw query values; absent values take the defaults.
    pub fn parse(page: Option<&str>, limit: Option<&str>) -> Result<Self> {
        let number = |name: &str, raw: Option<&str>, default: u32| -> Result<u32> {
            match raw.map(str::trim).filter(|s| !s.is_empty()) {
                None => Ok(default),
                Some(s) => s
                    .parse::<u32>()
                    .map_err(|_| invalid(format!("{} must be a positive integer", name))),
            }
        };

        Self::new(number("page", page, 1)?, number("limit", limit, DEFAULT_PAGE_LIMIT)?)
    }

    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.limit as usize
    }

    /// Suffix distinguishing pages of the same filter set in cache keys.
    pub fn cache_suffix(&self) -> String {
        format!("|p={}|l={}", self.page, self.limit)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventList {
    pub events: Vec<Event>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
}

/// `ceil(total / limit)`, 0 for an empty result.
pub fn total_pages(total: u64, limit: u32) -> u64 {
    total.div_ceil(u64::from(limit.max(1)))
}

#[derive(Clone)]
pub struct EventQuery {
    store: Arc<dyn EventStore>,
}

impl EventQuery {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Newest-first page of events matching `filters`.
    pub async fn list(&self, request: PageRequest, filters: &EventFilters) -> Result<EventList> {
        let page = self
            .store
            .list(filters, request.offset(), request.limit as usize)
            .await?;

        Ok(EventList {
            events: page.events,
            total: page.total,
            page: request.page,
            limit: request.limit,
            total_pages: total_pages(page.total, request.limit),
        })
    }
}

fn invalid(msg: impl Into<String>) -> Error {
    Error::validation_code(ValidationErrorCode::InvalidQuery, msg)
}
