//! Dashboard aggregate metrics.
//!
//! Grouping is pushed down to the store through [`EventStore::rollup`] and
//! [`EventStore::daily`]; this module shapes the grouped counts into the
//! response payload.

use analytics_core::{EventFilters, EventType, Result};
use chrono::{DateTime, Duration, NaiveTime, Utc};
use event_store::{DailyRollup, EventStore, Rollup};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use telemetry::metrics;
use tracing::debug;

/// Label for page views with no referrer.
pub const DIRECT_REFERRER: &str = "Direct";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Length of every ranked list
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// Days covered by `dailyActivity`, including today
    #[serde(default = "default_daily_window_days")]
    pub daily_window_days: u32,
}

fn default_top_n() -> usize {
    10
}

fn default_daily_window_days() -> u32 {
    30
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            top_n: default_top_n(),
            daily_window_days: default_daily_window_days(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsPayload {
    pub total_events: u64,
    pub total_page_views: u64,
    pub unique_visitors: u64,
    pub top_pages: Vec<PageViews>,
    pub top_referrers: Vec<ReferrerVisits>,
    pub device_types: Vec<DeviceCount>,
    pub hourly_activity: Vec<HourlyCount>,
    pub daily_activity: Vec<DailyActivity>,
    pub top_countries: Vec<CountryVisits>,
    pub top_regions: Vec<RegionVisits>,
    pub top_cities: Vec<CityVisits>,
    pub event_types: Vec<EventTypeCount>,
    pub contact_form_stats: ContactFormStats,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageViews {
    pub page: String,
    pub views: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferrerVisits {
    pub referrer: String,
    pub visits: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceCount {
    pub device: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyCount {
    /// Hour of day in UTC, 0-23
    pub hour: u32,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyActivity {
    /// `YYYY-MM-DD` (UTC)
    pub date: String,
    pub page_views: u64,
    pub visitors: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryVisits {
    pub country: String,
    pub visits: u64,
    /// Share of all visits with a known country, unrounded
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionVisits {
    pub region: String,
    pub country: String,
    pub visits: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityVisits {
    pub city: String,
    pub region: Option<String>,
    pub country: String,
    pub visits: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTypeCount {
    pub event_type: EventType,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactFormStats {
    pub submissions: u64,
    pub successful: u64,
    /// Unrounded percentage, 0 when there were no submissions
    pub success_rate: f64,
}

/// Computes [`MetricsPayload`]s from the event store.
#[derive(Clone)]
pub struct AggregationEngine {
    store: Arc<dyn EventStore>,
    config: AggregationConfig,
}

impl AggregationEngine {
    pub fn new(store: Arc<dyn EventStore>, config: AggregationConfig) -> Self {
        Self { store, config }
    }

    pub async fn compute(&self, filters: &EventFilters) -> Result<MetricsPayload> {
        self.compute_at(filters, Utc::now()).await
    }

    /// Compute as of `now`, which anchors the daily activity window.
    pub async fn compute_at(&self, filters: &EventFilters, now: DateTime<Utc>) -> Result<MetricsPayload> {
        let start = Instant::now();

        let rollup = self.store.rollup(filters, self.config.top_n).await?;
        let daily = match daily_window(filters, now, self.config.daily_window_days) {
            Some(window) => self.store.daily(&window).await?,
            None => Vec::new(),
        };

        let total_events = rollup.total_events;
        let payload = MetricsPayload::from_rollup(rollup, daily, now);

        metrics().aggregate_latency_ms.observe_since(start);
        debug!(
            events = total_events,
            latency_ms = %start.elapsed().as_millis(),
            "Computed aggregate metrics"
        );

        Ok(payload)
    }
}

/// Filters for the daily activity series: the caller's filters with the
/// date range narrowed to the trailing window. `None` if the intersection
/// is empty.
pub fn daily_window(filters: &EventFilters, now: DateTime<Utc>, days: u32) -> Option<EventFilters> {
    if days == 0 {
        return None;
    }

    let today = now.date_naive();
    let first_day = today - Duration::days(i64::from(days) - 1);
    let window_start = first_day.and_time(NaiveTime::MIN).and_utc();
    let window_end = today.and_time(NaiveTime::MIN).and_utc() + Duration::days(1) - Duration::milliseconds(1);

    let start = filters.start_date.map_or(window_start, |s| s.max(window_start));
    let end = filters.end_date.map_or(window_end, |e| e.min(window_end));

    if start > end {
        return None;
    }

    Some(filters.clone().with_range(Some(start), Some(end)))
}

impl MetricsPayload {
    /// Shape grouped counts into the response payload. `daily` covers the
    /// daily activity window, which differs from the caller's date range.
    pub fn from_rollup(rollup: Rollup, daily: Vec<DailyRollup>, generated_at: DateTime<Utc>) -> Self {
        let located = rollup.located_events;

        Self {
            total_events: rollup.total_events,
            total_page_views: rollup.page_views,
            unique_visitors: rollup.unique_visitors,
            top_pages: rollup
                .pages
                .into_iter()
                .map(|(page, views)| PageViews { page, views })
                .collect(),
            top_referrers: rollup
                .referrers
                .into_iter()
                .map(|(referrer, visits)| ReferrerVisits {
                    referrer: referrer.unwrap_or_else(|| DIRECT_REFERRER.to_string()),
                    visits,
                })
                .collect(),
            device_types: rollup
                .devices
                .into_iter()
                .map(|(device, count)| DeviceCount {
                    device: device.as_str().to_string(),
                    count,
                })
                .collect(),
            hourly_activity: rollup
                .hours
                .into_iter()
                .map(|(hour, count)| HourlyCount { hour, count })
                .collect(),
            daily_activity: daily
                .into_iter()
                .map(|d| DailyActivity {
                    date: d.date.format("%Y-%m-%d").to_string(),
                    page_views: d.page_views,
                    visitors: d.visitors,
                })
                .collect(),
            top_countries: rollup
                .countries
                .into_iter()
                .map(|(country, visits)| CountryVisits {
                    country,
                    visits,
                    percentage: percent(visits, located),
                })
                .collect(),
            top_regions: rollup
                .regions
                .into_iter()
                .map(|((region, country), visits)| RegionVisits { region, country, visits })
                .collect(),
            top_cities: rollup
                .cities
                .into_iter()
                .map(|((city, region, country), visits)| CityVisits {
                    city,
                    region,
                    country,
                    visits,
                })
                .collect(),
            event_types: rollup
                .event_types
                .into_iter()
                .map(|(event_type, count)| EventTypeCount { event_type, count })
                .collect(),
            contact_form_stats: ContactFormStats {
                submissions: rollup.contact_submissions,
                successful: rollup.contact_successful,
                success_rate: percent(rollup.contact_successful, rollup.contact_submissions),
            },
            generated_at,
        }
    }
}

/// `part / whole * 100`, 0 when `whole` is 0. Rounding is left to display.
fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    part as f64 / whole as f64 * 100.0
}
