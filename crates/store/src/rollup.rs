//! Grouped counts behind the dashboard metrics.
//!
//! Backends answer these reads without handing every matching row back to
//! the caller. Ranked lists are count-descending with ties going to the key
//! seen first in `(timestamp, id)` order.

use crate::tally::Tally;
use analytics_core::{classify_user_agent, DeviceType, Event, EventType, VisitorKey};
use chrono::{NaiveDate, Timelike};
use std::collections::{BTreeMap, HashSet};

/// `(key, count)` pairs.
pub type Ranked<K> = Vec<(K, u64)>;

/// Region key: `(region, country)`.
pub type RegionKey = (String, String);

/// City key: `(city, region, country)`.
pub type CityKey = (String, Option<String>, String);

/// Grouped counts over one filter set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rollup {
    pub total_events: u64,
    pub page_views: u64,
    pub unique_visitors: u64,
    pub contact_submissions: u64,
    pub contact_successful: u64,
    /// Page views per page, top N
    pub pages: Ranked<String>,
    /// Page views per referrer, top N. `None` is direct traffic.
    pub referrers: Ranked<Option<String>>,
    pub devices: Ranked<DeviceType>,
    /// Ascending by hour of day (UTC)
    pub hours: Ranked<u32>,
    pub event_types: Ranked<EventType>,
    /// Events with a known country, the denominator for country shares
    pub located_events: u64,
    pub countries: Ranked<String>,
    pub regions: Ranked<RegionKey>,
    pub cities: Ranked<CityKey>,
}

/// One UTC day of activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyRollup {
    pub date: NaiveDate,
    pub page_views: u64,
    pub visitors: u64,
}

/// Referrer grouping key: trimmed, with blank treated as direct.
pub fn referrer_key(referrer: Option<&str>) -> Option<&str> {
    referrer.map(str::trim).filter(|r| !r.is_empty())
}

/// Group `events`, which must be in `(timestamp, id)` order.
pub(crate) fn rollup_events<'a>(events: impl IntoIterator<Item = &'a Event>, top_n: usize) -> Rollup {
    let limit = Some(top_n);

    let mut rollup = Rollup::default();
    let mut visitors = HashSet::new();
    let mut pages = Tally::new();
    let mut referrers = Tally::new();
    let mut devices = Tally::new();
    let mut hours = Tally::new();
    let mut event_types = Tally::new();
    let mut countries = Tally::new();
    let mut regions = Tally::new();
    let mut cities = Tally::new();

    for event in events {
        rollup.total_events += 1;
        if let Some(key) = event.visitor_key() {
            visitors.insert(key);
        }

        event_types.add(event.event_type);
        devices.add(classify_user_agent(event.user_agent.as_deref()));
        hours.add(event.timestamp.hour());

        match event.event_type {
            EventType::PageView => {
                rollup.page_views += 1;
                if let Some(page) = event.page.as_deref() {
                    pages.add(page);
                }
                referrers.add(referrer_key(event.referrer.as_deref()));
            }
            EventType::ContactFormSubmission => {
                rollup.contact_submissions += 1;
                if event.data.contact_form_success() == Some(true) {
                    rollup.contact_successful += 1;
                }
            }
            _ => {}
        }

        let loc = &event.location;
        if let Some(country) = loc.country.as_deref() {
            countries.add(country);
            if let Some(region) = loc.region.as_deref() {
                regions.add((region, country));
            }
            if let Some(city) = loc.city.as_deref() {
                cities.add((city, loc.region.as_deref(), country));
            }
        }
    }

    let owned = |s: &str| s.to_string();

    rollup.unique_visitors = visitors.len() as u64;
    rollup.located_events = countries.total();
    rollup.pages = pages.ranked(limit).into_iter().map(|(k, n)| (owned(k), n)).collect();
    rollup.referrers = referrers
        .ranked(limit)
        .into_iter()
        .map(|(k, n)| (k.map(owned), n))
        .collect();
    rollup.devices = devices.ranked(None);
    rollup.hours = hours.sorted_by_key();
    rollup.event_types = event_types.ranked(None);
    rollup.countries = countries.ranked(limit).into_iter().map(|(k, n)| (owned(k), n)).collect();
    rollup.regions = regions
        .ranked(limit)
        .into_iter()
        .map(|((region, country), n)| ((owned(region), owned(country)), n))
        .collect();
    rollup.cities = cities
        .ranked(limit)
        .into_iter()
        .map(|((city, region, country), n)| ((owned(city), region.map(owned), owned(country)), n))
        .collect();

    rollup
}

pub(crate) fn daily_events<'a>(events: impl IntoIterator<Item = &'a Event>) -> Vec<DailyRollup> {
    let mut days: BTreeMap<NaiveDate, (u64, HashSet<VisitorKey<'a>>)> = BTreeMap::new();

    for event in events {
        let (views, visitors) = days.entry(event.timestamp.date_naive()).or_default();
        if event.event_type == EventType::PageView {
            *views += 1;
        }
        if let Some(key) = event.visitor_key() {
            visitors.insert(key);
        }
    }

    days.into_iter()
        .map(|(date, (page_views, visitors))| DailyRollup {
            date,
            page_views,
            visitors: visitors.len() as u64,
        })
        .collect()
}
