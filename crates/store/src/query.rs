//! Filtered reads against the `events` table.

use crate::client::ClickHouseClient;
use crate::insert::{store_error, EventRow};
use crate::rollup::{CityKey, DailyRollup, Ranked, RegionKey, Rollup};
use analytics_core::{DeviceType, Error, Event, EventFilters, EventType, Result, DEVICE_RULES};
use chrono::NaiveDate;
use clickhouse::query::Query;
use clickhouse::Row;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::warn;

const EVENT_COLUMNS: &str = "id, event_type, page, referrer, user_agent, ip_address, session_id, \
     user_id, data, toUnixTimestamp64Milli(timestamp) AS timestamp, country, region, city, \
     latitude, longitude";

/// Session ID, else user ID, tagged so the two never collide. NULL for
/// anonymous events, which `uniqExact` skips.
const VISITOR_KEY: &str = "multiIf(ifNull(session_id, '') != '', concat('s:', assumeNotNull(session_id)), \
     ifNull(user_id, '') != '', concat('u:', assumeNotNull(user_id)), NULL)";

/// Referrer with blank values folded into NULL (direct traffic).
const REFERRER_KEY: &str = "nullIf(trimBoth(ifNull(referrer, '')), '')";

/// WHERE clause with positional binds, kept in the order they appear.
#[derive(Debug, Default, Clone)]
pub struct WhereClause {
    conditions: Vec<String>,
    binds: Vec<Bind>,
}

#[derive(Debug, Clone, PartialEq)]
enum Bind {
    Millis(i64),
    Text(String),
}

impl WhereClause {
    pub fn from_filters(filters: &EventFilters) -> Self {
        let mut clause = Self::default();

        if let Some(start) = filters.start_date {
            clause.push("timestamp >= fromUnixTimestamp64Milli(?)", Bind::Millis(start.timestamp_millis()));
        }
        if let Some(end) = filters.end_date {
            clause.push("timestamp <= fromUnixTimestamp64Milli(?)", Bind::Millis(end.timestamp_millis()));
        }
        if let Some(ref page) = filters.page {
            clause.push("page = ?", Bind::Text(page.clone()));
        }
        if let Some(event_type) = filters.event_type {
            clause.push("event_type = ?", Bind::Text(event_type.as_str().to_string()));
        }

        clause
    }

    fn push(&mut self, condition: &str, bind: Bind) {
        self.conditions.push(condition.to_string());
        self.binds.push(bind);
    }

    /// Add a condition that carries no bind.
    pub fn and(mut self, condition: impl Into<String>) -> Self {
        self.conditions.push(condition.into());
        self
    }

    pub fn sql(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.conditions.join(" AND "))
        }
    }

    fn bind(&self, mut query: Query) -> Query {
        for b in &self.binds {
            query = match b {
                Bind::Millis(ms) => query.bind(*ms),
                Bind::Text(s) => query.bind(s.as_str()),
            };
        }
        query
    }
}

/// Row with the filtered total attached by a window function.
#[derive(Debug, Row, Deserialize)]
struct CountedEventRow {
    id: String,
    event_type: String,
    page: Option<String>,
    referrer: Option<String>,
    user_agent: Option<String>,
    ip_address: Option<String>,
    session_id: Option<String>,
    user_id: Option<String>,
    data: String,
    timestamp: i64,
    country: Option<String>,
    region: Option<String>,
    city: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    total: u64,
}

impl CountedEventRow {
    fn split(self) -> (u64, EventRow) {
        let row = EventRow {
            id: self.id,
            event_type: self.event_type,
            page: self.page,
            referrer: self.referrer,
            user_agent: self.user_agent,
            ip_address: self.ip_address,
            session_id: self.session_id,
            user_id: self.user_id,
            data: self.data,
            timestamp: self.timestamp,
            country: self.country,
            region: self.region,
            city: self.city,
            latitude: self.latitude,
            longitude: self.longitude,
        };
        (self.total, row)
    }
}

/// All matching events, oldest first.
pub async fn fetch_events(client: &ClickHouseClient, filters: &EventFilters) -> Result<Vec<Event>> {
    let clause = WhereClause::from_filters(filters);
    let sql = format!(
        "SELECT {} FROM events{} ORDER BY timestamp ASC, id ASC",
        EVENT_COLUMNS,
        clause.sql()
    );

    let rows: Vec<EventRow> = clause
        .bind(client.inner().query(&sql))
        .fetch_all()
        .await
        .map_err(|e| store_error("query", e))?;

    Ok(into_events(rows))
}

/// Count matching events.
pub async fn count_events(client: &ClickHouseClient, filters: &EventFilters) -> Result<u64> {
    let clause = WhereClause::from_filters(filters);
    let sql = format!("SELECT count() FROM events{}", clause.sql());

    clause
        .bind(client.inner().query(&sql))
        .fetch_one::<u64>()
        .await
        .map_err(|e| store_error("count", e))
}

/// One page of matching events, newest first, with the filtered total.
///
/// Total and slice come from the same statement so they agree even while
/// flushes land. An out-of-range page returns no rows, so the total falls
/// back to a separate count.
pub async fn list_events(
    client: &ClickHouseClient,
    filters: &EventFilters,
    offset: usize,
    limit: usize,
) -> Result<(u64, Vec<Event>)> {
    let clause = WhereClause::from_filters(filters);
    let sql = format!(
        "SELECT {}, count() OVER () AS total FROM events{} ORDER BY timestamp DESC, id DESC LIMIT ? OFFSET ?",
        EVENT_COLUMNS,
        clause.sql()
    );

    let rows: Vec<CountedEventRow> = clause
        .bind(client.inner().query(&sql))
        .bind(limit as u64)
        .bind(offset as u64)
        .fetch_all()
        .await
        .map_err(|e| store_error("list", e))?;

    let Some(total) = rows.first().map(|r| r.total) else {
        return Ok((count_events(client, filters).await?, Vec::new()));
    };

    let rows = rows.into_iter().map(|r| r.split().1).collect();
    Ok((total, into_events(rows)))
}

#[derive(Debug, Row, Deserialize)]
struct TotalsRow {
    total_events: u64,
    page_views: u64,
    unique_visitors: u64,
    contact_submissions: u64,
    contact_successful: u64,
    located_events: u64,
}

#[derive(Debug, Row, Deserialize)]
struct KeyCount<K> {
    key: K,
    n: u64,
}

#[derive(Debug, Row, Deserialize)]
struct DailyRow {
    day: String,
    page_views: u64,
    visitors: u64,
}

fn event_type_is(event_type: EventType) -> String {
    format!("event_type = '{}'", event_type.as_str())
}

/// `multiIf` mirroring [`DEVICE_RULES`] in precedence order.
pub fn device_expr() -> String {
    let unknown = format!("'{}'", DeviceType::Unknown.as_str());
    let mut branches = vec!["trimBoth(ifNull(user_agent, '')) = ''".to_string(), unknown.clone()];

    for rule in DEVICE_RULES {
        let tokens: Vec<String> = rule.tokens.iter().map(|t| format!("'{}'", t)).collect();
        branches.push(format!(
            "multiSearchAnyCaseInsensitive(assumeNotNull(user_agent), [{}])",
            tokens.join(", ")
        ));
        branches.push(format!("'{}'", rule.device.as_str()));
    }

    format!("multiIf({}, {})", branches.join(", "), unknown)
}

/// Grouped count ordered by count, ties to the earliest `(timestamp, id)`.
fn ranked_sql(key: &str, clause: &WhereClause, limit: Option<usize>) -> String {
    let limit = limit.map(|n| format!(" LIMIT {}", n)).unwrap_or_default();
    format!(
        "SELECT {} AS key, count() AS n FROM events{} GROUP BY key ORDER BY n DESC, min((timestamp, id)) ASC{}",
        key,
        clause.sql(),
        limit
    )
}

async fn ranked<K>(client: &ClickHouseClient, clause: WhereClause, key: &str, limit: Option<usize>) -> Result<Ranked<K>>
where
    K: DeserializeOwned,
{
    let sql = ranked_sql(key, &clause, limit);
    let rows: Vec<KeyCount<K>> = clause
        .bind(client.inner().query(&sql))
        .fetch_all()
        .await
        .map_err(|e| store_error("rollup", e))?;

    Ok(rows.into_iter().map(|r| (r.key, r.n)).collect())
}

async fn totals(client: &ClickHouseClient, clause: &WhereClause) -> Result<TotalsRow> {
    let contact = event_type_is(EventType::ContactFormSubmission);
    let sql = format!(
        "SELECT count() AS total_events, countIf({page_view}) AS page_views, \
         uniqExact({visitor}) AS unique_visitors, countIf({contact}) AS contact_submissions, \
         countIf({contact} AND JSONExtractBool(data, 'success')) AS contact_successful, \
         countIf(country IS NOT NULL) AS located_events FROM events{where_sql}",
        page_view = event_type_is(EventType::PageView),
        visitor = VISITOR_KEY,
        contact = contact,
        where_sql = clause.sql(),
    );

    clause
        .bind(client.inner().query(&sql))
        .fetch_one()
        .await
        .map_err(|e| store_error("rollup", e))
}

/// Dashboard rollup computed with GROUP BY queries, run concurrently.
pub async fn rollup(client: &ClickHouseClient, filters: &EventFilters, top_n: usize) -> Result<Rollup> {
    let base = WhereClause::from_filters(filters);
    let views = base.clone().and(event_type_is(EventType::PageView));
    let located = base.clone().and("country IS NOT NULL");
    let limit = Some(top_n);
    let device = device_expr();

    let (totals, pages, referrers, devices, hours, event_types, countries, regions, cities) = tokio::try_join!(
        totals(client, &base),
        ranked::<String>(client, views.clone().and("page IS NOT NULL"), "assumeNotNull(page)", limit),
        ranked::<Option<String>>(client, views, REFERRER_KEY, limit),
        ranked::<String>(client, base.clone(), &device, None),
        ranked::<u8>(client, base.clone(), "toHour(timestamp)", None),
        ranked::<String>(client, base.clone(), "toString(event_type)", None),
        ranked::<String>(client, located.clone(), "assumeNotNull(country)", limit),
        ranked::<RegionKey>(
            client,
            located.clone().and("region IS NOT NULL"),
            "tuple(assumeNotNull(region), assumeNotNull(country))",
            limit
        ),
        ranked::<CityKey>(
            client,
            located.and("city IS NOT NULL"),
            "tuple(assumeNotNull(city), region, assumeNotNull(country))",
            limit
        ),
    )?;

    let mut hours: Ranked<u32> = hours.into_iter().map(|(h, n)| (u32::from(h), n)).collect();
    hours.sort_by_key(|(h, _)| *h);

    Ok(Rollup {
        total_events: totals.total_events,
        page_views: totals.page_views,
        unique_visitors: totals.unique_visitors,
        contact_submissions: totals.contact_submissions,
        contact_successful: totals.contact_successful,
        pages,
        referrers,
        devices: devices
            .into_iter()
            .filter_map(|(label, n)| DeviceType::parse(&label).map(|d| (d, n)))
            .collect(),
        hours,
        event_types: event_types
            .into_iter()
            .filter_map(|(name, n)| match EventType::parse(&name) {
                Ok(t) => Some((t, n)),
                Err(_) => {
                    warn!(event_type = %name, "Skipping unknown stored event type");
                    None
                }
            })
            .collect(),
        located_events: totals.located_events,
        countries,
        regions,
        cities,
    })
}

/// Page views and distinct visitors per UTC day.
pub async fn daily(client: &ClickHouseClient, filters: &EventFilters) -> Result<Vec<DailyRollup>> {
    let clause = WhereClause::from_filters(filters);
    let sql = format!(
        "SELECT toString(toDate(timestamp)) AS day, countIf({}) AS page_views, uniqExact({}) AS visitors \
         FROM events{} GROUP BY day ORDER BY day ASC",
        event_type_is(EventType::PageView),
        VISITOR_KEY,
        clause.sql()
    );

    let rows: Vec<DailyRow> = clause
        .bind(client.inner().query(&sql))
        .fetch_all()
        .await
        .map_err(|e| store_error("daily", e))?;

    rows.into_iter()
        .map(|row| {
            let date = NaiveDate::parse_from_str(&row.day, "%Y-%m-%d")
                .map_err(|e| Error::internal(format!("bad day '{}': {}", row.day, e)))?;
            Ok(DailyRollup {
                date,
                page_views: row.page_views,
                visitors: row.visitors,
            })
        })
        .collect()
}

/// Truncate all events (test cleanup).
pub async fn truncate_events(client: &ClickHouseClient) -> Result<()> {
    client
        .inner()
        .query("TRUNCATE TABLE IF EXISTS events")
        .execute()
        .await
        .map_err(|e| store_error("truncate", e))
}

fn into_events(rows: Vec<EventRow>) -> Vec<Event> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id.clone();
            match row.into_event() {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!(event_id = %id, error = %e, "Skipping unreadable event row");
                    None
                }
            }
        })
        .collect()
}
