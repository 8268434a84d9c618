//! ClickHouse DDL.
//!
//! One append-only `events` table. Geo columns are flattened so dashboard
//! queries never need to parse the JSON `data` blob.

/// SQL for creating the database.
pub fn create_database(database: &str) -> String {
    format!("CREATE DATABASE IF NOT EXISTS {database}")
}

/// SQL for creating the events table.
pub fn create_events_table(database: &str) -> String {
    format!(
        r#"
CREATE TABLE IF NOT EXISTS {database}.events (
    id String,
    event_type LowCardinality(String),
    page Nullable(String),
    referrer Nullable(String),
    user_agent Nullable(String),
    ip_address Nullable(String),
    session_id Nullable(String),
    user_id Nullable(String),

    -- Per-type payload as JSON
    data String,

    timestamp DateTime64(3, 'UTC'),

    -- Geo enrichment
    country LowCardinality(Nullable(String)),
    region Nullable(String),
    city Nullable(String),
    latitude Nullable(Float64),
    longitude Nullable(Float64)
)
ENGINE = MergeTree()
PARTITION BY toYYYYMM(timestamp)
ORDER BY (timestamp, id)
SETTINGS index_granularity = 8192
"#
    )
}

/// All DDL statements in execution order.
pub fn all_statements(database: &str) -> Vec<String> {
    vec![create_database(database), create_events_table(database)]
}
