//! ClickHouse connectivity and schema bootstrap.

use crate::client::ClickHouseClient;
use crate::schema::all_statements;
use analytics_core::{Error, Result, StoreErrorCode};
use tracing::{debug, error};

/// Check ClickHouse connection health.
pub async fn check_connection(client: &ClickHouseClient) -> Result<()> {
    client
        .inner()
        .query("SELECT 1")
        .fetch_one::<u8>()
        .await
        .map(|_| debug!("ClickHouse connection healthy"))
        .map_err(|e| {
            error!(error = %e, "ClickHouse health check failed");
            Error::store(StoreErrorCode::Unavailable, format!("ping failed: {}", e))
        })
}

/// Create the database and tables if they do not exist.
pub async fn init_schema(client: &ClickHouseClient) -> Result<()> {
    let server = client.server();

    for ddl in all_statements(&client.config().database) {
        server.query(&ddl).execute().await.map_err(|e| {
            Error::store(StoreErrorCode::Unavailable, format!("failed to execute DDL: {}", e))
        })?;
    }

    debug!(database = %client.config().database, "ClickHouse schema initialized");
    Ok(())
}
