//! ClickHouse client wrapper.

use crate::config::ClickHouseConfig;
use clickhouse::Client;
use tracing::info;

/// ClickHouse client bound to the configured database.
#[derive(Clone)]
pub struct ClickHouseClient {
    inner: Client,
    config: ClickHouseConfig,
}

impl ClickHouseClient {
    pub fn new(config: ClickHouseConfig) -> Self {
        let inner = connect(&config).with_database(&config.database);

        info!(
            url = %config.url,
            database = %config.database,
            "Created ClickHouse client"
        );

        Self { inner, config }
    }

    /// Returns the inner clickhouse client.
    pub fn inner(&self) -> &Client {
        &self.inner
    }

    /// Client with no default database, for DDL that creates it.
    pub fn server(&self) -> Client {
        connect(&self.config)
    }

    pub fn config(&self) -> &ClickHouseConfig {
        &self.config
    }
}

fn connect(config: &ClickHouseConfig) -> Client {
    let mut client = Client::default().with_url(&config.url);

    if let Some(ref user) = config.username {
        client = client.with_user(user);
    }

    if let Some(ref pass) = config.password {
        client = client.with_password(pass);
    }

    client
}
