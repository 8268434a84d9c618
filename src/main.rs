//! Site Analytics Service
//!
//! Event ingestion and dashboard metrics for the personal site:
//! - Single-event ingestion with a fast acknowledgment
//! - Geolocation enrichment with a bounded lookup
//! - Periodic batched writes to the event store
//! - Cached aggregate, real-time and raw-event queries

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};

use analytics::{AggregationConfig, CacheConfig, Dashboard, MetricsCache, RealtimeConfig};
use api::{router, AppState};
use enrichment::{GeoConfig, GeoEnricher};
use event_store::StoreConfig;
use ingestion::{IngestionConfig, IngestionService};
use telemetry::{health, init_tracing_from_env};

/// Application configuration.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct Config {
    #[serde(default)]
    server: ServerConfig,
    #[serde(default)]
    store: StoreConfig,
    #[serde(default)]
    ingestion: IngestionConfig,
    #[serde(default)]
    geo: GeoConfig,
    #[serde(default)]
    cache: CacheConfig,
    #[serde(default)]
    aggregation: AggregationConfig,
    #[serde(default)]
    realtime: RealtimeConfig,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct ServerConfig {
    #[serde(default = "default_host")]
    host: String,
    #[serde(default = "default_port")]
    port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    init_tracing_from_env();

    info!("Starting Site Analytics v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;

    info!(
        backend = ?config.store.backend,
        flush_interval_ms = config.ingestion.flush_interval_ms,
        geo_enabled = config.geo.enabled,
        "Loaded configuration"
    );

    let store = event_store::connect(&config.store)
        .await
        .context("Failed to connect to event store")?;

    if event_store::probe(store.as_ref()).await {
        info!("Event store connection: healthy");
    } else {
        error!("Event store connection: unhealthy");
    }

    let enricher = Arc::new(GeoEnricher::from_config(&config.geo).context("Failed to create geolocation client")?);
    health().geo.set_healthy();
    if !enricher.is_enabled() {
        warn!("Geolocation enrichment disabled");
    }

    let cache = Arc::new(MetricsCache::new(&config.cache));

    let ingestion = Arc::new(IngestionService::new(
        store.clone(),
        enricher,
        cache.clone(),
        config.ingestion.clone(),
    ));
    ingestion.start();

    let dashboard = Dashboard::new(store, cache, config.aggregation.clone(), config.realtime.clone());

    let app = router(AppState::new(ingestion.clone(), dashboard));

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;

    info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down...");

    // Persist whatever is still buffered
    let outcome = ingestion.shutdown().await;
    info!(?outcome, "Shutdown complete");

    Ok(())
}

/// Load configuration from defaults, an optional file, and `ANALYTICS__*`
/// environment variables.
fn load_config() -> Result<Config> {
    let config = config::Config::builder()
        .add_source(config::Config::try_from(&Config::default())?)
        .add_source(
            config::File::with_name("config/default")
                .required(false)
                .format(config::FileFormat::Toml),
        )
        // e.g. ANALYTICS__STORE__BACKEND=clickhouse
        .add_source(
            config::Environment::default()
                .separator("__")
                .prefix("ANALYTICS")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install terminate handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }
}
