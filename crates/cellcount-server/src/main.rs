//! Counts API entry point.
//!
//! Loads `cellcount.yaml` (path overridable with `CELLCOUNT_CONFIG`),
//! connects to `PostgreSQL`, applies migrations, and serves the counts API
//! until `Ctrl-C`.

use std::path::Path;
use std::sync::Arc;

use cellcount_core::CountsConfig;
use cellcount_db::{CountStore, PostgresConfig, PostgresPool};
use cellcount_geo::{S2Cells, S2Coverer};
use cellcount_server::{AppState, ServerConfig, start_server};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, the database connection, or the
/// server fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("cellcount-server starting");

    let path = std::env::var("CELLCOUNT_CONFIG").unwrap_or_else(|_| "cellcount.yaml".to_owned());
    let config = if Path::new(&path).exists() {
        CountsConfig::from_file(Path::new(&path))?
    } else {
        info!(path, "Config file not found, using defaults");
        CountsConfig::parse("{}")?
    };
    let pipeline = config.pipeline.to_pipeline_config();
    info!(
        workers = pipeline.workers,
        queue_capacity = pipeline.queue_capacity,
        deadline_ms = config.pipeline.deadline_ms,
        default_precision = config.geometry.default_precision,
        max_cells = config.geometry.max_cells,
        "Configuration loaded"
    );

    let pool = PostgresPool::connect(&PostgresConfig::from(&config.infrastructure)).await?;
    pool.run_migrations().await?;

    let state = Arc::new(AppState::new(
        Arc::new(CountStore::new(&pool)),
        Arc::new(S2Cells),
        Arc::new(S2Coverer::new(config.geometry.max_cells)),
        &config,
    )?);

    let server = ServerConfig {
        host: config.infrastructure.host.clone(),
        port: config.infrastructure.port,
    };
    let served = start_server(&server, state).await;

    pool.close().await;
    served?;
    Ok(())
}
