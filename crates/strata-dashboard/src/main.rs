//! Dashboard binary for the Strata simulation monitor.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `strata-config.yaml` (or `$STRATA_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Spawn the upstream client, ingest, render loop and HTTP server
//! 4. Wait for `Ctrl-C`
//! 5. Shut everything down

use strata_dashboard::config::{DashboardConfig, LoggingConfig};
use strata_dashboard::startup::spawn_dashboard;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Application entry point for the dashboard.
///
/// # Errors
///
/// Returns an error if configuration cannot be loaded or the dashboard
/// cannot be started.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let (config, config_path) = DashboardConfig::load()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);

    info!("strata-dashboard starting");
    match &config_path {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!("Config file not found, using defaults"),
    }
    info!(
        port = config.server.port,
        upstream_enabled = config.upstream.enabled,
        width = config.render.width,
        height = config.render.height,
        target_fps = config.render.target_fps,
        "Dashboard configuration"
    );

    // 3. Spawn everything.
    let services = spawn_dashboard(&config)?;

    // 4. Run until interrupted.
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    // 5. Stop.
    services.shutdown().await;
    info!("strata-dashboard shutdown complete");

    Ok(())
}

/// Install the global subscriber. `RUST_LOG` wins over the configured
/// level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}
