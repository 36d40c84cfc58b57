//! MachineGuard - Main Entry Point
//!
//! Loads the maintenance classifier, then serves the prediction form and API
//! until interrupted.

use anyhow::Result;
use machine_guard::{
    config::{AppConfig, LogFormat, LoggingConfig},
    http::{self, AppState},
    metrics::{MetricsReporter, ServiceMetrics},
    PredictionService,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;

    init_logging(&config.logging)?;
    info!("Starting MachineGuard");
    info!(
        model = %config.model.path,
        log = %config.prediction_log.path,
        bind_addr = %config.server.bind_addr,
        "Configuration loaded successfully"
    );

    let metrics = Arc::new(ServiceMetrics::new());

    // Without a model there is nothing to serve
    let service = match PredictionService::from_config(&config, metrics.clone()) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            error!(error = %format!("{:#}", e), "Failed to initialize prediction service");
            return Err(e);
        }
    };

    if config.metrics.report_interval_secs > 0 {
        let metrics = metrics.clone();
        let interval = config.metrics.report_interval_secs;
        tokio::spawn(async move {
            MetricsReporter::new(metrics, interval).start().await;
        });
    }

    let state = AppState { service };
    http::serve(&config.server.bind_addr, state, shutdown_signal()).await?;

    info!("MachineGuard shutting down...");
    metrics.print_summary();

    Ok(())
}

/// `RUST_LOG` wins over the configured level
fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(format!(
            "machine_guard={level},tower_http={level}",
            level = config.level
        )),
    };

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);
    match config.format {
        LogFormat::Json => subscriber.json().try_init(),
        LogFormat::Pretty => subscriber.try_init(),
    }
    .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
