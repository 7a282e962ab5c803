//! Brevo lead server - Main entry point

use anyhow::Result;
use brevo_lead_server::{run_server, AppState, Config};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Loaded before logging so LOG_LEVEL can come from .env
    let config = Config::from_env();

    let level = config
        .as_ref()
        .map(|c| c.log_level.clone())
        .unwrap_or_else(|_| Config::default().log_level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match config {
        Ok(cfg) => {
            info!("Configuration loaded successfully");
            cfg
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    info!(
        api_url = %config.brevo_api_url,
        list_id = config.list_id,
        phone_strategy = %config.phone_strategy,
        "Starting Brevo lead server"
    );

    let state = AppState::from_config(config);
    run_server(state).await?;

    info!("Brevo lead server shutdown complete");
    Ok(())
}
