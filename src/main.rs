//! Lettermint webhook receiver.
//!
//! Main entry point for the stand-alone server. Verifies signed Lettermint
//! deliveries and records every decoded event through `tracing`.

use std::sync::Arc;

use anyhow::{Context, Result};
use lettermint_api::{create_router, start_server, Config};
use lettermint_core::LoggingEventHandler;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("Starting Lettermint webhook receiver");

    let config = Config::load()?;
    info!(config = ?config.redacted(), "Configuration loaded");

    let addr = config.parse_server_addr()?;
    let router = create_router(&config, Arc::new(LoggingEventHandler::new()))
        .context("Failed to build webhook router")?;

    info!(
        addr = %addr,
        route = %config.webhook_config().route_path(),
        "Lettermint is ready to receive webhooks"
    );

    start_server(router, addr).await.context("HTTP server failed")?;

    info!("Lettermint shutdown complete");
    Ok(())
}

/// Initializes tracing with environment-based configuration.
fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,lettermint=debug,tower_http=debug"));

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}
