//! SheSecure API - Main Entry Point

use anyhow::Context;
use api::{init_logging, run_server, ApiConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::load().context("failed to load configuration")?;
    init_logging(&config)?;

    info!("=== SheSecure API v{} ===", env!("CARGO_PKG_VERSION"));

    run_server(config).await
}
