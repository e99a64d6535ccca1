//! HIP-3 oracle pusher - entry point.
//!
//! Subscribes to a Stork price feed and pushes oracle, mark, and external
//! price sets to a builder-deployed Hyperliquid dex on a fixed cadence.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// HIP-3 oracle price pusher
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via HIP3_PUSHER_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize TLS crypto provider (must be before any WS connections)
    pusher_feed::init_crypto();

    let args = Args::parse();

    pusher_agent::init_logging()?;

    info!("Starting hip3-pusher v{}", env!("CARGO_PKG_VERSION"));

    // Config path: CLI arg > HIP3_PUSHER_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("HIP3_PUSHER_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");
    let config = pusher_agent::AppConfig::from_file(&config_path)?;
    info!(
        dex = %config.dex.name,
        testnet = config.dex.testnet,
        markets = config.markets.len(),
        "Configuration loaded"
    );

    let app = pusher_agent::Application::new(config);
    app.run().await?;

    Ok(())
}
