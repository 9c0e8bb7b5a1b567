//! Coinbase adapter service binary (spec §4.5, SPEC_FULL §1.1 "CLI/bootstrap").

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use livermore_adapter_core::Adapter;
use livermore_cache::Store;
use livermore_coinbase_adapter::{CoinbaseAdapter, CoinbaseAdapterConfig};
use livermore_types::Timeframe;
use tokio::signal;
use tracing::info;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "config/coinbase_adapter.toml")]
    config: PathBuf,
    #[arg(long)]
    environment: Option<String>,
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config: CoinbaseAdapterConfig = livermore_config::load(&cli.config, cli.environment.as_deref())?;

    let level = cli.log_level.as_deref().unwrap_or(&config.log.level).to_string();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(level))
        .init();

    info!(exchange = %config.exchange_id, "starting coinbase adapter");

    let store = Store::connect(&config.redis.url).await?;
    let symbols = config.symbols.clone();
    let adapter = Arc::new(CoinbaseAdapter::new(config, store));

    adapter.connect().await?;
    adapter.subscribe(&symbols, Timeframe::M5).await?;
    let handle = adapter.clone().spawn();

    info!("coinbase adapter running, press Ctrl+C to stop");
    signal::ctrl_c().await?;

    info!("shutdown signal received");
    adapter.disconnect().await?;
    handle.abort();

    Ok(())
}
