//! Alert engine service binary: subscribes to every MACD-V indicator
//! update on an exchange and drives `AlertEngine` off each delivery.

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Parser;
use livermore_alert_engine::{AlertEngine, AlertEngineConfig, LoggingSink, StoreBackend};
use livermore_cache::{keys, PatternMessage, Store, Subscriber};
use livermore_types::{MacdVValue, Timeframe};
use tokio::signal;
use tracing::{info, warn};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "config/alert_engine.toml")]
    config: PathBuf,
    #[arg(long)]
    environment: Option<String>,
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config: AlertEngineConfig = livermore_config::load(&cli.config, cli.environment.as_deref())?;

    let level = cli.log_level.as_deref().unwrap_or(&config.log.level).to_string();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(level))
        .init();

    info!(exchange = %config.exchange_id, "starting alert engine");

    let store = Store::connect(&config.redis.url).await?;
    let engine = std::sync::Arc::new(AlertEngine::new(
        StoreBackend { store: store.clone() },
        Box::new(LoggingSink),
        config.exchange_id.clone(),
    ));

    let pattern = keys::pattern_indicator(&config.exchange_id, "macd-v");
    let mut subscriber = Subscriber::new(config.redis.url.clone(), vec![pattern]);
    subscriber
        .start(move |msg: PatternMessage| {
            let engine = engine.clone();
            async move {
                if let Err(e) = dispatch(&engine, &msg).await {
                    warn!(channel = %msg.channel, error = %e, "alert engine: failed to handle indicator delivery");
                }
            }
        })
        .await?;

    info!("alert engine running, press Ctrl+C to stop");
    signal::ctrl_c().await?;

    info!("shutdown signal received");
    subscriber.stop().await;
    Ok(())
}

async fn dispatch(engine: &AlertEngine<StoreBackend>, msg: &PatternMessage) -> Result<()> {
    let mut parts = msg.channel.rsplitn(3, ':');
    let tf_str = parts.next().context("missing timeframe segment in channel")?;
    let symbol = parts.next().context("missing symbol segment in channel")?;
    let tf = Timeframe::from_str(tf_str).context("unrecognized timeframe in channel")?;

    let value: MacdVValue = serde_json::from_str(&msg.payload).context("malformed indicator payload")?;
    engine.handle_indicator_update(symbol, tf, value).await
}
