//! Aggregation service binary: subscribes to every 5m candle-close on an
//! exchange and drives `AggregationEngine` off each delivery.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use livermore_aggregation_service::{AggregationEngine, AggregationServiceConfig, StoreBackend};
use livermore_cache::{keys, PatternMessage, Store, Subscriber};
use livermore_types::{Candle, Timeframe};
use tokio::signal;
use tracing::{info, warn};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "config/aggregation_service.toml")]
    config: PathBuf,
    #[arg(long)]
    environment: Option<String>,
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config: AggregationServiceConfig = livermore_config::load(&cli.config, cli.environment.as_deref())?;

    let level = cli.log_level.as_deref().unwrap_or(&config.log.level).to_string();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(level))
        .init();

    info!(exchange = %config.exchange_id, "starting aggregation service");

    let store = Store::connect(&config.redis.url).await?;
    let engine = Arc::new(AggregationEngine::new(StoreBackend { store: store.clone() }, config.exchange_id.clone()));

    let pattern = keys::pattern_candle_close(&config.exchange_id);
    let mut subscriber = Subscriber::new(config.redis.url.clone(), vec![pattern]);
    subscriber
        .start(move |msg: PatternMessage| {
            let engine = engine.clone();
            async move {
                if let Err(e) = dispatch(&engine, &msg).await {
                    warn!(channel = %msg.channel, error = %e, "aggregation: failed to handle candle-close delivery");
                }
            }
        })
        .await?;

    info!("aggregation service running, press Ctrl+C to stop");
    signal::ctrl_c().await?;

    info!("shutdown signal received");
    subscriber.stop().await;
    Ok(())
}

/// Parses `{symbol}:{tf}` out of `channel:exchange:{id}:candle:close:{symbol}:{tf}`
/// and decodes the closed candle from the payload.
async fn dispatch(
    engine: &AggregationEngine<StoreBackend>,
    msg: &PatternMessage,
) -> Result<()> {
    let mut parts = msg.channel.rsplitn(3, ':');
    let tf_str = parts.next().context("missing timeframe segment in channel")?;
    let symbol = parts.next().context("missing symbol segment in channel")?;
    let tf = Timeframe::from_str(tf_str).context("unrecognized timeframe in channel")?;

    let candle: Candle = serde_json::from_str(&msg.payload).context("malformed candle payload")?;
    debug_assert_eq!(candle.timeframe, tf);

    engine.handle_close(symbol, candle.timestamp).await
}
