//! Supervisor service binary (spec §4.8, SPEC_FULL §1.1 "CLI/bootstrap").
//!
//! Owns one exchange adapter end to end: builds it from config, connects
//! and subscribes it, then drains its identity's control-channel commands
//! against the service registry for the lifetime of the process.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tracing::info;

use livermore_adapter_core::Adapter;
use livermore_cache::{keys, PatternMessage, Store, Subscriber};
use livermore_control_channel::{ControlChannel, StoreResponseSink};
use livermore_supervisor::{build_adapter, ServiceRegistry, SupervisorCommandHandler, SupervisorConfig};
use livermore_types::Timeframe;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "config/supervisor.toml")]
    config: PathBuf,
    #[arg(long)]
    environment: Option<String>,
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config: SupervisorConfig = livermore_config::load(&cli.config, cli.environment.as_deref())?;

    let level = cli.log_level.as_deref().unwrap_or(&config.log.level).to_string();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(level))
        .init();

    info!(identity_sub = %config.identity_sub, exchange = %config.exchange_id, "starting supervisor");

    let store = Store::connect(&config.redis.url).await?;
    let symbols = config.adapter_symbols();
    let default_timeframe: Timeframe = config.default_timeframe;

    let (adapter, runner) = build_adapter(&config, store.clone());
    adapter.connect().await?;
    adapter.subscribe(&symbols, default_timeframe).await?;

    let registry = Arc::new(ServiceRegistry::new(&config, adapter.clone(), runner, store.clone()));
    let handler = SupervisorCommandHandler::new(registry.clone());
    let channel = Arc::new(ControlChannel::new(config.identity_sub.clone(), handler));
    let responses = Arc::new(StoreResponseSink { store: store.clone() });

    let consumer_channel = channel.clone();
    let consumer_responses = responses.clone();
    let consumer = tokio::spawn(async move {
        consumer_channel.run_consumer(consumer_responses.as_ref()).await;
    });

    let command_channel = keys::channel_commands(&config.identity_sub);
    let mut subscriber = Subscriber::new(config.redis.url.clone(), vec![command_channel]);
    subscriber
        .start(move |msg: PatternMessage| {
            let channel = channel.clone();
            let responses = responses.clone();
            async move {
                let now_ms = chrono::Utc::now().timestamp_millis();
                channel.ingest(&msg.payload, now_ms, responses.as_ref()).await;
            }
        })
        .await?;

    info!("supervisor running, press Ctrl+C to stop");
    signal::ctrl_c().await?;

    info!("shutdown signal received");
    subscriber.stop().await;
    consumer.abort();
    registry.shutdown().await?;
    Ok(())
}
