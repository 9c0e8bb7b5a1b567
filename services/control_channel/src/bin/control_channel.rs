//! Control channel service binary: subscribes to one identity's command
//! channel and drains its priority queue on a single consumer task.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use livermore_cache::{PatternMessage, Store, Subscriber};
use livermore_cache::keys;
use livermore_control_channel::{ControlChannel, ControlChannelConfig, LoggingHandler, StoreResponseSink};
use tokio::signal;
use tracing::info;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "config/control_channel.toml")]
    config: PathBuf,
    #[arg(long)]
    environment: Option<String>,
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config: ControlChannelConfig = livermore_config::load(&cli.config, cli.environment.as_deref())?;

    let level = cli.log_level.as_deref().unwrap_or(&config.log.level).to_string();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(level))
        .init();

    info!(identity_sub = %config.identity_sub, "starting control channel");

    let store = Store::connect(&config.redis.url).await?;
    let channel = Arc::new(ControlChannel::new(config.identity_sub.clone(), LoggingHandler));
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

    info!("control channel running, press Ctrl+C to stop");
    signal::ctrl_c().await?;

    info!("shutdown signal received");
    subscriber.stop().await;
    consumer.abort();
    Ok(())
}
