//! Public gateway service binary (spec §4.9, SPEC_FULL §1.1 "CLI/bootstrap").

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tracing::info;

use livermore_cache::Store;
use livermore_public_gateway::fanout::spawn_fanout;
use livermore_public_gateway::registry::InMemoryRegistry;
use livermore_public_gateway::{AppState, PublicGatewayConfig};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "config/public_gateway.toml")]
    config: PathBuf,
    #[arg(long)]
    environment: Option<String>,
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config: PublicGatewayConfig = livermore_config::load(&cli.config, cli.environment.as_deref())?;

    let level = cli.log_level.as_deref().unwrap_or(&config.log.level).to_string();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(level))
        .init();

    info!(exchange = %config.exchange_id, bind = %config.bind_addr, "starting public gateway");

    let store = Store::connect(&config.redis.url).await?;
    let registry = Arc::new(InMemoryRegistry::new());
    let state = AppState::new(store, registry, config.clone());

    let mut subscriber = spawn_fanout(config.redis.url.clone(), config.exchange_id.clone(), state.events.clone()).await?;

    let app = livermore_public_gateway::rest::router(state.clone());
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;

    info!("public gateway listening, press Ctrl+C to stop");
    let serve = axum::serve(listener, app);

    tokio::select! {
        result = serve => {
            if let Err(e) = result {
                tracing::error!(error = %e, "public gateway: server exited with error");
            }
        }
        _ = signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    subscriber.stop().await;
    Ok(())
}
