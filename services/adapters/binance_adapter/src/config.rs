//! Binance Spot adapter configuration (spec §4.5).

use livermore_config::{LogConfig, RedisConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BinanceAdapterConfig {
    pub exchange_id: String,
    pub ws_url: String,
    pub symbols: Vec<String>,
    pub watchdog_secs: u64,
    pub backoff_initial_ms: u64,
    pub backoff_cap_secs: u64,
    pub max_reconnect_attempts: u32,
    pub redis: RedisConfig,
    pub log: LogConfig,
}

impl Default for BinanceAdapterConfig {
    fn default() -> Self {
        Self {
            exchange_id: "binance".to_string(),
            ws_url: "wss://stream.binance.com:9443/stream".to_string(),
            symbols: vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()],
            watchdog_secs: 30,
            backoff_initial_ms: 250,
            backoff_cap_secs: 5,
            max_reconnect_attempts: 10,
            redis: RedisConfig::default(),
            log: LogConfig::default(),
        }
    }
}
