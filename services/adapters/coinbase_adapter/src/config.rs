//! Coinbase adapter configuration (spec §4.5, SPEC_FULL §1.1 "Configuration").

use livermore_config::{LogConfig, RedisConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CoinbaseAdapterConfig {
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

impl Default for CoinbaseAdapterConfig {
    fn default() -> Self {
        Self {
            exchange_id: "coinbase".to_string(),
            ws_url: "wss://advanced-trade-ws.coinbase.com".to_string(),
            symbols: vec!["BTC-USD".to_string(), "ETH-USD".to_string()],
            watchdog_secs: 30,
            backoff_initial_ms: 250,
            backoff_cap_secs: 5,
            max_reconnect_attempts: 10,
            redis: RedisConfig::default(),
            log: LogConfig::default(),
        }
    }
}
