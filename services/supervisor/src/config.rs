//! Supervisor configuration (SPEC_FULL §1.1 "Configuration"). Picks which
//! exchange adapter the factory builds; the adapter's own config section
//! carries its symbols, backoff, and watchdog settings untouched.

use livermore_binance_adapter::BinanceAdapterConfig;
use livermore_coinbase_adapter::CoinbaseAdapterConfig;
use livermore_config::{LogConfig, RedisConfig};
use livermore_types::Timeframe;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AdapterKindConfig {
    Coinbase(CoinbaseAdapterConfig),
    Binance(BinanceAdapterConfig),
}

impl Default for AdapterKindConfig {
    fn default() -> Self {
        AdapterKindConfig::Coinbase(CoinbaseAdapterConfig::default())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Must match the identity the control channel's command/response
    /// channels are keyed on (spec §4.8).
    pub identity_sub: String,
    pub exchange_id: String,
    pub adapter: AdapterKindConfig,
    /// Candles are subscribed at this timeframe; aggregation derives the
    /// rest (spec §4.6).
    pub default_timeframe: Timeframe,
    pub redis: RedisConfig,
    pub log: LogConfig,
}

impl SupervisorConfig {
    /// Symbols the chosen adapter's own config section lists at startup.
    pub fn adapter_symbols(&self) -> Vec<String> {
        match &self.adapter {
            AdapterKindConfig::Coinbase(c) => c.symbols.clone(),
            AdapterKindConfig::Binance(c) => c.symbols.clone(),
        }
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            identity_sub: "default".to_string(),
            exchange_id: "coinbase".to_string(),
            adapter: AdapterKindConfig::default(),
            default_timeframe: Timeframe::M5,
            redis: RedisConfig::default(),
            log: LogConfig::default(),
        }
    }
}
