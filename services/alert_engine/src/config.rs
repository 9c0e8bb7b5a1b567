//! Alert engine configuration (SPEC_FULL §1.1 "Configuration").

use livermore_config::{LogConfig, RedisConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AlertEngineConfig {
    pub exchange_id: String,
    pub redis: RedisConfig,
    pub log: LogConfig,
}

impl Default for AlertEngineConfig {
    fn default() -> Self {
        Self {
            exchange_id: "coinbase".to_string(),
            redis: RedisConfig::default(),
            log: LogConfig::default(),
        }
    }
}
