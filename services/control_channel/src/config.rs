//! Control channel configuration (SPEC_FULL §1.1 "Configuration").

use livermore_config::{LogConfig, RedisConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ControlChannelConfig {
    pub identity_sub: String,
    pub redis: RedisConfig,
    pub log: LogConfig,
}

impl Default for ControlChannelConfig {
    fn default() -> Self {
        Self {
            identity_sub: "default".to_string(),
            redis: RedisConfig::default(),
            log: LogConfig::default(),
        }
    }
}
