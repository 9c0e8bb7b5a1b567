//! Public gateway configuration (SPEC_FULL §1.1 "Configuration").

use livermore_config::{LogConfig, RedisConfig};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PublicGatewayConfig {
    pub exchange_id: String,
    /// Bound to its own port/prefix, separate from the internal control
    /// plane (spec §4.9).
    pub bind_addr: String,
    pub redis: RedisConfig,
    pub log: LogConfig,
    /// Per-API-key connection cap (spec §4.9, default 5).
    pub max_connections_per_key: usize,
    /// Heartbeat ping interval in seconds (spec §4.9, default 30s).
    pub heartbeat_secs: u64,
    /// Outbound buffer thresholds in bytes (spec §4.9/§9).
    pub backpressure_skip_bytes: usize,
    pub backpressure_terminate_bytes: usize,
}

impl Default for PublicGatewayConfig {
    fn default() -> Self {
        Self {
            exchange_id: "coinbase".to_string(),
            bind_addr: "0.0.0.0:8090".to_string(),
            redis: RedisConfig::default(),
            log: LogConfig::default(),
            max_connections_per_key: 5,
            heartbeat_secs: 30,
            backpressure_skip_bytes: 64 * 1024,
            backpressure_terminate_bytes: 256 * 1024,
        }
    }
}
