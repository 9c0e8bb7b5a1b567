//! Shared exchange adapter lifecycle (spec §4.5).
//!
//! Generalizes the per-exchange connect/subscribe/disconnect lifecycle, the
//! watchdog/backoff reconnect machinery, and the recorded-subscription
//! bookkeeping so `coinbase_adapter` and `binance_adapter` only implement
//! message parsing and the native wire protocol.

pub mod backoff;
pub mod error;
pub mod state;
pub mod subscriptions;
pub mod watchdog;

pub use backoff::{BackoffConfig, ExponentialBackoff};
pub use error::{AdapterError, Result};
pub use state::ConnectionState;
pub use subscriptions::SubscriptionRegistry;
pub use watchdog::Watchdog;

use async_trait::async_trait;
use livermore_types::Timeframe;

/// Capability set every exchange adapter implements (spec §4.5).
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Open the WebSocket, authenticate if required, begin the watchdog.
    async fn connect(&self) -> Result<()>;

    /// Send subscribe frames for the native candle and ticker channels;
    /// record them for resubscribe on reconnect.
    async fn subscribe(&self, symbols: &[String], timeframe: Timeframe) -> Result<()>;

    /// Mirror of `subscribe`.
    async fn unsubscribe(&self, symbols: &[String]) -> Result<()>;

    /// Mark as an intentional close (skips reconnection logic) and close
    /// the socket.
    async fn disconnect(&self) -> Result<()>;

    fn health(&self) -> AdapterHealth;
}

#[derive(Debug, Clone)]
pub struct AdapterHealth {
    pub state: ConnectionState,
    pub messages_processed: u64,
    pub reconnect_attempts: u32,
    pub last_error: Option<String>,
}

impl Default for AdapterHealth {
    fn default() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            messages_processed: 0,
            reconnect_attempts: 0,
            last_error: None,
        }
    }
}
