//! Adapter-layer error taxonomy (spec §7: transient transport and fatal
//! adapter error categories).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("subscribe failed: {0}")]
    SubscribeFailed(String),

    /// Surfaced to the supervisor once backoff is exhausted (spec §4.5
    /// "Max attempts reached surfaces a fatal adapter error").
    #[error("max reconnect attempts ({0}) reached")]
    MaxReconnectAttemptsReached(u32),

    #[error("cache error: {0}")]
    Cache(#[from] livermore_cache::CacheError),
}

pub type Result<T> = std::result::Result<T, AdapterError>;
