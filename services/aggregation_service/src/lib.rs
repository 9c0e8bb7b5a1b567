//! Timeframe aggregation + MACD-V indicator service (spec §4.6).
//!
//! Subscribes to 5-minute candle-close events, recomputes the 5m indicator
//! directly, and rolls 5m candles up into any higher timeframe the close
//! just completed (spec §4.2, §4.6).

pub mod backend;
pub mod config;
pub mod engine;

pub use backend::{IndicatorCache, StoreBackend};
pub use config::AggregationServiceConfig;
pub use engine::AggregationEngine;
