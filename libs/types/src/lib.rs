//! # Livermore Shared Types
//!
//! Shared vocabulary for the Livermore market-data pipeline: the candle,
//! ticker, indicator, and alert data model (spec §3), the domain error
//! taxonomy components map onto when they surface user-facing failures
//! (spec §7), and the whitelisted public envelopes the streaming boundary
//! serializes (spec §6, §4.9).
//!
//! Every other crate in the workspace depends on this one; it depends on
//! nothing workspace-internal.

pub mod envelope;
pub mod error;
pub mod exchange;
pub mod model;
pub mod timeframe;

pub use error::DomainError;
pub use exchange::{ClassifiedSymbol, ExchangeDescriptor, SymbolTier};
pub use model::{AlertRecord, Candle, MacdVValue, Ticker};
pub use timeframe::Timeframe;

pub type Result<T> = std::result::Result<T, DomainError>;
