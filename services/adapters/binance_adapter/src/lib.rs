//! Binance Spot exchange adapter (spec §4.5 — "supplement" content: the
//! component table names Binance Spot explicitly alongside Coinbase).

pub mod adapter;
pub mod config;
pub mod wire;

pub use adapter::BinanceAdapter;
pub use config::BinanceAdapterConfig;
