//! Tiered cache & pub/sub layer (spec §3, §4.3, §4.4).
//!
//! `keys` is the sole key-string constructor; `store` is the typed façade
//! over the Redis-shaped sorted-set/string store; `pubsub` holds the
//! dedicated-connection pattern-subscribe machinery. No other crate in the
//! workspace talks to Redis directly.

pub mod error;
pub mod keys;
pub mod pubsub;
pub mod store;

pub use error::{CacheError, Result};
pub use pubsub::{PatternMessage, Subscriber};
pub use store::Store;
