//! Layered TOML + environment-variable configuration loader shared by every
//! service binary (spec §4.8's `config path and log-level override` CLI
//! surface; SPEC_FULL §1.1 "Configuration").
//!
//! Each service crate defines its own `Config` struct (with a `Default`
//! impl) and calls [`load`] with a base TOML path and an optional
//! environment name; this crate supplies the layering and env-var override
//! machinery only, not any service-specific schema.

pub mod common;
pub mod loader;

pub use common::{LogConfig, RedisConfig};
pub use loader::load;
