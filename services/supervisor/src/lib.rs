//! Glue: adapter factory, runtime service registry, and the control
//! channel's command effects (spec §4.8 table; component 11 "startup,
//! lifecycle, registry").

pub mod config;
pub mod handler;
pub mod registry;

pub use config::SupervisorConfig;
pub use handler::SupervisorCommandHandler;
pub use registry::{build_adapter, AdapterRunner, RuntimeMode, ServiceRegistry};
