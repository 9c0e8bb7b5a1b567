//! Single-subscriber-per-identity priority command queue (spec §4.8).

pub mod backend;
pub mod command;
pub mod config;
pub mod engine;
pub mod handler;
pub mod queue;

pub use backend::StoreResponseSink;
pub use command::{Command, CommandType, Response, ResponseStatus};
pub use config::ControlChannelConfig;
pub use engine::{ControlChannel, ResponseSink, MAX_COMMAND_AGE_MS};
pub use handler::{CommandHandler, LoggingHandler};
