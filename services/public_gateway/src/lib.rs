//! Public streaming boundary: REST reads plus WebSocket subscriptions over
//! the whitelist transformer (spec §4.9, §6). Nothing outside `rest`/`ws`
//! touches a raw internal `Candle`/`AlertRecord` past this crate's edge.

pub mod channel;
pub mod config;
pub mod cursor;
pub mod error;
pub mod fanout;
pub mod registry;
pub mod rest;
pub mod state;
pub mod ws;

pub use config::PublicGatewayConfig;
pub use state::{AppState, SharedState};
