//! Adapter connection state machine (spec §4.5 "States").

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// Connected and subscribed — distinct from `Connected` only for
    /// observability; both accept inbound frames.
    Subscribed,
    Disconnecting,
    /// Transient state between `Connected` and `Connecting` entered only
    /// when the socket drops and the close was not intentional (spec §4.5).
    Reconnecting,
}

impl ConnectionState {
    /// True once the socket is up, whether or not subscriptions have been
    /// (re-)sent yet.
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected | ConnectionState::Subscribed)
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        ConnectionState::Disconnected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribed_counts_as_connected() {
        assert!(ConnectionState::Subscribed.is_connected());
        assert!(!ConnectionState::Reconnecting.is_connected());
    }
}
