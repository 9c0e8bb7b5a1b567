//! Shared application state handed to every axum handler (spec §4.9).

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::broadcast;

use livermore_cache::Store;

use crate::config::PublicGatewayConfig;
use crate::fanout::GatewayEvent;
use crate::registry::MetadataRegistry;

/// Broadcast capacity: generous enough that a momentarily slow session
/// doesn't force-lag the whole fanout under normal load (spec §4.9
/// backpressure is enforced per-session on the outbound socket, not here).
const EVENT_BUS_CAPACITY: usize = 4096;

pub struct AppState {
    pub store: Store,
    pub registry: Arc<dyn MetadataRegistry>,
    pub config: PublicGatewayConfig,
    pub events: broadcast::Sender<GatewayEvent>,
    /// Open connection count per API key (spec §4.9 "per-API-key connection
    /// cap, default 5").
    pub connections_per_key: DashMap<String, usize>,
}

impl AppState {
    pub fn new(store: Store, registry: Arc<dyn MetadataRegistry>, config: PublicGatewayConfig) -> Arc<Self> {
        let (events, _rx) = broadcast::channel(EVENT_BUS_CAPACITY);
        Arc::new(Self {
            store,
            registry,
            config,
            events,
            connections_per_key: DashMap::new(),
        })
    }

    /// Reserve a connection slot for `api_key`. Returns `false` (and leaves
    /// the count untouched) if the key is already at its cap.
    pub fn try_acquire_connection(&self, api_key: &str) -> bool {
        let mut entry = self.connections_per_key.entry(api_key.to_string()).or_insert(0);
        if *entry >= self.config.max_connections_per_key {
            return false;
        }
        *entry += 1;
        true
    }

    pub fn release_connection(&self, api_key: &str) {
        if let Some(mut entry) = self.connections_per_key.get_mut(api_key) {
            *entry = entry.saturating_sub(1);
        }
    }
}

pub type SharedState = Arc<AppState>;
