//! Exchange/symbol metadata seam. Spec §1 treats the relational metadata
//! store for users/exchanges/symbols as an external collaborator; this
//! trait is the boundary the REST handlers call through, with an
//! in-memory, read-mostly cache as the default implementation (spec §3
//! "Read-mostly; lookup by name or id, cached in memory").

use async_trait::async_trait;
use dashmap::DashMap;
use livermore_types::exchange::{ClassifiedSymbol, ExchangeDescriptor};

#[async_trait]
pub trait MetadataRegistry: Send + Sync {
    async fn exchange_by_id(&self, id: &str) -> Option<ExchangeDescriptor>;
    async fn list_exchanges(&self) -> Vec<ExchangeDescriptor>;
    async fn symbols_for_exchange(&self, exchange_id: &str) -> Vec<ClassifiedSymbol>;
}

/// In-memory registry, refreshed wholesale by whatever startup/reload path
/// owns the real metadata-store round trip (spec §4.8 `reload-settings`).
#[derive(Default)]
pub struct InMemoryRegistry {
    exchanges: DashMap<String, ExchangeDescriptor>,
    symbols: DashMap<String, Vec<ClassifiedSymbol>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert_exchange(&self, descriptor: ExchangeDescriptor) {
        self.exchanges.insert(descriptor.id.clone(), descriptor);
    }

    pub fn set_symbols(&self, exchange_id: impl Into<String>, symbols: Vec<ClassifiedSymbol>) {
        self.symbols.insert(exchange_id.into(), symbols);
    }
}

#[async_trait]
impl MetadataRegistry for InMemoryRegistry {
    async fn exchange_by_id(&self, id: &str) -> Option<ExchangeDescriptor> {
        self.exchanges.get(id).map(|e| e.clone())
    }

    async fn list_exchanges(&self) -> Vec<ExchangeDescriptor> {
        self.exchanges.iter().map(|e| e.clone()).collect()
    }

    async fn symbols_for_exchange(&self, exchange_id: &str) -> Vec<ClassifiedSymbol> {
        self.symbols.get(exchange_id).map(|s| s.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livermore_types::exchange::{ApiLimits, FeeSchedule, SymbolTier};
    use livermore_types::Timeframe;

    fn descriptor() -> ExchangeDescriptor {
        ExchangeDescriptor {
            id: "coinbase".to_string(),
            name: "coinbase".to_string(),
            display_name: "Coinbase".to_string(),
            ws_url: "wss://advanced-trade-ws.coinbase.com".to_string(),
            rest_url: "https://api.coinbase.com".to_string(),
            supported_timeframes: vec![Timeframe::M5, Timeframe::M15],
            api_limits: ApiLimits { requests_per_second: 10, max_subscriptions: 100 },
            fee_schedule: FeeSchedule { maker_bps: 40.0, taker_bps: 60.0 },
            is_active: true,
        }
    }

    #[tokio::test]
    async fn round_trips_exchange_lookup() {
        let registry = InMemoryRegistry::new();
        registry.upsert_exchange(descriptor());
        let found = registry.exchange_by_id("coinbase").await.unwrap();
        assert_eq!(found.display_name, "Coinbase");
        assert_eq!(registry.list_exchanges().await.len(), 1);
    }

    #[tokio::test]
    async fn symbols_default_to_empty_for_unknown_exchange() {
        let registry = InMemoryRegistry::new();
        assert!(registry.symbols_for_exchange("nope").await.is_empty());
    }

    #[tokio::test]
    async fn classified_symbol_tier_excluded_is_not_tracked() {
        let symbol = ClassifiedSymbol {
            symbol: "DOGE-USD".to_string(),
            tier: SymbolTier::Excluded,
            exchange_id: "coinbase".to_string(),
            user_id: None,
        };
        assert!(!symbol.is_tracked());
    }
}
