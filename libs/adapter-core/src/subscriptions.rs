//! Recorded-symbol bookkeeping for resubscribe-on-reconnect (spec §4.5
//! "record them for resubscribe on reconnect").

use dashmap::DashSet;
use livermore_types::Timeframe;

/// Concurrent set of `(symbol, timeframe)` pairs currently subscribed.
/// `subscribe`/`unsubscribe` mirror each other so the adapter can replay
/// the full set after a reconnect without tracking order.
#[derive(Default)]
pub struct SubscriptionRegistry {
    entries: DashSet<(String, Timeframe)>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, symbols: &[String], tf: Timeframe) {
        for symbol in symbols {
            self.entries.insert((symbol.clone(), tf));
        }
    }

    pub fn remove(&self, symbols: &[String]) {
        for symbol in symbols {
            self.entries.retain(|(s, _)| s != symbol);
        }
    }

    pub fn snapshot(&self) -> Vec<(String, Timeframe)> {
        self.entries.iter().map(|e| e.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_and_remove_round_trip() {
        let reg = SubscriptionRegistry::new();
        reg.record(&["BTC-USD".to_string(), "ETH-USD".to_string()], Timeframe::M5);
        assert_eq!(reg.snapshot().len(), 2);
        reg.remove(&["BTC-USD".to_string()]);
        let remaining = reg.snapshot();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].0, "ETH-USD");
    }
}
