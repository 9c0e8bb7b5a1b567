//! Cache-backend seam the aggregation engine reads/writes through. A real
//! implementation wraps `livermore_cache::Store`; tests substitute an
//! in-memory fake so engine logic (boundary detection, readiness gating)
//! is exercised without a live Redis (spec §8 "no live Redis needed").

use async_trait::async_trait;
use livermore_types::{Candle, MacdVValue, Timeframe};

#[async_trait]
pub trait IndicatorCache: Send + Sync {
    async fn read_latest_candles(
        &self,
        exchange_id: &str,
        symbol: &str,
        tf: Timeframe,
        n: isize,
    ) -> anyhow::Result<Vec<Candle>>;

    async fn write_indicator(
        &self,
        exchange_id: &str,
        symbol: &str,
        tf: Timeframe,
        value: &MacdVValue,
    ) -> anyhow::Result<()>;

    async fn publish_indicator(
        &self,
        exchange_id: &str,
        symbol: &str,
        tf: Timeframe,
        value: &MacdVValue,
    ) -> anyhow::Result<()>;
}

pub struct StoreBackend {
    pub store: livermore_cache::Store,
}

#[async_trait]
impl IndicatorCache for StoreBackend {
    async fn read_latest_candles(
        &self,
        exchange_id: &str,
        symbol: &str,
        tf: Timeframe,
        n: isize,
    ) -> anyhow::Result<Vec<Candle>> {
        let key = livermore_cache::keys::candle_shared(exchange_id, symbol, tf);
        Ok(self.store.read_latest_candles(&key, n).await?)
    }

    async fn write_indicator(
        &self,
        exchange_id: &str,
        symbol: &str,
        tf: Timeframe,
        value: &MacdVValue,
    ) -> anyhow::Result<()> {
        let key = livermore_cache::keys::indicator_shared(exchange_id, symbol, tf, "macd-v", None);
        let payload = serde_json::to_string(value)?;
        self.store.write_indicator_raw(&key, &payload, None).await?;
        Ok(())
    }

    async fn publish_indicator(
        &self,
        exchange_id: &str,
        symbol: &str,
        tf: Timeframe,
        value: &MacdVValue,
    ) -> anyhow::Result<()> {
        let channel = livermore_cache::keys::channel_indicator(exchange_id, symbol, tf, "macd-v");
        let payload = serde_json::to_string(value)?;
        self.store.publish(&channel, &payload).await?;
        Ok(())
    }
}
