//! Cache-backend seam the alert engine reads/writes through (mirrors
//! `services/aggregation_service::backend`): a trait abstraction so
//! `detect.rs` + `engine.rs` logic is testable without a live Redis.

use async_trait::async_trait;
use livermore_types::model::AlertRecord;
use livermore_types::Timeframe;

#[async_trait]
pub trait AlertCache: Send + Sync {
    /// Latest close price for the series the alert fires on (spec §3 alert
    /// record field `price`).
    async fn latest_close(&self, exchange_id: &str, symbol: &str, tf: Timeframe) -> anyhow::Result<Option<f64>>;

    async fn append_alert_record(&self, exchange_id: &str, record: &AlertRecord) -> anyhow::Result<()>;

    async fn publish_alert(&self, exchange_id: &str, record: &AlertRecord) -> anyhow::Result<()>;
}

pub struct StoreBackend {
    pub store: livermore_cache::Store,
}

#[async_trait]
impl AlertCache for StoreBackend {
    async fn latest_close(&self, exchange_id: &str, symbol: &str, tf: Timeframe) -> anyhow::Result<Option<f64>> {
        let key = livermore_cache::keys::candle_shared(exchange_id, symbol, tf);
        let candles = self.store.read_latest_candles(&key, 1).await?;
        Ok(candles.last().map(|c| c.close))
    }

    async fn append_alert_record(&self, exchange_id: &str, record: &AlertRecord) -> anyhow::Result<()> {
        self.store.append_alert_record(exchange_id, record).await?;
        Ok(())
    }

    async fn publish_alert(&self, exchange_id: &str, record: &AlertRecord) -> anyhow::Result<()> {
        let channel = livermore_cache::keys::channel_alerts(exchange_id);
        let payload = serde_json::to_string(record)?;
        self.store.publish(&channel, &payload).await?;
        Ok(())
    }
}
