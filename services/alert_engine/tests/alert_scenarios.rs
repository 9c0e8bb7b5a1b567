//! Integration coverage for spec §8 scenarios S3 (level crossing) and S4
//! (reversal signal), plus property 4 (cooldown gating), against an
//! in-memory cache fake and a capturing notification sink.

use async_trait::async_trait;
use livermore_alert_engine::{AlertCache, AlertEngine, NotificationSink};
use livermore_types::model::AlertRecord;
use livermore_types::{MacdVValue, Timeframe};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Default, Clone)]
struct FakeCache {
    price: Arc<Mutex<Option<f64>>>,
    records: Arc<Mutex<Vec<AlertRecord>>>,
    published: Arc<Mutex<Vec<AlertRecord>>>,
}

#[async_trait]
impl AlertCache for FakeCache {
    async fn latest_close(&self, _exchange_id: &str, _symbol: &str, _tf: Timeframe) -> anyhow::Result<Option<f64>> {
        Ok(*self.price.lock())
    }

    async fn append_alert_record(&self, _exchange_id: &str, record: &AlertRecord) -> anyhow::Result<()> {
        self.records.lock().push(record.clone());
        Ok(())
    }

    async fn publish_alert(&self, _exchange_id: &str, record: &AlertRecord) -> anyhow::Result<()> {
        self.published.lock().push(record.clone());
        Ok(())
    }
}

#[derive(Default, Clone)]
struct CapturingSink {
    notified: Arc<Mutex<Vec<AlertRecord>>>,
}

#[async_trait]
impl NotificationSink for CapturingSink {
    async fn notify(&self, record: &AlertRecord) -> anyhow::Result<()> {
        self.notified.lock().push(record.clone());
        Ok(())
    }
}

fn value(macd_v: f64, signal: f64, histogram: f64) -> MacdVValue {
    MacdVValue { timestamp: 0, fast_ema: 0.0, slow_ema: 0.0, macd_v, signal, histogram, atr: 1.0 }
}

#[tokio::test]
async fn s3_level_crossing_alert() {
    let cache = FakeCache { price: Arc::new(Mutex::new(Some(101.5))), ..Default::default() };
    let sink = CapturingSink::default();
    let engine = AlertEngine::new(cache.clone(), Box::new(sink.clone()), "coinbase");

    engine.handle_indicator_update("BTC-USD", Timeframe::M5, value(-140.0, -150.0, -3.0)).await.unwrap();
    engine.handle_indicator_update("BTC-USD", Timeframe::M5, value(-160.0, -155.0, -5.0)).await.unwrap();

    let records = cache.records.lock();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.trigger_label, "level_-150");
    assert_eq!(record.details.direction, livermore_types::model::AlertDirection::Bearish);
    assert_eq!(record.price, 101.5);
    assert!(record.notification_sent);
    assert_eq!(sink.notified.lock().len(), 1);
    assert_eq!(cache.published.lock().len(), 1);
}

#[tokio::test]
async fn s4_reversal_signal_then_suppressed() {
    let cache = FakeCache { price: Arc::new(Mutex::new(Some(99.0))), ..Default::default() };
    let engine = AlertEngine::new(cache.clone(), Box::new(CapturingSink::default()), "coinbase");

    engine.handle_indicator_update("BTC-USD", Timeframe::M5, value(-185.0, -195.0, 8.0)).await.unwrap();
    engine.handle_indicator_update("BTC-USD", Timeframe::M5, value(-180.0, -190.0, 10.0)).await.unwrap();

    {
        let records = cache.records.lock();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].trigger_label, "reversal_oversold");
    }

    // Subsequent tick stays inside the reversal zone with the flag still set: nothing new fires.
    engine.handle_indicator_update("BTC-USD", Timeframe::M5, value(-178.0, -188.0, 12.0)).await.unwrap();
    assert_eq!(cache.records.lock().len(), 1);
}

#[tokio::test]
async fn property_4_cooldown_gates_repeat_crossings() {
    let cache = FakeCache::default();
    let engine = AlertEngine::new(cache.clone(), Box::new(CapturingSink::default()), "coinbase");

    engine.handle_indicator_update("ETH-USD", Timeframe::M5, value(-140.0, -150.0, -2.0)).await.unwrap();
    engine.handle_indicator_update("ETH-USD", Timeframe::M5, value(-160.0, -165.0, -4.0)).await.unwrap();
    assert_eq!(cache.records.lock().len(), 1);

    // Bounce back above -150 and cross again immediately: within cooldown, suppressed.
    engine.handle_indicator_update("ETH-USD", Timeframe::M5, value(-140.0, -145.0, -1.0)).await.unwrap();
    engine.handle_indicator_update("ETH-USD", Timeframe::M5, value(-170.0, -168.0, -3.0)).await.unwrap();
    assert_eq!(cache.records.lock().len(), 1, "second crossing within cooldown must not emit");
}
