//! Boundary detection, aggregate-from-5m, readiness gate, calculate-on-close
//! (spec §4.6).

use tracing::{debug, error};

use livermore_indicators::macd_v;
use livermore_timeframe::{aggregate, closes_timeframe, period_factor};
use livermore_types::model::{MacdVParams, READINESS_GATE_BARS};
use livermore_types::{MacdVValue, Timeframe};

use crate::backend::IndicatorCache;

pub struct AggregationEngine<C: IndicatorCache> {
    cache: C,
    exchange_id: String,
    params: MacdVParams,
    /// How many 5m candles to pull for a 5m recalculation (generous enough
    /// to cover `minimum_bars` plus headroom; the readiness gate below is
    /// what actually governs whether a value is emitted).
    lookback_5m: isize,
}

impl<C: IndicatorCache> AggregationEngine<C> {
    pub fn new(cache: C, exchange_id: impl Into<String>) -> Self {
        Self {
            cache,
            exchange_id: exchange_id.into(),
            params: MacdVParams::default(),
            lookback_5m: 500,
        }
    }

    /// Entry point for a 5-minute candle-close event. `close_ts` is the
    /// just-closed candle's boundary timestamp (spec §4.6).
    pub async fn handle_close(&self, symbol: &str, close_ts: i64) -> anyhow::Result<()> {
        if let Err(e) = self.recalculate_5m(symbol).await {
            error!(symbol, error = %e, "aggregation: 5m recalculation failed, will retry on next close");
        }

        for tf in Timeframe::AGGREGATED {
            if closes_timeframe(close_ts, Timeframe::M5, tf) {
                if let Err(e) = self.recalculate_aggregated(symbol, tf).await {
                    error!(symbol, timeframe = %tf, error = %e, "aggregation: higher-timeframe recalculation failed, will retry on next close");
                }
            }
        }
        Ok(())
    }

    async fn recalculate_5m(&self, symbol: &str) -> anyhow::Result<()> {
        let candles = self
            .cache
            .read_latest_candles(&self.exchange_id, symbol, Timeframe::M5, self.lookback_5m)
            .await?;
        self.calculate_and_publish(symbol, Timeframe::M5, &candles, "cache_direct").await
    }

    async fn recalculate_aggregated(&self, symbol: &str, tf: Timeframe) -> anyhow::Result<()> {
        let factor = period_factor(Timeframe::M5, tf)?;
        let needed = (READINESS_GATE_BARS as i64 + 1) * factor;
        let source = self
            .cache
            .read_latest_candles(&self.exchange_id, symbol, Timeframe::M5, needed as isize)
            .await?;
        let aggregated = aggregate(&source, Timeframe::M5, tf)?;
        self.calculate_and_publish(symbol, tf, &aggregated, "aggregated_5m").await
    }

    /// Readiness gate + calculate + write + publish, shared by both the
    /// 5m-direct and higher-timeframe paths (spec §4.6 "Readiness gate").
    async fn calculate_and_publish(
        &self,
        symbol: &str,
        tf: Timeframe,
        series: &[livermore_types::Candle],
        source_label: &'static str,
    ) -> anyhow::Result<()> {
        if series.len() < READINESS_GATE_BARS {
            debug!(symbol, timeframe = %tf, len = series.len(), source = source_label, "aggregation: below readiness gate, skipping");
            return Ok(());
        }

        let points = macd_v(series, self.params);
        let Some(last) = points.last().filter(|p| p.is_valid()) else {
            debug!(symbol, timeframe = %tf, source = source_label, "aggregation: latest point not yet valid, skipping");
            return Ok(());
        };

        debug!(symbol, timeframe = %tf, source = source_label, "aggregation: calculated indicator");

        let value = MacdVValue {
            timestamp: last.timestamp,
            fast_ema: last.fast_ema,
            slow_ema: last.slow_ema,
            macd_v: last.macd_v,
            signal: last.signal,
            histogram: last.histogram,
            atr: last.atr,
        };

        self.cache.write_indicator(&self.exchange_id, symbol, tf, &value).await?;
        self.cache.publish_indicator(&self.exchange_id, symbol, tf, &value).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use livermore_types::Candle;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    #[derive(Default, Clone)]
    struct FakeCache {
        candles: Arc<Mutex<HashMap<(String, String, Timeframe), Vec<Candle>>>>,
        written: Arc<Mutex<Vec<(String, Timeframe, MacdVValue)>>>,
        published: Arc<Mutex<Vec<(String, Timeframe, MacdVValue)>>>,
    }

    impl FakeCache {
        fn seed(&self, exchange_id: &str, symbol: &str, tf: Timeframe, candles: Vec<Candle>) {
            self.candles
                .lock()
                .insert((exchange_id.to_string(), symbol.to_string(), tf), candles);
        }
    }

    #[async_trait]
    impl IndicatorCache for FakeCache {
        async fn read_latest_candles(
            &self,
            exchange_id: &str,
            symbol: &str,
            tf: Timeframe,
            n: isize,
        ) -> anyhow::Result<Vec<Candle>> {
            let all = self
                .candles
                .lock()
                .get(&(exchange_id.to_string(), symbol.to_string(), tf))
                .cloned()
                .unwrap_or_default();
            let n = n as usize;
            if all.len() <= n {
                Ok(all)
            } else {
                Ok(all[all.len() - n..].to_vec())
            }
        }

        async fn write_indicator(
            &self,
            _exchange_id: &str,
            symbol: &str,
            tf: Timeframe,
            value: &MacdVValue,
        ) -> anyhow::Result<()> {
            self.written.lock().push((symbol.to_string(), tf, *value));
            Ok(())
        }

        async fn publish_indicator(
            &self,
            _exchange_id: &str,
            symbol: &str,
            tf: Timeframe,
            value: &MacdVValue,
        ) -> anyhow::Result<()> {
            self.published.lock().push((symbol.to_string(), tf, *value));
            Ok(())
        }
    }

    fn candle(ts: i64, close: f64, tf: Timeframe) -> Candle {
        Candle::new(ts, "BTC-USD", tf, close, close + 1.0, close - 1.0, close, 10.0)
    }

    #[tokio::test]
    async fn skips_below_readiness_gate() {
        let cache = FakeCache::default();
        cache.seed(
            "coinbase",
            "BTC-USD",
            Timeframe::M5,
            (0..30).map(|i| candle(i * 300_000, 100.0 + i as f64, Timeframe::M5)).collect(),
        );
        let engine = AggregationEngine::new(cache.clone(), "coinbase");
        engine.handle_close("BTC-USD", 30 * 300_000).await.unwrap();
        assert!(cache.written.lock().is_empty());
    }

    #[tokio::test]
    async fn recalculates_5m_once_ready_s1_style() {
        let cache = FakeCache::default();
        cache.seed(
            "coinbase",
            "BTC-USD",
            Timeframe::M5,
            (0..80).map(|i| candle(i * 300_000, 100.0 + (i as f64 * 0.2).sin() * 3.0, Timeframe::M5)).collect(),
        );
        let engine = AggregationEngine::new(cache.clone(), "coinbase");
        engine.handle_close("BTC-USD", 79 * 300_000).await.unwrap();
        assert_eq!(cache.written.lock().len(), 1);
        assert_eq!(cache.published.lock().len(), 1);
    }

    #[tokio::test]
    async fn triggers_15m_aggregation_on_boundary_s2_style() {
        let cache = FakeCache::default();
        // 61*3 = 183 five-minute candles so the aggregated 15m series clears
        // the 60-bar readiness gate.
        let five_min: Vec<Candle> = (0..183)
            .map(|i| candle(i * 300_000, 100.0 + (i as f64 * 0.1).cos() * 2.0, Timeframe::M5))
            .collect();
        cache.seed("coinbase", "BTC-USD", Timeframe::M5, five_min);
        let engine = AggregationEngine::new(cache.clone(), "coinbase");

        // ts=182*5m is the third candle of a 15m group (0,1,2 -> group 0,
        // ... 180,181,182 -> last full group), so it closes a 15m boundary.
        let close_ts = 182 * 300_000;
        engine.handle_close("BTC-USD", close_ts).await.unwrap();

        let written = cache.written.lock();
        assert!(written.iter().any(|(_, tf, _)| *tf == Timeframe::M15));
    }
}
