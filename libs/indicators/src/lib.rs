//! MACD-V numeric core (spec §4.2).
//!
//! Pure functions over price/candle series. `NaN` propagates through the
//! prefix of any series until enough data has accumulated — callers test
//! `f64::is_nan()` and skip, exactly as spec §4.2 describes for the
//! JavaScript original's `Number.isNaN` check.

use livermore_types::model::MacdVParams;
use livermore_types::Candle;

/// Simple moving average. `xs[i]` is `NaN` for `i < n - 1`.
pub fn sma(xs: &[f64], n: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; xs.len()];
    if n == 0 || xs.len() < n {
        return out;
    }
    let mut window_sum: f64 = xs[..n].iter().sum();
    out[n - 1] = window_sum / n as f64;
    for i in n..xs.len() {
        window_sum += xs[i] - xs[i - n];
        out[i] = window_sum / n as f64;
    }
    out
}

/// Exponential moving average, seeded by `sma` on the first full window of
/// non-`NaN` values, then `EMA_t = α·x_t + (1−α)·EMA_{t−1}` with
/// `α = 2/(n+1)` (spec §4.2). `xs` may carry a leading `NaN` prefix (as
/// `macd_v_raw` does before its own warm-up); the window is found past that
/// prefix so the seed itself is never `NaN` and the recurrence isn't
/// poisoned for the rest of the series.
pub fn ema(xs: &[f64], n: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; xs.len()];
    if n == 0 {
        return out;
    }
    let Some(start) = xs.iter().position(|v| !v.is_nan()) else {
        return out;
    };
    if start + n > xs.len() || xs[start..start + n].iter().any(|v| v.is_nan()) {
        return out;
    }
    let alpha = 2.0 / (n as f64 + 1.0);
    let seed: f64 = xs[start..start + n].iter().sum::<f64>() / n as f64;
    out[start + n - 1] = seed;
    let mut prev = seed;
    for i in start + n..xs.len() {
        if xs[i].is_nan() {
            break;
        }
        let value = alpha * xs[i] + (1.0 - alpha) * prev;
        out[i] = value;
        prev = value;
    }
    out
}

/// Wilder's moving average, seeded by `sma`, then
/// `RMA_t = (RMA_{t−1}·(n−1) + x_t) / n` (spec §4.2).
pub fn rma(xs: &[f64], n: usize) -> Vec<f64> {
    let mut out = vec![f64::NAN; xs.len()];
    if n == 0 || xs.len() < n {
        return out;
    }
    let seed: f64 = xs[..n].iter().sum::<f64>() / n as f64;
    out[n - 1] = seed;
    let mut prev = seed;
    for i in n..xs.len() {
        let value = (prev * (n as f64 - 1.0) + xs[i]) / n as f64;
        out[i] = value;
        prev = value;
    }
    out
}

/// `max(h−l, |h−prevClose|, |l−prevClose|)`; the first bar uses `h−l`
/// (spec §4.2).
pub fn true_range(candles: &[Candle]) -> Vec<f64> {
    let mut out = Vec::with_capacity(candles.len());
    for (i, c) in candles.iter().enumerate() {
        let tr = if i == 0 {
            c.high - c.low
        } else {
            let prev_close = candles[i - 1].close;
            (c.high - c.low)
                .max((c.high - prev_close).abs())
                .max((c.low - prev_close).abs())
        };
        out.push(tr);
    }
    out
}

/// `ATR(candles, n) = RMA(trueRange(candles), n)` (spec §4.2).
pub fn atr(candles: &[Candle], n: usize) -> Vec<f64> {
    rma(&true_range(candles), n)
}

/// One point of the MACD-V series: `{timestamp, fastEMA, slowEMA, macdV,
/// signal, histogram, atr}` (spec §3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdVPoint {
    pub timestamp: i64,
    pub fast_ema: f64,
    pub slow_ema: f64,
    pub macd_v: f64,
    pub signal: f64,
    pub histogram: f64,
    pub atr: f64,
}

impl MacdVPoint {
    pub fn is_valid(&self) -> bool {
        !self.macd_v.is_nan() && !self.signal.is_nan()
    }
}

/// Minimum bars before the *mathematical* first `macdV` value is defined:
/// `max(slow, atrPeriod) + signalPeriod` (spec §4.2). Alerting/display
/// additionally gate on `livermore_types::model::READINESS_GATE_BARS` (60);
/// that gate is the caller's responsibility, not this pure function's.
pub fn minimum_bars(params: &MacdVParams) -> usize {
    params.slow.max(params.atr_period) + params.signal_period
}

/// Compute the full MACD-V series for a candle slice, aligned index-for-index
/// with `candles`. Entries before `minimum_bars(params)` carry `NaN` in
/// `macd_v`/`signal`/`histogram` (spec §4.2 "NaN is propagated").
pub fn macd_v(candles: &[Candle], params: MacdVParams) -> Vec<MacdVPoint> {
    let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
    let fast = ema(&closes, params.fast);
    let slow = ema(&closes, params.slow);
    let atr_series = atr(candles, params.atr_period);

    let mut macd_v_raw = vec![f64::NAN; candles.len()];
    for i in 0..candles.len() {
        if !fast[i].is_nan() && !slow[i].is_nan() && !atr_series[i].is_nan() && atr_series[i] != 0.0 {
            macd_v_raw[i] = (fast[i] - slow[i]) / atr_series[i] * 100.0;
        }
    }
    let signal = ema(&macd_v_raw, params.signal_period);

    (0..candles.len())
        .map(|i| {
            let macd = macd_v_raw[i];
            let sig = signal[i];
            MacdVPoint {
                timestamp: candles[i].timestamp,
                fast_ema: fast[i],
                slow_ema: slow[i],
                macd_v: macd,
                signal: sig,
                histogram: macd - sig,
                atr: atr_series[i],
            }
        })
        .collect()
}

/// Incremental single-series MACD-V state, for callers that maintain a
/// running series rather than recomputing a full batch per event (the
/// indicator service itself recomputes from cache reads per spec §4.6, but
/// this mirrors the stateful-update shape used elsewhere in the workspace
/// for other indicators).
#[derive(Debug, Clone)]
pub struct MacdVSeries {
    params: MacdVParams,
    closes: Vec<f64>,
    candles: Vec<Candle>,
}

impl MacdVSeries {
    pub fn new(params: MacdVParams) -> Self {
        Self {
            params,
            closes: Vec::new(),
            candles: Vec::new(),
        }
    }

    /// Append a candle and recompute the latest point. Returns `None` until
    /// `minimum_bars(params)` candles have accumulated.
    pub fn update(&mut self, candle: Candle) -> Option<MacdVPoint> {
        self.closes.push(candle.close);
        self.candles.push(candle);
        let series = macd_v(&self.candles, self.params);
        series.last().copied().filter(MacdVPoint::is_valid)
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livermore_types::Timeframe;

    fn candle(ts: i64, close: f64) -> Candle {
        Candle::new(ts, "BTC-USD", Timeframe::M5, close, close + 1.0, close - 1.0, close, 10.0)
    }

    #[test]
    fn sma_undefined_before_window() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let out = sma(&xs, 3);
        assert!(out[0].is_nan());
        assert!(out[1].is_nan());
        assert_eq!(out[2], 2.0);
        assert_eq!(out[3], 3.0);
    }

    #[test]
    fn ema_seeds_with_sma_then_recurses() {
        let xs = [1.0, 2.0, 3.0, 4.0, 5.0];
        let out = ema(&xs, 3);
        assert_eq!(out[2], 2.0); // sma seed
        let alpha = 2.0 / 4.0;
        let expected3 = alpha * 4.0 + (1.0 - alpha) * 2.0;
        assert!((out[3] - expected3).abs() < 1e-9);
    }

    #[test]
    fn true_range_uses_high_minus_low_on_first_bar() {
        let candles = vec![candle(0, 100.0), candle(1, 105.0)];
        let tr = true_range(&candles);
        assert_eq!(tr[0], candles[0].high - candles[0].low);
    }

    #[test]
    fn macd_v_propagates_nan_until_minimum_bars() {
        let params = MacdVParams::default();
        let min_bars = minimum_bars(&params);
        let candles: Vec<Candle> = (0..min_bars as i64)
            .map(|i| candle(i * 300_000, 100.0 + i as f64))
            .collect();
        let series = macd_v(&candles, params);
        // Strictly before the signal's own first valid index, values are NaN.
        for point in &series[..min_bars - 2] {
            assert!(point.macd_v.is_nan() || point.signal.is_nan());
        }
    }

    #[test]
    fn macd_v_is_valid_once_the_series_has_enough_history() {
        // A regression guard for a prior bug where the signal EMA seeded off
        // the NaN prefix of `macd_v_raw` and every point downstream of it
        // stayed NaN forever, so no point was ever `is_valid()`.
        let params = MacdVParams::default();
        let candles: Vec<Candle> = (0..70i64)
            .map(|i| candle(i * 300_000, 100.0 + (i as f64 * 0.2).sin() * 3.0))
            .collect();
        let series = macd_v(&candles, params);
        let valid = series.iter().filter(|p| p.is_valid()).count();
        assert!(valid > 0, "expected at least one valid MacdVPoint in a 70-bar series");
        for point in series.iter().filter(|p| p.is_valid()) {
            assert!(!point.signal.is_nan());
            assert!(!point.macd_v.is_nan());
        }
    }

    #[test]
    fn macd_v_recompute_is_deterministic() {
        let params = MacdVParams::default();
        let candles: Vec<Candle> = (0..80i64)
            .map(|i| candle(i * 300_000, 100.0 + (i as f64 * 0.3).sin() * 5.0))
            .collect();
        let a = macd_v(&candles, params);
        let b = macd_v(&candles, params);
        for (pa, pb) in a.iter().zip(b.iter()) {
            assert_eq!(pa.macd_v.is_nan(), pb.macd_v.is_nan());
            if !pa.macd_v.is_nan() {
                assert_eq!(pa.macd_v, pb.macd_v);
                assert_eq!(pa.signal, pb.signal);
                assert_eq!(pa.histogram, pb.histogram);
            }
        }
    }

    proptest::proptest! {
        #[test]
        fn macd_v_never_panics(n in 0usize..120) {
            let candles: Vec<Candle> = (0..n as i64)
                .map(|i| candle(i * 300_000, 100.0 + i as f64 * 0.1))
                .collect();
            let _ = macd_v(&candles, MacdVParams::default());
        }
    }
}
