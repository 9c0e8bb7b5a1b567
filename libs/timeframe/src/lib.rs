//! Timeframe arithmetic, boundary flooring, gap fill, and OHLC roll-up
//! (spec §4.1).
//!
//! Pure functions over `Candle` slices — no cache or I/O dependency, so the
//! aggregation service can unit-test its boundary logic against plain
//! in-memory vectors.

use livermore_types::{Candle, Timeframe};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TimeframeError {
    #[error("invalid timeframe: target {target} is not a positive multiple of source {source}")]
    InvalidTimeframe { source: String, target: String },
}

/// Milliseconds per period. Thin wrapper kept for call-site symmetry with
/// spec §4.1's `timeframeToMs(tf)`.
pub fn timeframe_to_ms(tf: Timeframe) -> i64 {
    tf.to_ms()
}

/// `floor(ts / ms(tf)) * ms(tf)` (spec §4.1).
pub fn candle_boundary(ts: i64, tf: Timeframe) -> i64 {
    let ms = tf.to_ms();
    ts.div_euclid(ms) * ms
}

/// How many source periods make up one target period. `Err` unless target
/// is a strictly larger, exact multiple of source (spec §4.1).
pub fn period_factor(source: Timeframe, target: Timeframe) -> Result<i64, TimeframeError> {
    let (s, t) = (source.to_ms(), target.to_ms());
    if t <= s || t % s != 0 {
        return Err(TimeframeError::InvalidTimeframe {
            source: source.as_str().to_string(),
            target: target.as_str().to_string(),
        });
    }
    Ok(t / s)
}

/// Fill gaps in a strictly-ordered source series with synthetic candles so
/// consumers see one candle per boundary with no holes. `series` must
/// already be sorted ascending by timestamp and aligned to `tf`; candles
/// are assumed deduplicated by timestamp (the cache layer enforces this on
/// write, see `livermore-cache`).
pub fn fill_gaps(series: &[Candle], tf: Timeframe) -> Vec<Candle> {
    let step = tf.to_ms();
    let mut out = Vec::with_capacity(series.len());
    let mut iter = series.iter();
    let Some(first) = iter.next() else {
        return out;
    };
    out.push(*first);
    let mut prev = *first;
    for candle in iter {
        let mut ts = prev.timestamp + step;
        while ts < candle.timestamp {
            out.push(Candle::synthetic(ts, prev.symbol.clone(), tf, prev.close));
            ts += step;
        }
        out.push(*candle);
        prev = *candle;
    }
    out
}

/// Group `source` candles by `candleBoundary(ts, target)` and emit one
/// `target` candle per group **only if** the group is complete — its size
/// equals `period_factor(source, target)` (spec §4.1). Output is sorted
/// ascending. `source` is expected sorted ascending and deduplicated by
/// timestamp; incomplete trailing/leading groups (fewer than the required
/// count, e.g. a boundary not yet fully observed) are dropped, never
/// emitted partially.
pub fn aggregate(
    series: &[Candle],
    source: Timeframe,
    target: Timeframe,
) -> Result<Vec<Candle>, TimeframeError> {
    let factor = period_factor(source, target)? as usize;
    if series.is_empty() {
        return Ok(Vec::new());
    }

    let mut groups: Vec<(i64, Vec<Candle>)> = Vec::new();
    for candle in series {
        let boundary = candle_boundary(candle.timestamp, target);
        match groups.last_mut() {
            Some((b, bucket)) if *b == boundary => bucket.push(*candle),
            _ => groups.push((boundary, vec![*candle])),
        }
    }

    let mut out = Vec::with_capacity(groups.len());
    for (boundary, bucket) in groups {
        if bucket.len() != factor {
            continue;
        }
        let open = bucket.first().unwrap().open;
        let close = bucket.last().unwrap().close;
        let high = bucket.iter().fold(f64::MIN, |acc, c| acc.max(c.high));
        let low = bucket.iter().fold(f64::MAX, |acc, c| acc.min(c.low));
        let volume: f64 = bucket.iter().map(|c| c.volume).sum();
        let is_synthetic = bucket.iter().any(|c| c.is_synthetic);
        let symbol = bucket.first().unwrap().symbol.clone();
        out.push(Candle {
            timestamp: boundary,
            symbol,
            timeframe: target,
            open,
            high,
            low,
            close,
            volume,
            is_synthetic,
            sequence_num: None,
        });
    }
    out.sort_by_key(|c| c.timestamp);
    Ok(out)
}

/// True iff a source close at `close_ts` (the boundary timestamp of the
/// just-closed source candle) also closes `target` — i.e. the *next*
/// source period crosses a `target` boundary (spec §4.6 step 2).
pub fn closes_timeframe(close_ts: i64, source: Timeframe, target: Timeframe) -> bool {
    let next = close_ts + source.to_ms();
    candle_boundary(close_ts, target) != candle_boundary(next, target)
}
