//! Core data model (spec §3).

use serde::{Deserialize, Serialize};

use crate::timeframe::Timeframe;

/// `{timestamp, symbol, timeframe, open, high, low, close, volume,
/// isSynthetic, sequence_num}`. Identity within a series is
/// `(exchange, symbol, timeframe, timestamp)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Milliseconds since epoch, aligned to the timeframe boundary.
    pub timestamp: i64,
    #[serde(skip)]
    pub symbol: CandleSymbol,
    pub timeframe: Timeframe,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    #[serde(rename = "isSynthetic", default)]
    pub is_synthetic: bool,
    #[serde(rename = "sequenceNum", skip_serializing_if = "Option::is_none")]
    pub sequence_num: Option<u64>,
}

/// Symbol is carried out-of-band by the cache key in most flows, but some
/// call sites (aggregation, alerting) need it attached to the value itself.
/// `#[serde(skip)]` on `Candle::symbol` keeps the wire payload identical to
/// spec §3's field list — the cache value alone never repeats the key.
pub type CandleSymbol = String;

impl Candle {
    pub fn new(
        timestamp: i64,
        symbol: impl Into<String>,
        timeframe: Timeframe,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            symbol: symbol.into(),
            timeframe,
            open,
            high,
            low,
            close,
            volume,
            is_synthetic: false,
            sequence_num: None,
        }
    }

    /// A synthetic gap-fill candle: `open=high=low=close=prior close`,
    /// `volume=0` (spec §3).
    pub fn synthetic(timestamp: i64, symbol: impl Into<String>, timeframe: Timeframe, prior_close: f64) -> Self {
        Self {
            timestamp,
            symbol: symbol.into(),
            timeframe,
            open: prior_close,
            high: prior_close,
            low: prior_close,
            close: prior_close,
            volume: 0.0,
            is_synthetic: true,
            sequence_num: None,
        }
    }
}

/// `{symbol, price, change24h, changePercent24h, volume24h, low24h, high24h,
/// timestamp}`. 60-second TTL in the cache (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ticker {
    pub price: f64,
    #[serde(rename = "change24h")]
    pub change_24h: f64,
    #[serde(rename = "changePercent24h")]
    pub change_percent_24h: f64,
    #[serde(rename = "volume24h")]
    pub volume_24h: f64,
    #[serde(rename = "low24h")]
    pub low_24h: f64,
    #[serde(rename = "high24h")]
    pub high_24h: f64,
    pub timestamp: i64,
}

/// Ticker TTL in seconds (spec §3/§4.3).
pub const TICKER_TTL_SECS: u64 = 60;

/// `{timestamp, fastEMA, slowEMA, macdV, signal, histogram, atr}` for a
/// `(symbol, timeframe)` series (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdVValue {
    pub timestamp: i64,
    #[serde(rename = "fastEMA")]
    pub fast_ema: f64,
    #[serde(rename = "slowEMA")]
    pub slow_ema: f64,
    #[serde(rename = "macdV")]
    pub macd_v: f64,
    pub signal: f64,
    pub histogram: f64,
    pub atr: f64,
}

/// Default MACD-V parameters (spec §3).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdVParams {
    pub fast: usize,
    pub slow: usize,
    pub atr_period: usize,
    pub signal_period: usize,
}

impl Default for MacdVParams {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            atr_period: 26,
            signal_period: 9,
        }
    }
}

/// Minimum candles in a series before any MACD-V value is emitted for
/// alerting/display purposes (spec §3, §4.2: "gates on 60 bars regardless
/// of [the] mathematical minimum").
pub const READINESS_GATE_BARS: usize = 60;

/// Alert transition label. Internal labels are never transmitted past the
/// public streaming boundary (spec §4.7 "Generic labelling").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TriggerLabel {
    Level(i32),
    ReversalOversold,
    ReversalOverbought,
}

impl TriggerLabel {
    pub fn as_internal_string(&self) -> String {
        match self {
            TriggerLabel::Level(l) => format!("level_{l}"),
            TriggerLabel::ReversalOversold => "reversal_oversold".to_string(),
            TriggerLabel::ReversalOverbought => "reversal_overbought".to_string(),
        }
    }
}

/// `{id, exchangeId, symbol, timeframe, alertType, triggeredAt, price,
/// triggerValue, triggerLabel, previousLabel, details, notificationSent,
/// notificationError}`. Immutable after insert (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: String,
    #[serde(rename = "exchangeId")]
    pub exchange_id: String,
    pub symbol: String,
    pub timeframe: Timeframe,
    #[serde(rename = "alertType")]
    pub alert_type: String,
    #[serde(rename = "triggeredAt")]
    pub triggered_at: i64,
    pub price: f64,
    #[serde(rename = "triggerValue")]
    pub trigger_value: f64,
    #[serde(rename = "triggerLabel")]
    pub trigger_label: String,
    #[serde(rename = "previousLabel", skip_serializing_if = "Option::is_none")]
    pub previous_label: Option<String>,
    pub details: AlertDetails,
    #[serde(rename = "notificationSent")]
    pub notification_sent: bool,
    #[serde(rename = "notificationError", skip_serializing_if = "Option::is_none")]
    pub notification_error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertDetails {
    pub direction: AlertDirection,
    pub histogram: f64,
    pub signal: f64,
    #[serde(rename = "timeframesSnapshot")]
    pub timeframes_snapshot: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertDirection {
    Bullish,
    Bearish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStrength {
    Weak,
    Moderate,
    Strong,
    Extreme,
}

/// Derive public `(direction, strength)` from an internal trigger label,
/// per spec §4.7 "Generic labelling on the public boundary".
pub fn classify_trigger(label: &TriggerLabel) -> (AlertDirection, AlertStrength) {
    match label {
        TriggerLabel::Level(l) => {
            let direction = if *l < 0 {
                AlertDirection::Bearish
            } else {
                AlertDirection::Bullish
            };
            let magnitude = l.unsigned_abs();
            let strength = match magnitude {
                0..=150 => AlertStrength::Weak,
                151..=250 => AlertStrength::Moderate,
                251..=350 => AlertStrength::Strong,
                _ => AlertStrength::Extreme,
            };
            (direction, strength)
        }
        TriggerLabel::ReversalOversold => (AlertDirection::Bullish, AlertStrength::Strong),
        TriggerLabel::ReversalOverbought => (AlertDirection::Bearish, AlertStrength::Strong),
    }
}
