//! Public envelopes and whitelist transformers (spec §6, §4.9).
//!
//! Every struct in this module names the fields that are allowed to cross
//! the public boundary. New internal fields never leak because nothing in
//! the transformer functions below references them — a field has to be
//! added to `PublicCandle`/`PublicSignal` by hand for it to appear on the
//! wire.

use serde::{Deserialize, Serialize};

use crate::model::{classify_trigger, AlertDirection, AlertStrength, Candle, TriggerLabel};
use crate::timeframe::Timeframe;

/// REST success envelope (spec §6).
#[derive(Debug, Clone, Serialize)]
pub struct ApiSuccess<T: Serialize> {
    pub success: bool,
    pub data: T,
    pub meta: ApiMeta,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiMeta {
    pub count: usize,
    #[serde(rename = "next_cursor")]
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

impl<T: Serialize> ApiSuccess<T> {
    pub fn new(data: T, count: usize, next_cursor: Option<String>, has_more: bool) -> Self {
        Self {
            success: true,
            data,
            meta: ApiMeta {
                count,
                next_cursor,
                has_more,
            },
        }
    }
}

/// REST error envelope (spec §6).
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub success: bool,
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: ApiErrorBody {
                code: code.to_string(),
                message: message.into(),
            },
        }
    }
}

/// Public candle shape: only `{timestamp, open, high, low, close, volume}`,
/// decimal strings and ISO 8601 timestamps (spec §4.9). `is_synthetic` and
/// `sequence_num` on the internal `Candle` are never referenced here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublicCandle {
    pub timestamp: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: String,
}

pub fn to_public_candle(candle: &Candle) -> PublicCandle {
    let ts = chrono::DateTime::from_timestamp_millis(candle.timestamp)
        .unwrap_or_default()
        .to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
    PublicCandle {
        timestamp: ts,
        open: format_decimal(candle.open),
        high: format_decimal(candle.high),
        low: format_decimal(candle.low),
        close: format_decimal(candle.close),
        volume: format_decimal(candle.volume),
    }
}

fn format_decimal(value: f64) -> String {
    rust_decimal::Decimal::from_f64_retain(value)
        .map(|d| d.normalize().to_string())
        .unwrap_or_else(|| value.to_string())
}

/// `signal_type ∈ {momentum_signal, trend_signal}` (spec §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicSignalType {
    MomentumSignal,
    TrendSignal,
}

/// Public alert/signal shape: `{symbol, exchange, timeframe, signal_type,
/// direction, strength, price, timestamp}`. No `macdV`, `histogram`,
/// `signal`, internal `triggerLabel`, or ATR fields are referenced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublicSignal {
    pub symbol: String,
    pub exchange: String,
    pub timeframe: String,
    pub signal_type: PublicSignalType,
    pub direction: PublicDirection,
    pub strength: PublicStrength,
    pub price: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicDirection {
    Bullish,
    Bearish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicStrength {
    Weak,
    Moderate,
    Strong,
    Extreme,
}

impl From<AlertDirection> for PublicDirection {
    fn from(d: AlertDirection) -> Self {
        match d {
            AlertDirection::Bullish => PublicDirection::Bullish,
            AlertDirection::Bearish => PublicDirection::Bearish,
        }
    }
}

impl From<AlertStrength> for PublicStrength {
    fn from(s: AlertStrength) -> Self {
        match s {
            AlertStrength::Weak => PublicStrength::Weak,
            AlertStrength::Moderate => PublicStrength::Moderate,
            AlertStrength::Strong => PublicStrength::Strong,
            AlertStrength::Extreme => PublicStrength::Extreme,
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn to_public_signal(
    symbol: &str,
    exchange: &str,
    timeframe: Timeframe,
    signal_type: PublicSignalType,
    label: &TriggerLabel,
    price: f64,
    timestamp_ms: i64,
) -> PublicSignal {
    let (direction, strength) = classify_trigger(label);
    PublicSignal {
        symbol: symbol.to_string(),
        exchange: exchange.to_string(),
        timeframe: timeframe.as_str().to_string(),
        signal_type,
        direction: direction.into(),
        strength: strength.into(),
        price: format_decimal(price),
        timestamp: chrono::DateTime::from_timestamp_millis(timestamp_ms)
            .unwrap_or_default()
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
    }
}

/// Outbound WebSocket server envelope (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub enum WsServerEnvelope {
    CandleClose {
        channel: String,
        data: PublicCandle,
    },
    TradeSignal {
        channel: String,
        data: PublicSignal,
    },
    Subscribed {
        channels: Vec<String>,
    },
    Unsubscribed {
        channels: Vec<String>,
    },
    Error {
        channel: Option<String>,
        code: String,
        message: String,
    },
}

/// Inbound client message (spec §6).
#[derive(Debug, Clone, Deserialize)]
pub struct WsClientMessage {
    pub action: WsAction,
    pub channels: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WsAction {
    Subscribe,
    Unsubscribe,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Candle;

    #[test]
    fn public_candle_whitelists_fields_only() {
        let mut candle = Candle::new(1_704_067_200_000, "BTC-USD", Timeframe::M5, 100.0, 105.0, 99.0, 103.0, 1000.0);
        candle.is_synthetic = true;
        candle.sequence_num = Some(42);

        let public = to_public_candle(&candle);
        let json = serde_json::to_value(&public).unwrap();
        let obj = json.as_object().unwrap();

        let allowed = ["timestamp", "open", "high", "low", "close", "volume"];
        assert_eq!(obj.len(), allowed.len());
        for key in obj.keys() {
            assert!(allowed.contains(&key.as_str()), "unexpected field: {key}");
        }
    }

    #[test]
    fn public_signal_never_exposes_macd_internals() {
        let signal = to_public_signal(
            "BTC-USD",
            "coinbase",
            Timeframe::M5,
            PublicSignalType::MomentumSignal,
            &TriggerLabel::Level(-150),
            100.0,
            1_704_067_200_000,
        );
        let json = serde_json::to_value(&signal).unwrap();
        let text = json.to_string();
        for forbidden in ["macdV", "histogram", "fastEMA", "slowEMA", "atr", "level_-150"] {
            assert!(!text.contains(forbidden), "leaked internal field: {forbidden}");
        }
    }
}
