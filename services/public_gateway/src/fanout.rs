//! Feeds the one shared per-exchange pub/sub subscriber into a local
//! broadcast channel every WebSocket session fans out from (spec §4.9 "One
//! shared subscriber per exchange fans out to many client sessions").

use std::str::FromStr;

use livermore_cache::{keys, PatternMessage, Subscriber};
use livermore_types::envelope::PublicSignalType;
use livermore_types::model::{AlertRecord, TriggerLabel};
use livermore_types::{Candle, Timeframe};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::channel::ChannelKind;

#[derive(Debug, Clone)]
pub enum GatewayEvent {
    CandleClose {
        symbol: String,
        tf: Timeframe,
        candle: Candle,
    },
    Signal {
        symbol: String,
        tf: Timeframe,
        label: TriggerLabel,
        price: f64,
        timestamp_ms: i64,
    },
}

impl GatewayEvent {
    pub fn kind(&self) -> ChannelKind {
        match self {
            GatewayEvent::CandleClose { .. } => ChannelKind::Candles,
            GatewayEvent::Signal { .. } => ChannelKind::Signals,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            GatewayEvent::CandleClose { symbol, .. } => symbol,
            GatewayEvent::Signal { symbol, .. } => symbol,
        }
    }

    pub fn timeframe(&self) -> Timeframe {
        match self {
            GatewayEvent::CandleClose { tf, .. } => *tf,
            GatewayEvent::Signal { tf, .. } => *tf,
        }
    }
}

/// Spawns the shared subscriber for `exchange_id` and forwards every
/// candle-close / alert delivery onto `tx` as a `GatewayEvent`. Returns the
/// `Subscriber` handle so the caller can `stop()` it on shutdown.
pub async fn spawn_fanout(
    redis_url: String,
    exchange_id: String,
    tx: broadcast::Sender<GatewayEvent>,
) -> anyhow::Result<Subscriber> {
    let patterns = vec![keys::pattern_candle_close(&exchange_id), keys::channel_alerts(&exchange_id)];
    let mut subscriber = Subscriber::new(redis_url, patterns);
    subscriber
        .start(move |msg: PatternMessage| {
            let tx = tx.clone();
            async move {
                match parse_event(&msg) {
                    Some(event) => {
                        let _ = tx.send(event);
                    }
                    None => debug!(channel = %msg.channel, "public gateway: ignoring undecodable delivery"),
                }
            }
        })
        .await?;
    Ok(subscriber)
}

fn parse_event(msg: &PatternMessage) -> Option<GatewayEvent> {
    if msg.channel.contains(":candle:close:") {
        let (symbol, tf) = parse_candle_close_channel(&msg.channel)?;
        let candle: Candle = serde_json::from_str(&msg.payload).ok()?;
        return Some(GatewayEvent::CandleClose { symbol, tf, candle });
    }
    if msg.channel.starts_with("channel:alerts:exchange:") {
        let record: AlertRecord = serde_json::from_str(&msg.payload).ok()?;
        let label = label_from_record(&record)?;
        return Some(GatewayEvent::Signal {
            symbol: record.symbol,
            tf: record.timeframe,
            label,
            price: record.price,
            timestamp_ms: record.triggered_at,
        });
    }
    None
}

/// `channel:exchange:{id}:candle:close:{symbol}:{tf}` -> `(symbol, tf)`.
fn parse_candle_close_channel(channel: &str) -> Option<(String, Timeframe)> {
    let rest = channel.strip_prefix("channel:exchange:")?;
    let (_, rest) = rest.split_once(":candle:close:")?;
    let (symbol, tf_s) = rest.rsplit_once(':')?;
    let tf = Timeframe::from_str(tf_s).ok()?;
    Some((symbol.to_string(), tf))
}

/// Reconstruct the internal `TriggerLabel` from the persisted record's
/// string form so `classify_trigger` can derive the public direction and
/// strength (spec §4.7 "Generic labelling").
pub(crate) fn label_from_record(record: &AlertRecord) -> Option<TriggerLabel> {
    if let Some(n) = record.trigger_label.strip_prefix("level_") {
        return n.parse::<i32>().ok().map(TriggerLabel::Level);
    }
    match record.trigger_label.as_str() {
        "reversal_oversold" => Some(TriggerLabel::ReversalOversold),
        "reversal_overbought" => Some(TriggerLabel::ReversalOverbought),
        _ => {
            warn!(label = %record.trigger_label, "public gateway: unrecognised trigger label");
            None
        }
    }
}

/// Level crossings read as momentum; reversals read as trend (spec §4.7,
/// §4.9 `signal_type ∈ {momentum_signal, trend_signal}`).
pub fn signal_type_for(label: &TriggerLabel) -> PublicSignalType {
    match label {
        TriggerLabel::Level(_) => PublicSignalType::MomentumSignal,
        TriggerLabel::ReversalOversold | TriggerLabel::ReversalOverbought => PublicSignalType::TrendSignal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_candle_close_channel_name() {
        let (symbol, tf) = parse_candle_close_channel("channel:exchange:1:candle:close:BTC-USD:5m").unwrap();
        assert_eq!(symbol, "BTC-USD");
        assert_eq!(tf, Timeframe::M5);
    }

    #[test]
    fn level_label_round_trips() {
        let record = sample_record("level_-150");
        assert_eq!(label_from_record(&record), Some(TriggerLabel::Level(-150)));
    }

    #[test]
    fn reversal_label_round_trips() {
        let record = sample_record("reversal_oversold");
        assert_eq!(label_from_record(&record), Some(TriggerLabel::ReversalOversold));
    }

    #[test]
    fn unrecognised_label_is_dropped() {
        let record = sample_record("something_else");
        assert_eq!(label_from_record(&record), None);
    }

    #[test]
    fn level_crossings_read_as_momentum_reversals_as_trend() {
        assert_eq!(signal_type_for(&TriggerLabel::Level(-150)), PublicSignalType::MomentumSignal);
        assert_eq!(signal_type_for(&TriggerLabel::ReversalOversold), PublicSignalType::TrendSignal);
        assert_eq!(signal_type_for(&TriggerLabel::ReversalOverbought), PublicSignalType::TrendSignal);
    }

    fn sample_record(label: &str) -> AlertRecord {
        AlertRecord {
            id: "x".to_string(),
            exchange_id: "coinbase".to_string(),
            symbol: "BTC-USD".to_string(),
            timeframe: Timeframe::M5,
            alert_type: "macdv".to_string(),
            triggered_at: 0,
            price: 1.0,
            trigger_value: -150.0,
            trigger_label: label.to_string(),
            previous_label: None,
            details: livermore_types::model::AlertDetails {
                direction: livermore_types::model::AlertDirection::Bearish,
                histogram: 0.0,
                signal: 0.0,
                timeframes_snapshot: serde_json::json!({}),
            },
            notification_sent: true,
            notification_error: None,
        }
    }
}
