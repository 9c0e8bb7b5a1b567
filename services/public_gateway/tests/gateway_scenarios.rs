//! Integration coverage for spec §8 scenario S6 (public WebSocket
//! subscription) and the whitelist property (public payloads never carry
//! internal MACD-V/label fields), driven directly against the crate's
//! session and rendering primitives rather than a live socket.

use livermore_public_gateway::channel::{ChannelKind, ExternalChannel};
use livermore_public_gateway::fanout::{signal_type_for, GatewayEvent};
use livermore_public_gateway::ws::session::SessionState;
use livermore_types::envelope::{to_public_candle, to_public_signal};
use livermore_types::model::TriggerLabel;
use livermore_types::{Candle, Timeframe};

#[test]
fn s6_subscribe_then_matching_candle_close_is_delivered() {
    let session = SessionState::new("key-1".to_string());
    for raw in ["candles:ETH-USD:1h", "signals:*:15m"] {
        session.subscribe(ExternalChannel::parse(raw).unwrap());
    }
    assert_eq!(session.channels().len(), 2);

    let close = GatewayEvent::CandleClose {
        symbol: "ETH-USD".to_string(),
        tf: Timeframe::H1,
        candle: Candle::new(1_704_067_200_000, "ETH-USD", Timeframe::H1, 2000.0, 2050.0, 1990.0, 2040.0, 500.0),
    };
    assert!(session.matches(close.kind(), close.symbol(), close.timeframe()));

    let other = GatewayEvent::CandleClose {
        symbol: "BTC-USD".to_string(),
        tf: Timeframe::H1,
        candle: Candle::new(1_704_067_200_000, "BTC-USD", Timeframe::H1, 1.0, 1.0, 1.0, 1.0, 1.0),
    };
    assert!(!session.matches(other.kind(), other.symbol(), other.timeframe()));
}

#[test]
fn s6_wildcard_signal_subscription_matches_any_symbol_at_its_timeframe() {
    let session = SessionState::new("key-2".to_string());
    session.subscribe(ExternalChannel::parse("signals:*:15m").unwrap());

    let signal = GatewayEvent::Signal {
        symbol: "SOL-USD".to_string(),
        tf: Timeframe::M15,
        label: TriggerLabel::Level(-200),
        price: 140.0,
        timestamp_ms: 1_704_067_200_000,
    };
    assert!(session.matches(signal.kind(), signal.symbol(), signal.timeframe()));

    let wrong_tf = GatewayEvent::Signal {
        symbol: "SOL-USD".to_string(),
        tf: Timeframe::H1,
        label: TriggerLabel::Level(-200),
        price: 140.0,
        timestamp_ms: 1_704_067_200_000,
    };
    assert!(!session.matches(wrong_tf.kind(), wrong_tf.symbol(), wrong_tf.timeframe()));
}

#[test]
fn malformed_channel_is_rejected_without_affecting_existing_subscriptions() {
    let session = SessionState::new("key-3".to_string());
    session.subscribe(ExternalChannel::parse("candles:BTC-USD:5m").unwrap());
    assert!(ExternalChannel::parse("candles:BTC-USD:3m").is_err());
    assert_eq!(session.channels(), vec!["candles:BTC-USD:5m".to_string()]);
}

#[test]
fn public_payloads_never_carry_internal_fields() {
    let candle = Candle::new(1_704_067_200_000, "BTC-USD", Timeframe::M5, 100.0, 101.0, 99.0, 100.5, 10.0);
    let public_candle = to_public_candle(&candle);
    let candle_json = serde_json::to_string(&public_candle).unwrap();
    for forbidden in ["isSynthetic", "sequenceNum", "symbol"] {
        assert!(!candle_json.contains(forbidden));
    }

    let label = TriggerLabel::ReversalOversold;
    let signal = to_public_signal(
        "BTC-USD",
        "coinbase",
        Timeframe::M5,
        signal_type_for(&label),
        &label,
        100.0,
        1_704_067_200_000,
    );
    let signal_json = serde_json::to_string(&signal).unwrap();
    for forbidden in ["macdV", "histogram", "fastEMA", "slowEMA", "atr", "reversal_oversold"] {
        assert!(!signal_json.contains(forbidden));
    }
    assert!(signal_json.contains("trend_signal"));
}

#[test]
fn channel_kind_distinguishes_candles_and_signals() {
    let ch = ExternalChannel::parse("candles:*:*").unwrap();
    assert!(ch.matches(ChannelKind::Candles, "ANY-USD", Timeframe::D1));
    assert!(!ch.matches(ChannelKind::Signals, "ANY-USD", Timeframe::D1));
}
