//! External WebSocket channel name parsing and wildcard matching (spec
//! §4.9, §6). A channel is `{candles|signals}:{symbol|*}:{timeframe|*}`;
//! malformed channels are rejected per-channel without tearing down the
//! session (spec §6 "A malformed channel yields a per-channel error
//! envelope without tearing down the session").

use livermore_types::Timeframe;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Candles,
    Signals,
}

impl ChannelKind {
    fn as_str(self) -> &'static str {
        match self {
            ChannelKind::Candles => "candles",
            ChannelKind::Signals => "signals",
        }
    }
}

/// A segment that is either a concrete value or the `*` wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<T> {
    Wildcard,
    Value(T),
}

impl<T: PartialEq> Segment<T> {
    fn matches(&self, other: &T) -> bool {
        match self {
            Segment::Wildcard => true,
            Segment::Value(v) => v == other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalChannel {
    pub kind: ChannelKind,
    pub symbol: Segment<String>,
    pub timeframe: Segment<Timeframe>,
    pub raw: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ChannelParseError {
    #[error("malformed channel name: {0}")]
    Malformed(String),
    #[error("unknown channel kind: {0}")]
    UnknownKind(String),
    #[error("invalid symbol: {0}")]
    InvalidSymbol(String),
    #[error("invalid timeframe: {0}")]
    InvalidTimeframe(String),
}

/// `[A-Za-z0-9]+-[A-Za-z0-9]+` (spec §6 "Symbol pattern").
fn is_valid_symbol(s: &str) -> bool {
    let Some((base, quote)) = s.split_once('-') else {
        return false;
    };
    !base.is_empty()
        && !quote.is_empty()
        && base.chars().all(|c| c.is_ascii_alphanumeric())
        && quote.chars().all(|c| c.is_ascii_alphanumeric())
}

impl ExternalChannel {
    pub fn parse(raw: &str) -> Result<Self, ChannelParseError> {
        let parts: Vec<&str> = raw.split(':').collect();
        let [kind_s, symbol_s, tf_s] = parts.as_slice() else {
            return Err(ChannelParseError::Malformed(raw.to_string()));
        };

        let kind = match *kind_s {
            "candles" => ChannelKind::Candles,
            "signals" => ChannelKind::Signals,
            other => return Err(ChannelParseError::UnknownKind(other.to_string())),
        };

        let symbol = if *symbol_s == "*" {
            Segment::Wildcard
        } else if is_valid_symbol(symbol_s) {
            Segment::Value(symbol_s.to_string())
        } else {
            return Err(ChannelParseError::InvalidSymbol(symbol_s.to_string()));
        };

        let timeframe = if *tf_s == "*" {
            Segment::Wildcard
        } else {
            Timeframe::from_str(tf_s)
                .map(Segment::Value)
                .map_err(|_| ChannelParseError::InvalidTimeframe(tf_s.to_string()))?
        };

        Ok(Self { kind, symbol, timeframe, raw: raw.to_string() })
    }

    /// True if a concrete `(kind, symbol, tf)` event matches this
    /// subscription, part-wise including wildcards (spec §4.9).
    pub fn matches(&self, kind: ChannelKind, symbol: &str, tf: Timeframe) -> bool {
        self.kind == kind
            && self.symbol.matches(&symbol.to_string())
            && self.timeframe.matches(&tf)
    }
}

impl std::fmt::Display for ExternalChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

pub fn concrete_channel_name(kind: ChannelKind, symbol: &str, tf: Timeframe) -> String {
    format!("{}:{}:{}", kind.as_str(), symbol, tf.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s6_parses_candles_channel() {
        let ch = ExternalChannel::parse("candles:ETH-USD:1h").unwrap();
        assert_eq!(ch.kind, ChannelKind::Candles);
        assert_eq!(ch.symbol, Segment::Value("ETH-USD".to_string()));
        assert_eq!(ch.timeframe, Segment::Value(Timeframe::H1));
    }

    #[test]
    fn s6_parses_wildcard_signal_channel() {
        let ch = ExternalChannel::parse("signals:*:15m").unwrap();
        assert_eq!(ch.symbol, Segment::Wildcard);
        assert!(ch.matches(ChannelKind::Signals, "BTC-USD", Timeframe::M15));
        assert!(!ch.matches(ChannelKind::Signals, "BTC-USD", Timeframe::H1));
    }

    #[test]
    fn rejects_unknown_kind() {
        assert_eq!(
            ExternalChannel::parse("orders:BTC-USD:1h").unwrap_err(),
            ChannelParseError::UnknownKind("orders".to_string())
        );
    }

    #[test]
    fn rejects_bad_symbol_shape() {
        assert!(matches!(
            ExternalChannel::parse("candles:BTCUSD:1h"),
            Err(ChannelParseError::InvalidSymbol(_))
        ));
    }

    #[test]
    fn rejects_unknown_timeframe() {
        assert!(matches!(
            ExternalChannel::parse("candles:BTC-USD:3m"),
            Err(ChannelParseError::InvalidTimeframe(_))
        ));
    }

    #[test]
    fn rejects_missing_segments() {
        assert!(matches!(
            ExternalChannel::parse("candles:BTC-USD"),
            Err(ChannelParseError::Malformed(_))
        ));
    }
}
