//! Binance Spot combined-stream wire shapes (spec §6).

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct WireEnvelope {
    pub stream: String,
    pub data: WireData,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "e")]
pub enum WireData {
    #[serde(rename = "kline")]
    Kline {
        s: String,
        k: WireKline,
    },
    #[serde(rename = "24hrMiniTicker")]
    MiniTicker {
        s: String,
        c: String,
        o: String,
        h: String,
        l: String,
        v: String,
    },
}

#[derive(Debug, Deserialize)]
pub struct WireKline {
    /// Kline start time, ms.
    pub t: i64,
    pub o: String,
    pub h: String,
    pub l: String,
    pub c: String,
    pub v: String,
    /// Is this kline closed? Ground truth for Binance (spec §4.5).
    pub x: bool,
}

impl WireKline {
    pub fn parse_f64(&self, field: &str) -> Option<f64> {
        match field {
            "open" => self.o.parse().ok(),
            "high" => self.h.parse().ok(),
            "low" => self.l.parse().ok(),
            "close" => self.c.parse().ok(),
            "volume" => self.v.parse().ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubscribeFrame<'a> {
    pub method: &'a str,
    pub params: Vec<String>,
    pub id: u64,
}

/// Build the combined-stream subscription params for a symbol's 5m kline
/// and mini-ticker channels.
pub fn stream_params(symbol: &str) -> Vec<String> {
    let lower = symbol.to_lowercase();
    vec![format!("{lower}@kline_5m"), format!("{lower}@miniTicker")]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kline_envelope() {
        let raw = r#"{
            "stream": "btcusdt@kline_5m",
            "data": {
                "e": "kline",
                "s": "BTCUSDT",
                "k": {"t": 1704067200000, "o": "100.0", "h": "105.0", "l": "99.0", "c": "103.0", "v": "1000.0", "x": true}
            }
        }"#;
        let envelope: WireEnvelope = serde_json::from_str(raw).unwrap();
        match envelope.data {
            WireData::Kline { s, k } => {
                assert_eq!(s, "BTCUSDT");
                assert!(k.x);
                assert_eq!(k.parse_f64("close"), Some(103.0));
            }
            _ => panic!("expected kline"),
        }
    }

    #[test]
    fn stream_params_lowercases_symbol() {
        let params = stream_params("BTCUSDT");
        assert_eq!(params, vec!["btcusdt@kline_5m", "btcusdt@miniTicker"]);
    }
}
