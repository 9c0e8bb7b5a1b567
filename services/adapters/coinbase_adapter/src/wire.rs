//! Coinbase Advanced Trade wire shapes (spec §6 "Exchange WebSocket
//! ingress" — abstracted over, not bit-exact to any one exchange).

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct WireEnvelope {
    pub channel: String,
    #[serde(default)]
    pub events: Vec<WireEvent>,
}

#[derive(Debug, Deserialize)]
pub struct WireEvent {
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(default)]
    pub candles: Vec<WireCandle>,
    #[serde(default)]
    pub tickers: Vec<WireTicker>,
}

#[derive(Debug, Deserialize)]
pub struct WireCandle {
    pub start: String,
    pub open: String,
    pub high: String,
    pub low: String,
    pub close: String,
    pub volume: String,
    pub product_id: String,
}

impl WireCandle {
    pub fn timestamp_ms(&self) -> Option<i64> {
        self.start.parse::<i64>().ok().map(|secs| secs * 1000)
    }

    pub fn parse_f64(&self, field: &str) -> Option<f64> {
        match field {
            "open" => self.open.parse().ok(),
            "high" => self.high.parse().ok(),
            "low" => self.low.parse().ok(),
            "close" => self.close.parse().ok(),
            "volume" => self.volume.parse().ok(),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WireTicker {
    pub product_id: String,
    pub price: String,
    #[serde(rename = "price_percent_chg_24_h", default)]
    pub change_percent_24h: Option<String>,
    #[serde(rename = "volume_24_h", default)]
    pub volume_24h: Option<String>,
    #[serde(rename = "low_24_h", default)]
    pub low_24h: Option<String>,
    #[serde(rename = "high_24_h", default)]
    pub high_24h: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct SubscribeFrame<'a> {
    #[serde(rename = "type")]
    pub action: &'a str,
    pub channel: &'a str,
    pub product_ids: &'a [String],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_candle_envelope() {
        let raw = r#"{
            "channel": "candles",
            "events": [{
                "type": "update",
                "candles": [{
                    "start": "1704067200",
                    "open": "100.0",
                    "high": "105.0",
                    "low": "99.0",
                    "close": "103.0",
                    "volume": "1000.0",
                    "product_id": "BTC-USD"
                }]
            }]
        }"#;
        let envelope: WireEnvelope = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.channel, "candles");
        let candle = &envelope.events[0].candles[0];
        assert_eq!(candle.timestamp_ms(), Some(1_704_067_200_000));
        assert_eq!(candle.parse_f64("close"), Some(103.0));
    }
}
