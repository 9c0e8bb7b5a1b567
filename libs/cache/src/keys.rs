//! The sole key-string constructor for the cache layer (spec §3 ownership
//! rule: "The cache layer owns key naming; no other component constructs
//! key strings."). Every reader/writer elsewhere in the workspace calls
//! into this module rather than formatting keys itself.

use livermore_types::Timeframe;

/// Tier 1 shared candle key: `candles:{exchangeId}:{symbol}:{tf}`.
pub fn candle_shared(exchange_id: &str, symbol: &str, tf: Timeframe) -> String {
    format!("candles:{exchange_id}:{symbol}:{}", tf.as_str())
}

/// Tier 2 user-overflow candle key (TTL-bounded):
/// `usercandles:{userId}:{exchangeId}:{symbol}:{tf}`.
pub fn candle_user(user_id: &str, exchange_id: &str, symbol: &str, tf: Timeframe) -> String {
    format!("usercandles:{user_id}:{exchange_id}:{symbol}:{}", tf.as_str())
}

/// Deprecated-in-place legacy user-scoped candle key, kept readable during
/// the dual-read migration window (spec §9 "Deprecated-in-place migration").
/// `candles:{userId}:{symbol}:{tf}` — the pre-tiering key shape.
pub fn candle_legacy(user_id: &str, symbol: &str, tf: Timeframe) -> String {
    format!("candles:{user_id}:{symbol}:{}", tf.as_str())
}

/// Tier 1 indicator key, with optional sorted param suffix:
/// `indicator:{exchangeId}:{symbol}:{tf}:{type}[:sortedParams]`.
pub fn indicator_shared(
    exchange_id: &str,
    symbol: &str,
    tf: Timeframe,
    indicator_type: &str,
    sorted_params: Option<&str>,
) -> String {
    let base = format!(
        "indicator:{exchange_id}:{symbol}:{}:{indicator_type}",
        tf.as_str()
    );
    match sorted_params {
        Some(params) => format!("{base}:{params}"),
        None => base,
    }
}

/// Tier 2 user-overflow indicator key (TTL-bounded):
/// `userindicator:{userId}:{exchangeId}:{symbol}:{tf}:{type}`.
pub fn indicator_user(
    user_id: &str,
    exchange_id: &str,
    symbol: &str,
    tf: Timeframe,
    indicator_type: &str,
) -> String {
    format!(
        "userindicator:{user_id}:{exchange_id}:{symbol}:{}:{indicator_type}",
        tf.as_str()
    )
}

/// Ticker key (60s TTL): `ticker:{exchangeId}:{symbol}`.
pub fn ticker(exchange_id: &str, symbol: &str) -> String {
    format!("ticker:{exchange_id}:{symbol}")
}

/// Candle-close pub/sub channel:
/// `channel:exchange:{exchangeId}:candle:close:{symbol}:{tf}`.
pub fn channel_candle_close(exchange_id: &str, symbol: &str, tf: Timeframe) -> String {
    format!("channel:exchange:{exchange_id}:candle:close:{symbol}:{}", tf.as_str())
}

/// Pattern for subscribing to every symbol/timeframe close on an exchange.
pub fn pattern_candle_close(exchange_id: &str) -> String {
    format!("channel:exchange:{exchange_id}:candle:close:*:*")
}

/// Per-indicator-type publish channel, mirroring the candle-close shape so
/// the aggregation service can announce a fresh indicator write.
pub fn channel_indicator(exchange_id: &str, symbol: &str, tf: Timeframe, indicator_type: &str) -> String {
    format!(
        "channel:exchange:{exchange_id}:indicator:{indicator_type}:{symbol}:{}",
        tf.as_str()
    )
}

pub fn pattern_indicator(exchange_id: &str, indicator_type: &str) -> String {
    format!("channel:exchange:{exchange_id}:indicator:{indicator_type}:*:*")
}

/// Ticker update channel, published by the adapter alongside the ticker
/// cache write (spec §4.5 "Ticker handling... publish on the ticker
/// channel").
pub fn channel_ticker(exchange_id: &str, symbol: &str) -> String {
    format!("channel:exchange:{exchange_id}:ticker:{symbol}")
}

/// Alert pub/sub channel: `channel:alerts:exchange:{exchangeId}`.
pub fn channel_alerts(exchange_id: &str) -> String {
    format!("channel:alerts:exchange:{exchange_id}")
}

/// Alert record persistence list, capped and newest-first:
/// `alerts:{exchangeId}:{symbol}:{tf}`.
pub fn alert_records(exchange_id: &str, symbol: &str, tf: Timeframe) -> String {
    format!("alerts:{exchange_id}:{symbol}:{}", tf.as_str())
}

/// Control-channel command channel: `livermore:commands:{identitySub}`.
pub fn channel_commands(identity_sub: &str) -> String {
    format!("livermore:commands:{identity_sub}")
}

/// Control-channel response channel: `livermore:responses:{identitySub}`.
pub fn channel_responses(identity_sub: &str) -> String {
    format!("livermore:responses:{identity_sub}")
}

/// Backfill request channel published by the supervisor's `force-backfill`
/// handler: `channel:backfill:exchange:{exchangeId}`. The startup-backfill
/// bootstrap is an external collaborator specified only by its contract
/// (populate tier-1 candle keys with a minimum history before adapters
/// publish); this channel is the request half of that contract for an
/// on-demand re-run.
pub fn channel_backfill_request(exchange_id: &str) -> String {
    format!("channel:backfill:exchange:{exchange_id}")
}

/// Glob pattern for cluster-safe `SCAN`-then-`DEL` deletion scoped to an
/// exchange's candle keys (spec §6 "Deletions for clear-cache use SCAN +
/// per-key DEL iteration to remain cluster-safe").
pub fn scan_pattern_candles(exchange_id: &str, symbol: Option<&str>, tf: Option<Timeframe>) -> String {
    match (symbol, tf) {
        (Some(s), Some(t)) => format!("candles:{exchange_id}:{s}:{}", t.as_str()),
        (Some(s), None) => format!("candles:{exchange_id}:{s}:*"),
        (None, _) => format!("candles:{exchange_id}:*"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candle_key_shape() {
        assert_eq!(
            candle_shared("1", "BTC-USD", Timeframe::M5),
            "candles:1:BTC-USD:5m"
        );
    }

    #[test]
    fn user_candle_key_shape() {
        assert_eq!(
            candle_user("u1", "1", "BTC-USD", Timeframe::M5),
            "usercandles:u1:1:BTC-USD:5m"
        );
    }

    #[test]
    fn indicator_key_with_params() {
        assert_eq!(
            indicator_shared("1", "BTC-USD", Timeframe::M15, "macd-v", Some("12_26_9")),
            "indicator:1:BTC-USD:15m:macd-v:12_26_9"
        );
    }

    #[test]
    fn candle_close_channel_shape() {
        assert_eq!(
            channel_candle_close("1", "BTC-USD", Timeframe::M5),
            "channel:exchange:1:candle:close:BTC-USD:5m"
        );
    }

    #[test]
    fn backfill_request_channel_shape() {
        assert_eq!(channel_backfill_request("1"), "channel:backfill:exchange:1");
    }

    #[test]
    fn scan_pattern_scopes_by_specificity() {
        assert_eq!(scan_pattern_candles("1", None, None), "candles:1:*");
        assert_eq!(
            scan_pattern_candles("1", Some("BTC-USD"), None),
            "candles:1:BTC-USD:*"
        );
    }
}
