//! Typed façade over the Redis-shaped store (spec §4.3, §6 "Cache store
//! wire"). Candles live in a sorted set keyed by timestamp score; tickers
//! and indicators are plain keys, tickers TTL-bounded.
//!
//! Wraps `redis::aio::ConnectionManager`, which auto-reconnects on transient
//! transport failure — the command-connection half of the "two connections
//! per subscriber" rule in spec §4.4 (the other half is `pubsub::Subscriber`).

use std::time::Duration;

use redis::AsyncCommands;
use tracing::{debug, warn};

use livermore_types::model::AlertRecord;
use livermore_types::{Candle, Timeframe, Ticker, TICKER_TTL_SECS};

/// Alert records retained per `(symbol, timeframe)` key (spec §3 "Alert
/// record... Immutable after insert"; bounded so the list stays a cheap
/// recent-history read, not an unbounded audit log).
const ALERT_RECORD_CAP: isize = 500;

use crate::error::Result;
use crate::keys;

/// Cheap to clone: `ConnectionManager` is `Arc`-backed internally (spec §5
/// "shared by value, never behind an external mutex").
#[derive(Clone)]
pub struct Store {
    conn: redis::aio::ConnectionManager,
}

impl Store {
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn })
    }

    /// `redis::aio::ConnectionManager` dereferences to the raw client for
    /// callers (e.g. `pubsub::Subscriber`) that need a fresh dedicated
    /// connection rather than the shared command connection.
    pub fn client_url(&self) -> &redis::aio::ConnectionManager {
        &self.conn
    }

    /// Insert `candle` into the sorted set at `key`, removing any existing
    /// element with the same timestamp score first (spec §4.3
    /// "addCandleIfNewer"). Returns `false` without writing if a
    /// `sequence_num` is supplied on both sides and the new one is not
    /// greater (spec §3 "sequence_num... non-decreasing; lower-sequence
    /// duplicates are discarded").
    pub async fn add_candle_if_newer(&self, key: &str, candle: &Candle, ttl: Option<Duration>) -> Result<bool> {
        let mut conn = self.conn.clone();

        if let Some(new_seq) = candle.sequence_num {
            let existing: Vec<String> = conn
                .zrangebyscore(key, candle.timestamp, candle.timestamp)
                .await?;
            if let Some(raw) = existing.first() {
                if let Ok(prior) = serde_json::from_str::<Candle>(raw) {
                    if let Some(prior_seq) = prior.sequence_num {
                        if new_seq < prior_seq {
                            debug!(key, new_seq, prior_seq, "discarding lower-sequence candle");
                            return Ok(false);
                        }
                    }
                }
            }
        }

        let payload = serde_json::to_string(candle)?;
        let _: () = conn.zrembyscore(key, candle.timestamp, candle.timestamp).await?;
        let _: () = conn.zadd(key, payload, candle.timestamp).await?;
        if let Some(ttl) = ttl {
            let _: () = conn.expire(key, ttl.as_secs() as i64).await?;
        }
        Ok(true)
    }

    /// Inclusive range read by timestamp score.
    pub async fn read_candles_range(&self, key: &str, start_ms: i64, end_ms: i64) -> Result<Vec<Candle>> {
        let mut conn = self.conn.clone();
        let raw: Vec<String> = conn.zrangebyscore(key, start_ms, end_ms).await?;
        Ok(decode_candles(raw))
    }

    /// Last `n` candles in ascending order (`ZRANGE key -n -1`).
    pub async fn read_latest_candles(&self, key: &str, n: isize) -> Result<Vec<Candle>> {
        let mut conn = self.conn.clone();
        let raw: Vec<String> = conn.zrange(key, -n, -1).await?;
        Ok(decode_candles(raw))
    }

    /// Dual-read policy (spec §4.3/§9): tier 1 first, then the legacy
    /// user-scoped key, then tier 2. Returns the first tier that has data.
    pub async fn read_candles_dual(
        &self,
        exchange_id: &str,
        symbol: &str,
        tf: Timeframe,
        user_id: Option<&str>,
        n: isize,
    ) -> Result<Vec<Candle>> {
        let shared_key = keys::candle_shared(exchange_id, symbol, tf);
        let shared = self.read_latest_candles(&shared_key, n).await?;
        if !shared.is_empty() {
            return Ok(shared);
        }

        if let Some(user_id) = user_id {
            let legacy_key = keys::candle_legacy(user_id, symbol, tf);
            let legacy = self.read_latest_candles(&legacy_key, n).await?;
            if !legacy.is_empty() {
                return Ok(legacy);
            }

            let tier2_key = keys::candle_user(user_id, exchange_id, symbol, tf);
            return self.read_latest_candles(&tier2_key, n).await;
        }

        Ok(Vec::new())
    }

    pub async fn write_ticker(&self, exchange_id: &str, symbol: &str, ticker: &Ticker) -> Result<()> {
        let mut conn = self.conn.clone();
        let key = keys::ticker(exchange_id, symbol);
        let payload = serde_json::to_string(ticker)?;
        let _: () = conn.set_ex(key, payload, TICKER_TTL_SECS).await?;
        Ok(())
    }

    pub async fn read_ticker(&self, exchange_id: &str, symbol: &str) -> Result<Option<Ticker>> {
        let mut conn = self.conn.clone();
        let key = keys::ticker(exchange_id, symbol);
        let raw: Option<String> = conn.get(key).await?;
        Ok(raw.and_then(|s| serde_json::from_str(&s).ok()))
    }

    pub async fn write_indicator_raw(&self, key: &str, payload: &str, ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.conn.clone();
        match ttl {
            Some(ttl) => {
                let _: () = conn.set_ex(key, payload, ttl.as_secs()).await?;
            }
            None => {
                let _: () = conn.set(key, payload).await?;
            }
        }
        Ok(())
    }

    pub async fn read_indicator_raw(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        Ok(conn.get(key).await?)
    }

    /// Prepend `record` to its `(symbol, timeframe)` list and trim to
    /// `ALERT_RECORD_CAP` (spec §4.7 "a persistent alert record").
    pub async fn append_alert_record(&self, exchange_id: &str, record: &AlertRecord) -> Result<()> {
        let mut conn = self.conn.clone();
        let key = keys::alert_records(exchange_id, &record.symbol, record.timeframe);
        let payload = serde_json::to_string(record)?;
        let _: () = conn.lpush(&key, payload).await?;
        let _: () = conn.ltrim(&key, 0, ALERT_RECORD_CAP - 1).await?;
        Ok(())
    }

    /// Most recent `n` alert records, newest first.
    pub async fn read_alert_records(
        &self,
        exchange_id: &str,
        symbol: &str,
        tf: Timeframe,
        n: isize,
    ) -> Result<Vec<AlertRecord>> {
        let mut conn = self.conn.clone();
        let key = keys::alert_records(exchange_id, symbol, tf);
        let raw: Vec<String> = conn.lrange(&key, 0, n - 1).await?;
        Ok(raw
            .into_iter()
            .filter_map(|s| match serde_json::from_str::<AlertRecord>(&s) {
                Ok(r) => Some(r),
                Err(e) => {
                    warn!(error = %e, "dropping malformed alert record from cache");
                    None
                }
            })
            .collect())
    }

    pub async fn publish(&self, channel: &str, payload: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.publish(channel, payload).await?;
        Ok(())
    }

    /// Cluster-safe deletion: `SCAN` the pattern, then issue one `DEL` per
    /// matched key (spec §6/§9 "never derive correctness from atomic
    /// multi-key semantics"). Never a glob `KEYS` call, never a multi-key
    /// `DEL`.
    pub async fn scan_delete(&self, pattern: &str) -> Result<u64> {
        let mut conn = self.conn.clone();
        let mut deleted = 0u64;
        let mut cursor = 0u64;
        loop {
            let (next_cursor, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(200)
                .query_async(&mut conn)
                .await?;
            for key in batch {
                match conn.del::<_, ()>(&key).await {
                    Ok(()) => deleted += 1,
                    Err(e) => warn!(key, error = %e, "scan_delete: per-key DEL failed"),
                }
            }
            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }
        Ok(deleted)
    }
}

fn decode_candles(raw: Vec<String>) -> Vec<Candle> {
    raw.into_iter()
        .filter_map(|s| match serde_json::from_str::<Candle>(&s) {
            Ok(c) => Some(c),
            Err(e) => {
                warn!(error = %e, "dropping malformed candle payload from cache");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use livermore_types::Timeframe;

    #[test]
    fn decode_candles_skips_malformed_entries() {
        let raw = vec![
            serde_json::to_string(&Candle::new(0, "BTC-USD", Timeframe::M5, 1.0, 2.0, 0.5, 1.5, 10.0)).unwrap(),
            "not json".to_string(),
        ];
        let out = decode_candles(raw);
        assert_eq!(out.len(), 1);
    }
}
