//! Binance Spot adapter: connect/subscribe/disconnect lifecycle, message
//! routing, normalisation, and cache publish (spec §4.5).

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use livermore_adapter_core::{
    Adapter, AdapterError, AdapterHealth, BackoffConfig, ConnectionState, ExponentialBackoff,
    Result, SubscriptionRegistry, Watchdog,
};
use livermore_cache::{keys, Store};
use livermore_types::{Candle, Ticker, Timeframe};

use crate::config::BinanceAdapterConfig;
use crate::wire::{stream_params, SubscribeFrame, WireData, WireEnvelope};

pub struct BinanceAdapter {
    config: BinanceAdapterConfig,
    store: Store,
    registry: Arc<SubscriptionRegistry>,
    state: Arc<RwLock<ConnectionState>>,
    intentional_close: Arc<AtomicBool>,
    outbound: Arc<RwLock<Option<mpsc::UnboundedSender<Message>>>>,
    messages_processed: Arc<AtomicU64>,
    reconnect_attempts: Arc<AtomicU64>,
    last_error: Arc<RwLock<Option<String>>>,
    next_request_id: Arc<AtomicU64>,
}

impl BinanceAdapter {
    pub fn new(config: BinanceAdapterConfig, store: Store) -> Self {
        Self {
            config,
            store,
            registry: Arc::new(SubscriptionRegistry::new()),
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            intentional_close: Arc::new(AtomicBool::new(false)),
            outbound: Arc::new(RwLock::new(None)),
            messages_processed: Arc::new(AtomicU64::new(0)),
            reconnect_attempts: Arc::new(AtomicU64::new(0)),
            last_error: Arc::new(RwLock::new(None)),
            next_request_id: Arc::new(AtomicU64::new(1)),
        }
    }

    fn exchange_id(&self) -> &str {
        &self.config.exchange_id
    }

    async fn run_connection_loop(self: Arc<Self>) {
        let mut backoff = ExponentialBackoff::new(BackoffConfig {
            initial: Duration::from_millis(self.config.backoff_initial_ms),
            cap: Duration::from_secs(self.config.backoff_cap_secs),
            max_attempts: self.config.max_reconnect_attempts,
        });

        loop {
            *self.state.write() = ConnectionState::Connecting;
            match self.clone().connect_once().await {
                Ok(()) => {
                    backoff.reset();
                    if self.intentional_close.load(Ordering::SeqCst) {
                        *self.state.write() = ConnectionState::Disconnected;
                        return;
                    }
                    *self.state.write() = ConnectionState::Reconnecting;
                }
                Err(e) => {
                    warn!(error = %e, "binance adapter: connection attempt failed");
                    *self.last_error.write() = Some(e.to_string());
                }
            }

            if self.intentional_close.load(Ordering::SeqCst) {
                *self.state.write() = ConnectionState::Disconnected;
                return;
            }

            match backoff.next_delay() {
                Some(delay) => {
                    self.reconnect_attempts.fetch_add(1, Ordering::Relaxed);
                    info!(delay_ms = delay.as_millis() as u64, "binance adapter: backing off before reconnect");
                    tokio::time::sleep(delay).await;
                }
                None => {
                    error!("binance adapter: max reconnect attempts reached, giving up");
                    *self.last_error.write() =
                        Some(AdapterError::MaxReconnectAttemptsReached(self.config.max_reconnect_attempts).to_string());
                    *self.state.write() = ConnectionState::Disconnected;
                    return;
                }
            }
        }
    }

    async fn connect_once(self: Arc<Self>) -> Result<()> {
        let (ws_stream, _) = tokio_tungstenite::connect_async(&self.config.ws_url)
            .await
            .map_err(|e| AdapterError::ConnectionFailed(e.to_string()))?;
        let (mut write, mut read) = ws_stream.split();

        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
        *self.outbound.write() = Some(tx);
        *self.state.write() = ConnectionState::Connected;
        info!(exchange = self.exchange_id(), "binance adapter connected");

        self.resubscribe_all().await;
        *self.state.write() = ConnectionState::Subscribed;

        let writer_task = tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                if write.send(msg).await.is_err() {
                    break;
                }
            }
        });

        let mut watchdog = Watchdog::new(Duration::from_secs(self.config.watchdog_secs));
        loop {
            tokio::select! {
                _ = tokio::time::sleep(watchdog.remaining()) => {
                    if watchdog.is_expired() {
                        warn!("binance adapter: watchdog expired, forcing reconnect");
                        break;
                    }
                }
                maybe_msg = read.next() => {
                    let Some(msg) = maybe_msg else { break };
                    match msg {
                        Ok(Message::Text(text)) => {
                            watchdog.touch();
                            self.messages_processed.fetch_add(1, Ordering::Relaxed);
                            let this = self.clone();
                            let text = text.to_string();
                            tokio::spawn(async move { this.handle_text(&text).await });
                        }
                        Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => watchdog.touch(),
                        Ok(Message::Close(_)) => {
                            info!("binance adapter: server closed connection");
                            break;
                        }
                        Ok(_) => {}
                        Err(e) => {
                            warn!(error = %e, "binance adapter: read error");
                            break;
                        }
                    }
                }
            }
        }

        writer_task.abort();
        *self.outbound.write() = None;
        Ok(())
    }

    async fn resubscribe_all(&self) {
        let snapshot = self.registry.snapshot();
        if snapshot.is_empty() {
            return;
        }
        let symbols: Vec<String> = snapshot.into_iter().map(|(s, _)| s).collect();
        self.send_subscribe_frame(&symbols).await;
    }

    async fn send_subscribe_frame(&self, symbols: &[String]) {
        let params: Vec<String> = symbols.iter().flat_map(|s| stream_params(s)).collect();
        let id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let frame = SubscribeFrame {
            method: "SUBSCRIBE",
            params,
            id,
        };
        let Ok(payload) = serde_json::to_string(&frame) else { return };
        let sender = self.outbound.read().clone();
        if let Some(sender) = sender {
            if sender.send(Message::Text(payload.into())).is_err() {
                warn!("binance adapter: failed to enqueue subscribe frame, socket likely closed");
            }
        }
    }

    async fn handle_text(self: Arc<Self>, text: &str) {
        let envelope: WireEnvelope = match serde_json::from_str(text) {
            Ok(e) => e,
            Err(e) => {
                debug!(error = %e, "binance adapter: non-envelope frame ignored");
                return;
            }
        };

        match envelope.data {
            WireData::Kline { s, k } => {
                if let Err(e) = self.handle_kline(&s, k).await {
                    error!(error = %e, "binance adapter: kline handling failed");
                }
            }
            WireData::MiniTicker { s, c, o, h, l, v } => {
                if let Err(e) = self.handle_mini_ticker(&s, &c, &o, &h, &l, &v).await {
                    error!(error = %e, "binance adapter: ticker handling failed");
                }
            }
        }
    }

    async fn handle_kline(&self, symbol: &str, k: crate::wire::WireKline) -> Result<()> {
        let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = (
            k.parse_f64("open"),
            k.parse_f64("high"),
            k.parse_f64("low"),
            k.parse_f64("close"),
            k.parse_f64("volume"),
        ) else {
            return Ok(());
        };

        let candle = Candle::new(k.t, symbol, Timeframe::M5, open, high, low, close, volume);
        let key = keys::candle_shared(self.exchange_id(), symbol, Timeframe::M5);
        self.store.add_candle_if_newer(&key, &candle, None).await?;

        // Binance's `x` flag is ground truth for closed candles (spec §4.5).
        if k.x {
            let channel = keys::channel_candle_close(self.exchange_id(), symbol, Timeframe::M5);
            let payload = serde_json::to_string(&candle)?;
            self.store.publish(&channel, &payload).await?;
            debug!(symbol, timestamp = candle.timestamp, "binance adapter: candle closed, published");
        }
        Ok(())
    }

    async fn handle_mini_ticker(
        &self,
        symbol: &str,
        close: &str,
        _open: &str,
        high: &str,
        low: &str,
        volume: &str,
    ) -> Result<()> {
        let Ok(price) = close.parse::<f64>() else { return Ok(()) };
        let ticker = Ticker {
            price,
            change_24h: 0.0,
            change_percent_24h: 0.0,
            volume_24h: volume.parse().unwrap_or(0.0),
            low_24h: low.parse().unwrap_or(0.0),
            high_24h: high.parse().unwrap_or(0.0),
            timestamp: chrono::Utc::now().timestamp_millis(),
        };
        self.store.write_ticker(self.exchange_id(), symbol, &ticker).await?;
        let channel = keys::channel_ticker(self.exchange_id(), symbol);
        let payload = serde_json::to_string(&ticker)?;
        self.store.publish(&channel, &payload).await?;
        Ok(())
    }
}

#[async_trait]
impl Adapter for BinanceAdapter {
    async fn connect(&self) -> Result<()> {
        self.intentional_close.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn subscribe(&self, symbols: &[String], timeframe: Timeframe) -> Result<()> {
        self.registry.record(symbols, timeframe);
        self.send_subscribe_frame(symbols).await;
        Ok(())
    }

    async fn unsubscribe(&self, symbols: &[String]) -> Result<()> {
        self.registry.remove(symbols);
        let params: Vec<String> = symbols.iter().flat_map(|s| stream_params(s)).collect();
        let id = self.next_request_id.fetch_add(1, Ordering::Relaxed);
        let frame = SubscribeFrame {
            method: "UNSUBSCRIBE",
            params,
            id,
        };
        if let Ok(payload) = serde_json::to_string(&frame) {
            if let Some(sender) = self.outbound.read().clone() {
                let _ = sender.send(Message::Text(payload.into()));
            }
        }
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.intentional_close.store(true, Ordering::SeqCst);
        let sender = self.outbound.write().take();
        drop(sender);
        *self.state.write() = ConnectionState::Disconnecting;
        Ok(())
    }

    fn health(&self) -> AdapterHealth {
        AdapterHealth {
            state: *self.state.read(),
            messages_processed: self.messages_processed.load(Ordering::Relaxed),
            reconnect_attempts: self.reconnect_attempts.load(Ordering::Relaxed) as u32,
            last_error: self.last_error.read().clone(),
        }
    }
}

impl BinanceAdapter {
    pub fn spawn(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run_connection_loop())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_to_binance_exchange() {
        let config = BinanceAdapterConfig::default();
        assert_eq!(config.exchange_id, "binance");
    }
}
