//! Coinbase Advanced Trade adapter: connect/subscribe/disconnect lifecycle,
//! message routing, normalisation, and cache publish (spec §4.5).

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
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

use crate::config::CoinbaseAdapterConfig;
use crate::wire::{SubscribeFrame, WireEnvelope};

pub struct CoinbaseAdapter {
    config: CoinbaseAdapterConfig,
    store: Store,
    registry: Arc<SubscriptionRegistry>,
    state: Arc<RwLock<ConnectionState>>,
    intentional_close: Arc<AtomicBool>,
    outbound: Arc<RwLock<Option<mpsc::UnboundedSender<Message>>>>,
    messages_processed: Arc<AtomicU64>,
    reconnect_attempts: Arc<AtomicU64>,
    last_error: Arc<RwLock<Option<String>>>,
    /// Latest candle observed per symbol, used to detect a Coinbase close
    /// via strict timestamp advance (spec §4.5: "timestamp strictly
    /// greater than the previously seen timestamp for Coinbase").
    open_candles: Arc<DashMap<String, Candle>>,
}

impl CoinbaseAdapter {
    pub fn new(config: CoinbaseAdapterConfig, store: Store) -> Self {
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
            open_candles: Arc::new(DashMap::new()),
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
                    // connect_once only returns once the socket has closed.
                    backoff.reset();
                    if self.intentional_close.load(Ordering::SeqCst) {
                        *self.state.write() = ConnectionState::Disconnected;
                        return;
                    }
                    *self.state.write() = ConnectionState::Reconnecting;
                }
                Err(e) => {
                    warn!(error = %e, "coinbase adapter: connection attempt failed");
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
                    info!(delay_ms = delay.as_millis() as u64, "coinbase adapter: backing off before reconnect");
                    tokio::time::sleep(delay).await;
                }
                None => {
                    error!("coinbase adapter: max reconnect attempts reached, giving up");
                    *self.last_error.write() =
                        Some(AdapterError::MaxReconnectAttemptsReached(self.config.max_reconnect_attempts).to_string());
                    *self.state.write() = ConnectionState::Disconnected;
                    return;
                }
            }
        }
    }

    /// Open one WebSocket connection, resubscribe every recorded symbol,
    /// and run the read loop with the silence watchdog until the socket
    /// closes or errors. Returns `Ok(())` on any clean/unclean close so the
    /// caller can decide whether to reconnect.
    async fn connect_once(self: Arc<Self>) -> Result<()> {
        let (ws_stream, _) = tokio_tungstenite::connect_async(&self.config.ws_url)
            .await
            .map_err(|e| AdapterError::ConnectionFailed(e.to_string()))?;
        let (mut write, mut read) = ws_stream.split();

        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();
        *self.outbound.write() = Some(tx);
        *self.state.write() = ConnectionState::Connected;
        info!(exchange = self.exchange_id(), "coinbase adapter connected");

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
                        warn!("coinbase adapter: watchdog expired, forcing reconnect");
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
                            info!("coinbase adapter: server closed connection");
                            break;
                        }
                        Ok(_) => {}
                        Err(e) => {
                            warn!(error = %e, "coinbase adapter: read error");
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
        let mut by_tf: std::collections::HashMap<Timeframe, Vec<String>> = std::collections::HashMap::new();
        for (symbol, tf) in snapshot {
            by_tf.entry(tf).or_default().push(symbol);
        }
        for (tf, symbols) in by_tf {
            self.send_subscribe_frames(&symbols, tf).await;
        }
    }

    async fn send_subscribe_frames(&self, symbols: &[String], _tf: Timeframe) {
        let candle_frame = SubscribeFrame {
            action: "subscribe",
            channel: "candles",
            product_ids: symbols,
        };
        let ticker_frame = SubscribeFrame {
            action: "subscribe",
            channel: "ticker",
            product_ids: symbols,
        };
        self.send_frame(&candle_frame).await;
        self.send_frame(&ticker_frame).await;
    }

    async fn send_frame(&self, frame: &SubscribeFrame<'_>) {
        let Ok(payload) = serde_json::to_string(frame) else {
            return;
        };
        let sender = self.outbound.read().clone();
        if let Some(sender) = sender {
            if sender.send(Message::Text(payload.into())).is_err() {
                warn!("coinbase adapter: failed to enqueue subscribe frame, socket likely closed");
            }
        }
    }

    /// Route one inbound text frame. Unknown channels log and are dropped
    /// (spec §4.5 "Message routing"). Async work is fire-and-forget so the
    /// caller's read loop never stalls.
    async fn handle_text(self: Arc<Self>, text: &str) {
        let envelope: WireEnvelope = match serde_json::from_str(text) {
            Ok(e) => e,
            Err(e) => {
                debug!(error = %e, "coinbase adapter: non-envelope frame ignored");
                return;
            }
        };

        match envelope.channel.as_str() {
            "candles" => {
                for event in envelope.events {
                    for wire_candle in event.candles {
                        if let Err(e) = self.handle_candle(wire_candle).await {
                            error!(error = %e, "coinbase adapter: candle handling failed");
                        }
                    }
                }
            }
            "ticker" => {
                for event in envelope.events {
                    for wire_ticker in event.tickers {
                        if let Err(e) = self.handle_ticker(wire_ticker).await {
                            error!(error = %e, "coinbase adapter: ticker handling failed");
                        }
                    }
                }
            }
            "heartbeats" | "subscriptions" => {}
            other => warn!(channel = other, "coinbase adapter: unknown channel, dropping frame"),
        }
    }

    async fn handle_candle(&self, wire: crate::wire::WireCandle) -> Result<()> {
        let Some(timestamp) = wire.timestamp_ms() else {
            return Ok(());
        };
        let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = (
            wire.parse_f64("open"),
            wire.parse_f64("high"),
            wire.parse_f64("low"),
            wire.parse_f64("close"),
            wire.parse_f64("volume"),
        ) else {
            return Ok(());
        };

        let symbol = wire.product_id.clone();
        let candle = Candle::new(timestamp, symbol.clone(), Timeframe::M5, open, high, low, close, volume);

        let closed = match self.open_candles.get(&symbol) {
            Some(prev) if timestamp > prev.timestamp => Some(*prev),
            _ => None,
        };

        let key = keys::candle_shared(self.exchange_id(), &symbol, Timeframe::M5);
        self.store.add_candle_if_newer(&key, &candle, None).await?;
        self.open_candles.insert(symbol.clone(), candle);

        if let Some(closed_candle) = closed {
            let channel = keys::channel_candle_close(self.exchange_id(), &symbol, Timeframe::M5);
            let payload = serde_json::to_string(&closed_candle)?;
            self.store.publish(&channel, &payload).await?;
            debug!(symbol = %symbol, timestamp = closed_candle.timestamp, "coinbase adapter: candle closed, published");
        }
        Ok(())
    }

    async fn handle_ticker(&self, wire: crate::wire::WireTicker) -> Result<()> {
        let Ok(price) = wire.price.parse::<f64>() else {
            return Ok(());
        };
        let parse_opt = |s: &Option<String>| s.as_deref().and_then(|v| v.parse::<f64>().ok()).unwrap_or(0.0);

        let ticker = Ticker {
            price,
            change_24h: 0.0,
            change_percent_24h: parse_opt(&wire.change_percent_24h),
            volume_24h: parse_opt(&wire.volume_24h),
            low_24h: parse_opt(&wire.low_24h),
            high_24h: parse_opt(&wire.high_24h),
            timestamp: chrono::Utc::now().timestamp_millis(),
        };

        self.store.write_ticker(self.exchange_id(), &wire.product_id, &ticker).await?;
        let channel = keys::channel_ticker(self.exchange_id(), &wire.product_id);
        let payload = serde_json::to_string(&ticker)?;
        self.store.publish(&channel, &payload).await?;
        Ok(())
    }
}

#[async_trait]
impl Adapter for CoinbaseAdapter {
    async fn connect(&self) -> Result<()> {
        self.intentional_close.store(false, Ordering::SeqCst);
        // `self` isn't `Arc`-wrapped at the trait boundary, so the caller is
        // expected to hold this adapter behind an `Arc` (see
        // `src/bin/coinbase_adapter.rs`) and spawn the connection loop from
        // there. This method only flips the intentional-close guard; the
        // supervisor binary drives `run_connection_loop` directly.
        Ok(())
    }

    async fn subscribe(&self, symbols: &[String], timeframe: Timeframe) -> Result<()> {
        self.registry.record(symbols, timeframe);
        self.send_subscribe_frames(symbols, timeframe).await;
        Ok(())
    }

    async fn unsubscribe(&self, symbols: &[String]) -> Result<()> {
        self.registry.remove(symbols);
        let frame = SubscribeFrame {
            action: "unsubscribe",
            channel: "candles",
            product_ids: symbols,
        };
        self.send_frame(&frame).await;
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        self.intentional_close.store(true, Ordering::SeqCst);
        let sender = self.outbound.write().take();
        drop(sender); // dropping the sender closes the writer task's channel
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

impl CoinbaseAdapter {
    /// Spawn the background connection/reconnect loop. Kept separate from
    /// `Adapter::connect` because the loop needs to own an `Arc<Self>`.
    pub fn spawn(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run_connection_loop())
    }
}
