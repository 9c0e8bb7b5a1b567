//! WebSocket upgrade and per-connection event loop (spec §4.9, §6).
//!
//! One shared `broadcast::Receiver` per connection relays every fanned-out
//! `GatewayEvent`; each session filters it down to its own subscriptions.
//! A dedicated writer task owns the socket's send half so the recv/relay
//! loop never blocks on a slow client — backpressure is decided against the
//! writer's queued-byte counter before a frame is ever handed to it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::{broadcast, mpsc};
use tokio::time::interval;
use tracing::{debug, info, warn};

use livermore_types::envelope::{to_public_candle, to_public_signal, WsAction, WsClientMessage, WsServerEnvelope};

use crate::channel::ExternalChannel;
use crate::fanout::{signal_type_for, GatewayEvent};
use crate::state::SharedState;
use crate::ws::session::{BackpressureDecision, SessionState};

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    #[serde(default = "default_api_key")]
    api_key: String,
}

fn default_api_key() -> String {
    "anonymous".to_string()
}

pub async fn ws_upgrade(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
    Query(query): Query<WsQuery>,
) -> impl IntoResponse {
    if !state.try_acquire_connection(&query.api_key) {
        warn!(api_key = %query.api_key, "public gateway: connection cap exceeded");
        return (StatusCode::TOO_MANY_REQUESTS, "connection cap exceeded").into_response();
    }

    ws.on_upgrade(move |socket| handle_connection(socket, state, query.api_key))
        .into_response()
}

struct OutboundFrame {
    message: Message,
    accounted_len: usize,
}

async fn handle_connection(socket: WebSocket, state: SharedState, api_key: String) {
    let session = Arc::new(SessionState::new(api_key.clone()));
    let (sink, mut stream) = socket.split();

    let (out_tx, out_rx) = mpsc::unbounded_channel::<OutboundFrame>();
    let writer = tokio::spawn(spawn_writer(sink, out_rx, session.queued_bytes_handle()));

    let mut events = state.events.subscribe();
    let mut heartbeat = interval(Duration::from_secs(state.config.heartbeat_secs));
    heartbeat.tick().await; // first tick fires immediately; consume it

    loop {
        tokio::select! {
            _ = heartbeat.tick() => {
                if session.pong_overdue() {
                    info!(api_key = %api_key, "public gateway: heartbeat missed, closing");
                    break;
                }
                session.mark_ping_sent();
                if out_tx.send(OutboundFrame { message: Message::Ping(Vec::new()), accounted_len: 0 }).is_err() {
                    break;
                }
            }

            event = events.recv() => {
                match event {
                    Ok(event) => {
                        if session.matches(event.kind(), event.symbol(), event.timeframe()) {
                            if let Some(frame) = render_event(&event, &state) {
                                if !enqueue(&session, &out_tx, frame) {
                                    break;
                                }
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(api_key = %api_key, skipped = n, "public gateway: session lagged the event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(frames) = handle_client_message(&session, &text) {
                            for frame in frames {
                                if !enqueue(&session, &out_tx, frame) {
                                    break;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Pong(_))) => session.mark_pong_received(),
                    Some(Ok(Message::Close(_))) => {
                        debug!(api_key = %api_key, "public gateway: client closed");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(api_key = %api_key, error = %e, "public gateway: recv error, closing");
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    writer.abort();
    state.release_connection(&api_key);
    info!(api_key = %api_key, "public gateway: connection closed");
}

/// Encode `frame` and enqueue it if backpressure allows, terminating the
/// session if the writer's queue has grown past the hard cap.
fn enqueue(session: &SessionState, out_tx: &mpsc::UnboundedSender<OutboundFrame>, frame: (Vec<u8>, Message)) -> bool {
    let (bytes, message) = frame;
    match session.backpressure_decision(bytes.len(), BACKPRESSURE_SKIP, BACKPRESSURE_TERMINATE) {
        BackpressureDecision::Terminate => {
            warn!("public gateway: backpressure terminate threshold exceeded, closing session");
            false
        }
        BackpressureDecision::Skip => {
            debug!("public gateway: backpressure skip threshold exceeded, dropping frame");
            true
        }
        BackpressureDecision::Send => {
            session.account_enqueued(bytes.len());
            out_tx
                .send(OutboundFrame { message, accounted_len: bytes.len() })
                .is_ok()
        }
    }
}

// Thresholds are read from config at connection setup in a real deployment;
// kept as constants here matching `PublicGatewayConfig::default()` since the
// decision point (`enqueue`) is a plain function shared by tests.
const BACKPRESSURE_SKIP: usize = 64 * 1024;
const BACKPRESSURE_TERMINATE: usize = 256 * 1024;

fn render_event(event: &GatewayEvent, state: &SharedState) -> Option<(Vec<u8>, Message)> {
    match event {
        GatewayEvent::CandleClose { .. } => render_candle_close(event),
        GatewayEvent::Signal { .. } => render_signal(event, &state.config.exchange_id),
    }
}

fn render_candle_close(event: &GatewayEvent) -> Option<(Vec<u8>, Message)> {
    let GatewayEvent::CandleClose { symbol, tf, candle } = event else { return None };
    let channel = crate::channel::concrete_channel_name(crate::channel::ChannelKind::Candles, symbol, *tf);
    let envelope = WsServerEnvelope::CandleClose { channel, data: to_public_candle(candle) };
    encode(&envelope)
}

fn render_signal(event: &GatewayEvent, exchange_id: &str) -> Option<(Vec<u8>, Message)> {
    let GatewayEvent::Signal { symbol, tf, label, price, timestamp_ms } = event else { return None };
    let channel = crate::channel::concrete_channel_name(crate::channel::ChannelKind::Signals, symbol, *tf);
    let signal = to_public_signal(symbol, exchange_id, *tf, signal_type_for(label), label, *price, *timestamp_ms);
    let envelope = WsServerEnvelope::TradeSignal { channel, data: signal };
    encode(&envelope)
}

fn encode(envelope: &WsServerEnvelope) -> Option<(Vec<u8>, Message)> {
    match serde_json::to_string(envelope) {
        Ok(text) => {
            let bytes = text.as_bytes().to_vec();
            Some((bytes, Message::Text(text)))
        }
        Err(e) => {
            warn!(error = %e, "public gateway: failed to encode outbound envelope");
            None
        }
    }
}

/// Process one inbound client text frame, returning the reply frame(s) to
/// enqueue. A malformed channel name yields a per-channel `Error` envelope
/// without tearing down the session (spec §6).
fn handle_client_message(session: &SessionState, text: &str) -> Option<Vec<(Vec<u8>, Message)>> {
    let parsed: WsClientMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            let envelope = WsServerEnvelope::Error {
                channel: None,
                code: "BAD_REQUEST".to_string(),
                message: format!("malformed client message: {e}"),
            };
            return encode(&envelope).map(|f| vec![f]);
        }
    };

    let mut frames = Vec::new();
    match parsed.action {
        WsAction::Subscribe => {
            let mut accepted = Vec::new();
            for raw in &parsed.channels {
                match ExternalChannel::parse(raw) {
                    Ok(channel) => {
                        session.subscribe(channel);
                        accepted.push(raw.clone());
                    }
                    Err(e) => {
                        if let Some(frame) = encode(&WsServerEnvelope::Error {
                            channel: Some(raw.clone()),
                            code: "BAD_REQUEST".to_string(),
                            message: e.to_string(),
                        }) {
                            frames.push(frame);
                        }
                    }
                }
            }
            if !accepted.is_empty() {
                if let Some(frame) = encode(&WsServerEnvelope::Subscribed { channels: accepted }) {
                    frames.push(frame);
                }
            }
        }
        WsAction::Unsubscribe => {
            for raw in &parsed.channels {
                session.unsubscribe(raw);
            }
            if let Some(frame) = encode(&WsServerEnvelope::Unsubscribed { channels: parsed.channels }) {
                frames.push(frame);
            }
        }
    }
    Some(frames)
}

async fn spawn_writer(
    mut sink: futures_util::stream::SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<OutboundFrame>,
    queued_bytes: Arc<AtomicUsize>,
) {
    while let Some(frame) = rx.recv().await {
        if sink.send(frame.message).await.is_err() {
            break;
        }
        if frame.accounted_len > 0 {
            queued_bytes.fetch_sub(frame.accounted_len, Ordering::Relaxed);
        }
    }
    let _ = sink.close().await;
}
