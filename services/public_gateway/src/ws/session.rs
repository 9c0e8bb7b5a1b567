//! Per-connection subscription set and outbound backpressure accounting
//! (spec §4.9). Backpressure is tracked against the writer task's queued-
//! byte counter, never the raw socket send buffer — the counter here is the
//! single source of truth both the relay loop and the writer task share.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::channel::{ChannelKind, ExternalChannel};
use livermore_types::Timeframe;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackpressureDecision {
    Send,
    Skip,
    Terminate,
}

pub struct SessionState {
    pub api_key: String,
    subscriptions: Mutex<Vec<ExternalChannel>>,
    queued_bytes: Arc<AtomicUsize>,
    awaiting_pong: AtomicBool,
}

impl SessionState {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            subscriptions: Mutex::new(Vec::new()),
            queued_bytes: Arc::new(AtomicUsize::new(0)),
            awaiting_pong: AtomicBool::new(false),
        }
    }

    pub fn queued_bytes_handle(&self) -> Arc<AtomicUsize> {
        self.queued_bytes.clone()
    }

    pub fn subscribe(&self, channel: ExternalChannel) {
        let mut subs = self.subscriptions.lock();
        if !subs.iter().any(|c| c.raw == channel.raw) {
            subs.push(channel);
        }
    }

    pub fn unsubscribe(&self, raw: &str) {
        self.subscriptions.lock().retain(|c| c.raw != raw);
    }

    pub fn channels(&self) -> Vec<String> {
        self.subscriptions.lock().iter().map(|c| c.raw.clone()).collect()
    }

    pub fn matches(&self, kind: ChannelKind, symbol: &str, tf: Timeframe) -> bool {
        self.subscriptions.lock().iter().any(|c| c.matches(kind, symbol, tf))
    }

    pub fn mark_pong_received(&self) {
        self.awaiting_pong.store(false, Ordering::Relaxed);
    }

    pub fn mark_ping_sent(&self) {
        self.awaiting_pong.store(true, Ordering::Relaxed);
    }

    /// True if the previous heartbeat ping was never answered (spec §4.9
    /// "terminate on a missed heartbeat").
    pub fn pong_overdue(&self) -> bool {
        self.awaiting_pong.load(Ordering::Relaxed)
    }

    /// Decide whether `len` more bytes may be queued for send, given the
    /// configured skip/terminate thresholds (spec §4.9/§9: 64KB skip, 256KB
    /// terminate).
    pub fn backpressure_decision(&self, len: usize, skip_at: usize, terminate_at: usize) -> BackpressureDecision {
        let projected = self.queued_bytes.load(Ordering::Relaxed) + len;
        if projected > terminate_at {
            BackpressureDecision::Terminate
        } else if projected > skip_at {
            BackpressureDecision::Skip
        } else {
            BackpressureDecision::Send
        }
    }

    pub fn account_enqueued(&self, len: usize) {
        self.queued_bytes.fetch_add(len, Ordering::Relaxed);
    }
}
