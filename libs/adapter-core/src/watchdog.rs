//! Silence watchdog: force-reconnect if no message is observed within the
//! window (spec §4.5, §5 — 30s default).

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Watchdog {
    window: Duration,
    last_seen: Instant,
}

impl Watchdog {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_seen: Instant::now(),
        }
    }

    pub fn default_window() -> Duration {
        Duration::from_secs(30)
    }

    /// Record that a frame was just observed.
    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    pub fn is_expired(&self) -> bool {
        self.last_seen.elapsed() >= self.window
    }

    pub fn remaining(&self) -> Duration {
        self.window.saturating_sub(self.last_seen.elapsed())
    }
}
