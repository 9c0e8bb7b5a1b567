//! Exponential backoff with a configurable cap, used by every adapter's
//! reconnect loop (spec §4.5 "Reconnection", §5 "capped at a configured
//! ceiling (default 5s)").

use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct BackoffConfig {
    pub initial: Duration,
    pub cap: Duration,
    pub max_attempts: u32,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial: Duration::from_millis(250),
            cap: Duration::from_secs(5),
            max_attempts: 10,
        }
    }
}

/// Stateful backoff counter. `next_delay()` doubles the previous delay
/// (capped) and increments the attempt counter; `reset()` is called once a
/// connection succeeds.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    config: BackoffConfig,
    attempt: u32,
}

impl ExponentialBackoff {
    pub fn new(config: BackoffConfig) -> Self {
        Self { config, attempt: 0 }
    }

    /// `Some(delay)` for the next attempt, or `None` once `max_attempts`
    /// has been exhausted — the caller should then surface a fatal adapter
    /// error to the supervisor (spec §4.5).
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempt >= self.config.max_attempts {
            return None;
        }
        let multiplier = 2u32.saturating_pow(self.attempt);
        let delay = self.config.initial.saturating_mul(multiplier).min(self.config.cap);
        self.attempt += 1;
        Some(delay)
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_double_up_to_cap() {
        let config = BackoffConfig {
            initial: Duration::from_millis(100),
            cap: Duration::from_millis(500),
            max_attempts: 10,
        };
        let mut backoff = ExponentialBackoff::new(config);
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(100)));
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(200)));
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(400)));
        assert_eq!(backoff.next_delay(), Some(Duration::from_millis(500))); // capped
    }

    #[test]
    fn exhausts_after_max_attempts() {
        let config = BackoffConfig {
            initial: Duration::from_millis(10),
            cap: Duration::from_secs(1),
            max_attempts: 2,
        };
        let mut backoff = ExponentialBackoff::new(config);
        assert!(backoff.next_delay().is_some());
        assert!(backoff.next_delay().is_some());
        assert!(backoff.next_delay().is_none());
    }

    #[test]
    fn reset_restarts_sequence() {
        let mut backoff = ExponentialBackoff::new(BackoffConfig::default());
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.attempt(), 0);
    }
}
