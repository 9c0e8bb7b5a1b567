//! Per-`(symbol, timeframe)` alert state (spec §4.7).

use std::time::{Duration, Instant};

use livermore_types::model::TriggerLabel;

/// Oversold candidate levels, most shallow first. Overbought levels are the
/// positive mirror.
pub const OVERSOLD_LEVELS: [i32; 6] = [-150, -200, -250, -300, -350, -400];

/// Default cooldown between alerts sharing a `(symbol, tf, transition)` key
/// (spec §4.7 "Default 5 minutes per cooldown key").
pub const COOLDOWN: Duration = Duration::from_secs(5 * 60);

/// `previousMacdV`, per-level cooldown timestamps, and reversal-zone state
/// for one `(symbol, timeframe)` series. Process-local, single-owner (spec
/// §5 "process-local and single-owner").
#[derive(Debug, Default)]
pub struct SeriesState {
    pub previous_macd_v: Option<f64>,
    alerted_levels: std::collections::HashMap<i32, Instant>,
    pub reversal_state: bool,
    reversal_cooldown: Option<Instant>,
    /// Internal label of the last trigger fired for this series, carried
    /// into the next `AlertRecord.previousLabel` (spec §3).
    pub last_label: Option<String>,
}

impl SeriesState {
    pub fn is_level_on_cooldown(&self, level: i32, now: Instant) -> bool {
        self.alerted_levels
            .get(&level)
            .is_some_and(|last| now.duration_since(*last) < COOLDOWN)
    }

    pub fn arm_level(&mut self, level: i32, now: Instant) {
        self.alerted_levels.insert(level, now);
    }

    pub fn is_reversal_on_cooldown(&self, now: Instant) -> bool {
        self.reversal_cooldown
            .is_some_and(|last| now.duration_since(last) < COOLDOWN)
    }

    pub fn arm_reversal(&mut self, now: Instant) {
        self.reversal_state = true;
        self.reversal_cooldown = Some(now);
    }

    /// A level crossing re-arms the series: clears the reversal flag so a
    /// fresh excursion can trigger its own reversal later (spec glossary
    /// "Reversal state").
    pub fn clear_reversal_on_level_cross(&mut self) {
        self.reversal_state = false;
    }
}

/// One detected transition, ready for notification/persistence/publish.
#[derive(Debug, Clone, PartialEq)]
pub struct Trigger {
    pub label: TriggerLabel,
    pub macd_v: f64,
    pub histogram: f64,
}
