//! Pure level-crossing and reversal-signal detection (spec §4.7 steps 1-3).
//! No cache or I/O — kept testable against plain state values.

use std::time::Instant;

use livermore_types::model::TriggerLabel;

use crate::state::{SeriesState, Trigger, OVERSOLD_LEVELS};

/// Runs one `macdV` observation through the level-crossing and reversal
/// rules, mutating `state` and returning every trigger fired this tick
/// (spec §4.7: a single tick can fire at most one level crossing *and* a
/// reversal is mutually exclusive with a fresh level cross in practice, but
/// §4.7 doesn't rule out both in principle, so this returns a Vec).
pub fn detect(state: &mut SeriesState, cur: f64, histogram: f64, now: Instant) -> Vec<Trigger> {
    let mut triggers = Vec::new();

    let Some(prev) = state.previous_macd_v else {
        // First update for this series: seed and skip (spec §4.7 step 1).
        state.previous_macd_v = Some(cur);
        return triggers;
    };
    state.previous_macd_v = Some(cur);

    let mut crossed_level = false;

    // Oversold: prev >= L && cur < L, strictly crossing downward.
    for level in OVERSOLD_LEVELS {
        if prev >= level as f64 && cur < level as f64 && !state.is_level_on_cooldown(level, now) {
            state.arm_level(level, now);
            state.clear_reversal_on_level_cross();
            crossed_level = true;
            triggers.push(Trigger { label: TriggerLabel::Level(level), macd_v: cur, histogram });
        }
    }

    // Overbought: mirror positive levels, crossing upward.
    for level in OVERSOLD_LEVELS.map(|l| -l) {
        if prev <= level as f64 && cur > level as f64 && !state.is_level_on_cooldown(level, now) {
            state.arm_level(level, now);
            state.clear_reversal_on_level_cross();
            crossed_level = true;
            triggers.push(Trigger { label: TriggerLabel::Level(level), macd_v: cur, histogram });
        }
    }

    if crossed_level {
        return triggers;
    }

    if !state.reversal_state && !state.is_reversal_on_cooldown(now) {
        if cur < -150.0 {
            let buffer = cur.abs() * 0.05;
            if histogram > buffer {
                state.arm_reversal(now);
                triggers.push(Trigger { label: TriggerLabel::ReversalOversold, macd_v: cur, histogram });
            }
        } else if cur > 150.0 {
            let buffer = cur.abs() * 0.03;
            if histogram < -buffer {
                state.arm_reversal(now);
                triggers.push(Trigger { label: TriggerLabel::ReversalOverbought, macd_v: cur, histogram });
            }
        }
    }

    triggers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_update_seeds_without_triggering() {
        let mut state = SeriesState::default();
        let triggers = detect(&mut state, -140.0, -2.0, Instant::now());
        assert!(triggers.is_empty());
        assert_eq!(state.previous_macd_v, Some(-140.0));
    }

    #[test]
    fn s3_level_crossing_emits_level_minus_150() {
        // Scenario S3 from spec.md §8.
        let mut state = SeriesState { previous_macd_v: Some(-140.0), ..Default::default() };
        let triggers = detect(&mut state, -160.0, -5.0, Instant::now());
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].label, TriggerLabel::Level(-150));
    }

    #[test]
    fn repeat_crossing_within_cooldown_is_suppressed() {
        let now = Instant::now();
        let mut state = SeriesState { previous_macd_v: Some(-140.0), ..Default::default() };
        let first = detect(&mut state, -160.0, -5.0, now);
        assert_eq!(first.len(), 1);

        // Crosses back above then below -150 again, still inside cooldown.
        state.previous_macd_v = Some(-140.0);
        let second = detect(&mut state, -160.0, -5.0, now);
        assert!(second.is_empty());
    }

    #[test]
    fn crossing_again_after_cooldown_fires() {
        let mut state = SeriesState::default();
        let t0 = Instant::now();
        state.previous_macd_v = Some(-140.0);
        let first = detect(&mut state, -160.0, -5.0, t0);
        assert_eq!(first.len(), 1);

        state.previous_macd_v = Some(-140.0);
        let later = t0 + crate::state::COOLDOWN + std::time::Duration::from_secs(1);
        let second = detect(&mut state, -160.0, -5.0, later);
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn s4_reversal_oversold_then_suppressed() {
        // Scenario S4 from spec.md §8.
        let mut state = SeriesState { previous_macd_v: Some(-185.0), ..Default::default() };
        let now = Instant::now();
        let triggers = detect(&mut state, -180.0, 10.0, now);
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].label, TriggerLabel::ReversalOversold);
        assert!(state.reversal_state);

        state.previous_macd_v = Some(-180.0);
        let second = detect(&mut state, -178.0, 12.0, now);
        assert!(second.is_empty());
    }

    #[test]
    fn reversal_overbought_uses_tighter_buffer() {
        let mut state = SeriesState { previous_macd_v: Some(175.0), ..Default::default() };
        let triggers = detect(&mut state, 170.0, -6.0, Instant::now());
        // buffer = 170*0.03 = 5.1, histogram=-6 < -5.1 -> fires
        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].label, TriggerLabel::ReversalOverbought);
    }

    #[test]
    fn level_cross_rearms_reversal_state() {
        let mut state = SeriesState { previous_macd_v: Some(-185.0), ..Default::default() };
        let now = Instant::now();
        detect(&mut state, -180.0, 10.0, now);
        assert!(state.reversal_state);

        // A fresh downward crossing of -200 re-arms the series.
        state.previous_macd_v = Some(-190.0);
        detect(&mut state, -210.0, -1.0, now);
        assert!(!state.reversal_state);
    }
}
