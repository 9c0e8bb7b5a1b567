//! Drives one indicator update through detection, then persists,
//! notifies, and publishes every trigger that fires (spec §4.7 step 4).

use std::time::Instant;

use dashmap::DashMap;
use livermore_types::model::{classify_trigger, AlertDetails, AlertRecord};
use livermore_types::{MacdVValue, Timeframe};
use tracing::{error, warn};

use crate::backend::AlertCache;
use crate::detect::detect;
use crate::notify::NotificationSink;
use crate::state::SeriesState;

pub struct AlertEngine<C: AlertCache> {
    cache: C,
    notifier: Box<dyn NotificationSink>,
    exchange_id: String,
    state: DashMap<(String, Timeframe), SeriesState>,
}

impl<C: AlertCache> AlertEngine<C> {
    pub fn new(cache: C, notifier: Box<dyn NotificationSink>, exchange_id: impl Into<String>) -> Self {
        Self {
            cache,
            notifier,
            exchange_id: exchange_id.into(),
            state: DashMap::new(),
        }
    }

    pub async fn handle_indicator_update(&self, symbol: &str, tf: Timeframe, value: MacdVValue) -> anyhow::Result<()> {
        if !value.macd_v.is_finite() {
            // Precondition unmet (series not yet past the readiness gate): skip silently (spec §7).
            return Ok(());
        }

        let now = Instant::now();
        let triggers = {
            let mut entry = self
                .state
                .entry((symbol.to_string(), tf))
                .or_insert_with(SeriesState::default);
            detect(&mut entry, value.macd_v, value.histogram, now)
        };

        for trigger in triggers {
            let previous_label = {
                let mut entry = self.state.get_mut(&(symbol.to_string(), tf)).expect("entry just inserted above");
                let prev = entry.last_label.clone();
                entry.last_label = Some(trigger.label.as_internal_string());
                prev
            };

            let price = self
                .cache
                .latest_close(&self.exchange_id, symbol, tf)
                .await
                .unwrap_or(None)
                .unwrap_or(0.0);

            let (direction, _strength) = classify_trigger(&trigger.label);
            let record = AlertRecord {
                id: uuid::Uuid::new_v4().to_string(),
                exchange_id: self.exchange_id.clone(),
                symbol: symbol.to_string(),
                timeframe: tf,
                alert_type: "macdv".to_string(),
                triggered_at: chrono::Utc::now().timestamp_millis(),
                price,
                trigger_value: trigger.macd_v,
                trigger_label: trigger.label.as_internal_string(),
                previous_label,
                details: AlertDetails {
                    direction,
                    histogram: trigger.histogram,
                    signal: value.signal,
                    timeframes_snapshot: serde_json::json!({ "symbol": symbol, "timeframe": tf.as_str() }),
                },
                notification_sent: false,
                notification_error: None,
            };

            let mut record = record;
            match self.notifier.notify(&record).await {
                Ok(()) => record.notification_sent = true,
                Err(e) => {
                    warn!(symbol, timeframe = %tf, error = %e, "alert notification failed");
                    record.notification_error = Some(e.to_string());
                }
            }

            if let Err(e) = self.cache.append_alert_record(&self.exchange_id, &record).await {
                error!(symbol, timeframe = %tf, error = %e, "failed to persist alert record");
            }
            if let Err(e) = self.cache.publish_alert(&self.exchange_id, &record).await {
                error!(symbol, timeframe = %tf, error = %e, "failed to publish alert");
            }
        }

        Ok(())
    }
}
