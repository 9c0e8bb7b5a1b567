//! Notification dispatch seam (spec §4.7 step 4, spec.md §1 "Discord
//! webhook, specified as an external collaborator").

use async_trait::async_trait;
use livermore_types::model::AlertRecord;
use tracing::info;

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, record: &AlertRecord) -> anyhow::Result<()>;
}

/// Default sink: logs the alert. Real deployments plug in a Discord webhook
/// client behind the same trait; that client is an external collaborator
/// this workspace does not implement.
pub struct LoggingSink;

#[async_trait]
impl NotificationSink for LoggingSink {
    async fn notify(&self, record: &AlertRecord) -> anyhow::Result<()> {
        info!(
            symbol = %record.symbol,
            timeframe = %record.timeframe,
            trigger = %record.trigger_label,
            "alert notification"
        );
        Ok(())
    }
}
