//! Command execution seam (mirrors `alert_engine::notify::NotificationSink`).
//! The control channel owns scheduling and the ack/response protocol; the
//! actual pause/resume/backfill/etc. effects belong to the service registry
//! a supervisor process holds, so this trait is the boundary between them.

use async_trait::async_trait;
use tracing::info;

use crate::command::Command;

#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Executes one command's effect. `Ok(data)` becomes the `success`
    /// response payload; `Err` becomes an `error` response message.
    async fn execute(&self, command: &Command) -> anyhow::Result<Option<serde_json::Value>>;
}

/// Default handler: logs and acknowledges success with no data. Real
/// deployments wire this to the supervisor's service registry.
pub struct LoggingHandler;

#[async_trait]
impl CommandHandler for LoggingHandler {
    async fn execute(&self, command: &Command) -> anyhow::Result<Option<serde_json::Value>> {
        info!(correlation_id = %command.correlation_id, command_type = ?command.command_type, "executing command");
        Ok(None)
    }
}
