//! Validate → ack → enqueue → execute → terminal-response pipeline
//! (spec §4.8 execution rules 1-4).

use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::command::{Command, Response};
use crate::handler::CommandHandler;
use crate::queue::PriorityQueue;

/// Commands older than this are rejected without an `ack` (spec §4.8 rule 1,
/// §5 "30 s command-age bound").
pub const MAX_COMMAND_AGE_MS: i64 = 30_000;

#[async_trait::async_trait]
pub trait ResponseSink: Send + Sync {
    async fn send(&self, identity_sub: &str, response: &Response) -> anyhow::Result<()>;
}

/// Schema-validates and age-checks one inbound payload, acks it, enqueues
/// it, and lets a single consumer task (`run_consumer`) drain the queue one
/// command at a time.
pub struct ControlChannel<H: CommandHandler> {
    identity_sub: String,
    handler: H,
    queue: Arc<Mutex<PriorityQueue>>,
    work: tokio::sync::Notify,
}

impl<H: CommandHandler> ControlChannel<H> {
    pub fn new(identity_sub: impl Into<String>, handler: H) -> Self {
        Self {
            identity_sub: identity_sub.into(),
            handler,
            queue: Arc::new(Mutex::new(PriorityQueue::new())),
            work: tokio::sync::Notify::new(),
        }
    }

    /// Handles one raw inbound payload: parse, validate, age-check, ack,
    /// enqueue. Malformed JSON and unknown command types are logged and
    /// dropped without a response — they carry no trustworthy correlation
    /// id (spec §4.8 "malformed commands have no correlation id to respond
    /// to").
    pub async fn ingest(&self, raw: &str, now_ms: i64, responses: &dyn ResponseSink) {
        let command: Command = match serde_json::from_str(raw) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "control channel: dropping malformed command payload");
                return;
            }
        };

        if !command.is_well_formed() {
            warn!(correlation_id = %command.correlation_id, "control channel: dropping command with blank correlationId");
            return;
        }

        if now_ms - command.timestamp > MAX_COMMAND_AGE_MS {
            let response = Response::error(&command.correlation_id, "Command expired", now_ms);
            if let Err(e) = responses.send(&self.identity_sub, &response).await {
                warn!(error = %e, "control channel: failed to publish expiry error response");
            }
            return;
        }

        let ack = Response::ack(&command.correlation_id, now_ms);
        if let Err(e) = responses.send(&self.identity_sub, &ack).await {
            warn!(error = %e, "control channel: failed to publish ack");
        }

        self.queue.lock().expect("queue mutex poisoned").push(command);
        self.work.notify_one();
    }

    /// Single consumer loop: pop highest priority, execute, publish the
    /// terminal response, repeat. Runs until cancelled.
    pub async fn run_consumer(&self, responses: &dyn ResponseSink) {
        loop {
            let next = self.queue.lock().expect("queue mutex poisoned").pop();
            let Some(command) = next else {
                self.work.notified().await;
                continue;
            };

            let now_ms = chrono::Utc::now().timestamp_millis();
            let response = match self.handler.execute(&command).await {
                Ok(data) => {
                    info!(correlation_id = %command.correlation_id, "control channel: command succeeded");
                    Response::success(&command.correlation_id, data, now_ms)
                }
                Err(e) => {
                    warn!(correlation_id = %command.correlation_id, error = %e, "control channel: command failed");
                    Response::error(&command.correlation_id, e.to_string(), now_ms)
                }
            };

            if let Err(e) = responses.send(&self.identity_sub, &response).await {
                warn!(error = %e, "control channel: failed to publish terminal response");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::LoggingHandler;
    use parking_lot::Mutex as PLMutex;
    use std::sync::Arc;

    #[derive(Default, Clone)]
    struct CapturingSink {
        responses: Arc<PLMutex<Vec<Response>>>,
    }

    #[async_trait::async_trait]
    impl ResponseSink for CapturingSink {
        async fn send(&self, _identity_sub: &str, response: &Response) -> anyhow::Result<()> {
            self.responses.lock().push(response.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn property_6_expired_command_yields_only_error() {
        let channel = ControlChannel::new("user-1", LoggingHandler);
        let sink = CapturingSink::default();
        let raw = serde_json::json!({
            "correlationId": "c1",
            "type": "pause",
            "payload": {},
            "timestamp": 0,
        })
        .to_string();

        channel.ingest(&raw, MAX_COMMAND_AGE_MS + 1_000, &sink).await;

        let responses = sink.responses.lock();
        assert_eq!(responses.len(), 1);
        assert_eq!(responses[0].status, crate::command::ResponseStatus::Error);
    }

    #[tokio::test]
    async fn property_6_accepted_command_acks_then_terminal() {
        let channel = Arc::new(ControlChannel::new("user-1", LoggingHandler));
        let sink = CapturingSink::default();
        let raw = serde_json::json!({
            "correlationId": "c2",
            "type": "pause",
            "payload": {},
            "timestamp": 0,
        })
        .to_string();

        channel.ingest(&raw, 0, &sink).await;

        let consumer_channel = channel.clone();
        let consumer_sink = sink.clone();
        let consumer = tokio::spawn(async move {
            consumer_channel.run_consumer(&consumer_sink).await;
        });

        // Give the consumer a moment to drain the single queued command.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        consumer.abort();

        let responses = sink.responses.lock();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].status, crate::command::ResponseStatus::Ack);
        assert_eq!(responses[1].status, crate::command::ResponseStatus::Success);
        assert_eq!(responses[0].correlation_id, "c2");
        assert_eq!(responses[1].correlation_id, "c2");
    }
}
