//! Integration coverage for spec §8 scenario S5 (command priority) and
//! property 6 (ack precedes exactly one terminal response).

use async_trait::async_trait;
use livermore_control_channel::{CommandHandler, ControlChannel, Response, ResponseSink, ResponseStatus};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

#[derive(Default, Clone)]
struct CapturingSink {
    responses: Arc<Mutex<Vec<Response>>>,
}

#[async_trait]
impl ResponseSink for CapturingSink {
    async fn send(&self, _identity_sub: &str, response: &Response) -> anyhow::Result<()> {
        self.responses.lock().push(response.clone());
        Ok(())
    }
}

struct NoopHandler;

#[async_trait]
impl CommandHandler for NoopHandler {
    async fn execute(&self, _command: &livermore_control_channel::Command) -> anyhow::Result<Option<serde_json::Value>> {
        Ok(None)
    }
}

#[tokio::test]
async fn s5_pause_processed_before_queued_force_backfill() {
    let channel = Arc::new(ControlChannel::new("user-1", NoopHandler));
    let sink = CapturingSink::default();

    let backfill = serde_json::json!({
        "correlationId": "backfill-1",
        "type": "force-backfill",
        "payload": {},
        "timestamp": 0,
    })
    .to_string();
    let pause = serde_json::json!({
        "correlationId": "pause-1",
        "type": "pause",
        "payload": {},
        "timestamp": 0,
    })
    .to_string();

    channel.ingest(&backfill, 0, &sink).await;
    channel.ingest(&pause, 0, &sink).await;

    let consumer_channel = channel.clone();
    let consumer_sink = sink.clone();
    let consumer = tokio::spawn(async move {
        consumer_channel.run_consumer(&consumer_sink).await;
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    consumer.abort();

    let responses = sink.responses.lock();
    // Two acks (insertion order), then two terminal responses (priority order).
    assert_eq!(responses.len(), 4);
    assert_eq!(responses[0].status, ResponseStatus::Ack);
    assert_eq!(responses[0].correlation_id, "backfill-1");
    assert_eq!(responses[1].status, ResponseStatus::Ack);
    assert_eq!(responses[1].correlation_id, "pause-1");
    assert_eq!(responses[2].status, ResponseStatus::Success);
    assert_eq!(responses[2].correlation_id, "pause-1", "pause has lower priority, processed first");
    assert_eq!(responses[3].status, ResponseStatus::Success);
    assert_eq!(responses[3].correlation_id, "backfill-1");
}
