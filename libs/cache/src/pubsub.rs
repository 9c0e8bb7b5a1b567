//! Pattern subscribe over a dedicated subscriber connection (spec §4.4).
//!
//! `Subscriber` never shares the command connection used by `Store` — it
//! opens its own connection via `get_async_pubsub()`, the `redis` crate's
//! equivalent of `duplicate()`. Delivered messages are pushed onto a bounded
//! channel and handled by a caller-supplied closure on a spawned task, so a
//! slow or erroring handler never blocks message intake (spec §4.4
//! "`pmessage` handlers do not block").

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::error::Result;

/// A single pattern-matched delivery.
#[derive(Debug, Clone)]
pub struct PatternMessage {
    pub pattern: String,
    pub channel: String,
    pub payload: String,
}

type Handler = Arc<dyn Fn(PatternMessage) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Owns a dedicated `PubSub` connection and dispatches deliveries to a
/// handler on a background task.
pub struct Subscriber {
    redis_url: String,
    patterns: Vec<String>,
    intake: Option<JoinHandle<()>>,
    dispatch: Option<JoinHandle<()>>,
    control: Option<mpsc::UnboundedSender<ControlMsg>>,
}

enum ControlMsg {
    Stop,
}

impl Subscriber {
    pub fn new(redis_url: impl Into<String>, patterns: Vec<String>) -> Self {
        Self {
            redis_url: redis_url.into(),
            patterns,
            intake: None,
            dispatch: None,
            control: None,
        }
    }

    /// Connect, `PSUBSCRIBE` every configured pattern, then spawn the
    /// intake loop. `handler` is invoked per delivery on a worker task
    /// (spec §4.4: heavy work dispatched off the intake loop).
    pub async fn start<F, Fut>(&mut self, handler: F) -> Result<()>
    where
        F: Fn(PatternMessage) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let client = redis::Client::open(self.redis_url.as_str())?;
        let mut pubsub = client.get_async_pubsub().await?;
        for pattern in &self.patterns {
            pubsub.psubscribe(pattern).await?;
            info!(pattern, "psubscribed");
        }

        let handler: Handler = Arc::new(move |msg| Box::pin(handler(msg)));
        let (tx, mut rx) = mpsc::channel::<PatternMessage>(1024);
        let (control_tx, mut control_rx) = mpsc::unbounded_channel::<ControlMsg>();
        self.control = Some(control_tx);

        let intake = tokio::spawn(async move {
            let mut stream = pubsub.on_message();
            loop {
                tokio::select! {
                    biased;
                    _ = control_rx.recv() => {
                        break;
                    }
                    maybe_msg = stream.next() => {
                        let Some(msg) = maybe_msg else { break };
                        let pattern: String = msg.get_pattern().unwrap_or_default();
                        let channel: String = msg.get_channel_name().to_string();
                        let payload: String = match msg.get_payload() {
                            Ok(p) => p,
                            Err(e) => {
                                error!(error = %e, "pubsub: failed to decode payload");
                                continue;
                            }
                        };
                        if tx
                            .send(PatternMessage { pattern, channel, payload })
                            .await
                            .is_err()
                        {
                            break;
                        }
                    }
                }
            }
        });

        let dispatch = tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                let handler = handler.clone();
                tokio::spawn(async move {
                    handler(msg).await;
                });
            }
        });

        self.intake = Some(intake);
        self.dispatch = Some(dispatch);
        Ok(())
    }

    /// `PUNSUBSCRIBE` then `QUIT` (spec §4.4 `stop()`).
    pub async fn stop(&mut self) {
        if let Some(control) = self.control.take() {
            let _ = control.send(ControlMsg::Stop);
        }
        if let Some(handle) = self.intake.take() {
            handle.abort();
        }
        if let Some(handle) = self.dispatch.take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscriber_construction_records_patterns() {
        let sub = Subscriber::new("redis://127.0.0.1/", vec!["channel:exchange:1:candle:close:*:*".into()]);
        assert_eq!(sub.patterns.len(), 1);
    }
}
