//! `ResponseSink` implementation over the shared cache/pub-sub store.

use async_trait::async_trait;

use crate::command::Response;
use crate::engine::ResponseSink;

pub struct StoreResponseSink {
    pub store: livermore_cache::Store,
}

#[async_trait]
impl ResponseSink for StoreResponseSink {
    async fn send(&self, identity_sub: &str, response: &Response) -> anyhow::Result<()> {
        let channel = livermore_cache::keys::channel_responses(identity_sub);
        let payload = serde_json::to_string(response)?;
        self.store.publish(&channel, &payload).await?;
        Ok(())
    }
}
