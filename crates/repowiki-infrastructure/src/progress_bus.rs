//! Redis-backed [`ProgressBus`] — pub/sub on `task_progress:<task_id>`.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures_util::StreamExt;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use repowiki_domain::error::{Error, Result};
use repowiki_domain::events::ProgressEvent;
use repowiki_domain::ports::progress_bus::topic_for;
use repowiki_domain::ports::ProgressBus;
use repowiki_domain::value_objects::JobId;

pub struct RedisProgressBus {
    conn: ConnectionManager,
    client: redis::Client,
}

impl RedisProgressBus {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| Error::internal(format!("invalid redis URL: {e}")))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| Error::internal(format!("failed to connect to redis: {e}")))?;
        Ok(Self { conn, client })
    }
}

#[async_trait]
impl ProgressBus for RedisProgressBus {
    async fn publish(&self, event: ProgressEvent) -> Result<()> {
        let payload = serde_json::to_string(&event)?;
        let mut conn = self.conn.clone();
        conn.publish::<_, _, ()>(topic_for(&event.task_id), payload)
            .await
            .map_err(|e| Error::internal(format!("failed to publish progress event: {e}")))?;
        Ok(())
    }

    async fn subscribe(&self, task_id: &JobId) -> Result<BoxStream<'static, ProgressEvent>> {
        let channel = topic_for(task_id);
        let conn = self
            .client
            .get_async_connection()
            .await
            .map_err(|e| Error::internal(format!("failed to open pubsub connection: {e}")))?;
        let mut pubsub = conn.into_pubsub();
        pubsub
            .subscribe(&channel)
            .await
            .map_err(|e| Error::internal(format!("failed to subscribe to {channel}: {e}")))?;

        let stream = pubsub.into_on_message().filter_map(|msg| async move {
            let payload: String = msg.get_payload().ok()?;
            serde_json::from_str::<ProgressEvent>(&payload).ok()
        });
        Ok(Box::pin(stream))
    }
}
