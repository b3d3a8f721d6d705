//! Redis-backed [`JobQueue`] — a list-based work queue (`LPUSH`/`BRPOP`).

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use repowiki_domain::error::{Error, Result};
use repowiki_domain::ports::JobQueue;
use repowiki_domain::value_objects::JobId;

const QUEUE_KEY: &str = "repowiki:task_queue";
const DEQUEUE_POLL_SECONDS: f64 = 5.0;

pub struct RedisJobQueue {
    conn: ConnectionManager,
}

impl RedisJobQueue {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| Error::internal(format!("invalid redis URL: {e}")))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| Error::internal(format!("failed to connect to redis: {e}")))?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn enqueue(&self, task_id: JobId) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.lpush::<_, _, ()>(QUEUE_KEY, task_id.to_string())
            .await
            .map_err(|e| Error::internal(format!("failed to enqueue task: {e}")))?;
        Ok(())
    }

    async fn dequeue(&self) -> Result<Option<JobId>> {
        let mut conn = self.conn.clone();
        let result: Option<(String, String)> = conn
            .brpop(QUEUE_KEY, DEQUEUE_POLL_SECONDS)
            .await
            .map_err(|e| Error::internal(format!("failed to dequeue task: {e}")))?;
        Ok(result.map(|(_, id)| JobId::from_string(&id)))
    }

    async fn revoke(&self, task_id: JobId) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.lrem::<_, _, ()>(QUEUE_KEY, 0, task_id.to_string())
            .await
            .map_err(|e| Error::internal(format!("failed to revoke task: {e}")))?;
        Ok(())
    }
}
