//! Redis-backed [`CancellationRegistry`] — a TTL flag keyed by task id.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use repowiki_domain::constants::CANCEL_FLAG_TTL;
use repowiki_domain::error::{Error, Result};
use repowiki_domain::ports::CancellationRegistry;
use repowiki_domain::value_objects::JobId;

fn key_for(task_id: &JobId) -> String {
    format!("task_cancel:{task_id}")
}

pub struct RedisCancellationRegistry {
    conn: ConnectionManager,
}

impl RedisCancellationRegistry {
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
impl CancellationRegistry for RedisCancellationRegistry {
    async fn set(&self, task_id: &JobId) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key_for(task_id), 1, CANCEL_FLAG_TTL.as_secs())
            .await
            .map_err(|e| Error::internal(format!("failed to set cancel flag: {e}")))?;
        Ok(())
    }

    async fn get(&self, task_id: &JobId) -> Result<bool> {
        let mut conn = self.conn.clone();
        let exists: bool = conn
            .exists(key_for(task_id))
            .await
            .map_err(|e| Error::internal(format!("failed to read cancel flag: {e}")))?;
        Ok(exists)
    }

    async fn clear(&self, task_id: &JobId) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key_for(task_id))
            .await
            .map_err(|e| Error::internal(format!("failed to clear cancel flag: {e}")))?;
        Ok(())
    }
}
