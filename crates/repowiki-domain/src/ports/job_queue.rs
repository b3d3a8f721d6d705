//! The Job Queue port — hands durable task envelopes to worker processes.

use async_trait::async_trait;

use crate::error::Result;
use crate::value_objects::JobId;

#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Enqueue a task for pickup by any worker.
    async fn enqueue(&self, task_id: JobId) -> Result<()>;

    /// Block (up to the implementation's poll interval) for the next task
    /// id, returning `None` on a clean shutdown signal.
    async fn dequeue(&self) -> Result<Option<JobId>>;

    /// Best-effort removal of a not-yet-dequeued task (used when a
    /// submission is superseded before any worker picked it up).
    async fn revoke(&self, task_id: JobId) -> Result<()>;
}
