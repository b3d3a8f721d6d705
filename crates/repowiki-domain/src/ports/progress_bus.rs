//! The Progress Bus port — a publish/subscribe channel carrying job-state
//! events keyed by task id.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::Result;
use crate::events::ProgressEvent;
use crate::value_objects::JobId;

/// Topic naming helper for `task_progress:<task_id>` channels.
#[must_use]
pub fn topic_for(task_id: &JobId) -> String {
    format!("task_progress:{task_id}")
}

#[async_trait]
pub trait ProgressBus: Send + Sync {
    /// Publish an event on `task_progress:<task_id>`.
    async fn publish(&self, event: ProgressEvent) -> Result<()>;

    /// Subscribe to events for a single task. The stream ends when a
    /// terminal event is observed or the subscription is dropped.
    async fn subscribe(&self, task_id: &JobId) -> Result<BoxStream<'static, ProgressEvent>>;
}
