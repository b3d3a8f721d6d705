//! The Cancellation Registry port — an out-of-band, TTL-backed flag store
//! consulted at every stage suspension point.
//!
//! This is the *primary* cancellation channel; it must remain out-of-process
//! (e.g. a keyed store with pub/sub) because workers may run on separate
//! hosts from the API realm. The [`crate::ports::JobStateMachine`] is a
//! secondary channel used when the worker can acquire a write connection.

use async_trait::async_trait;

use crate::error::Result;
use crate::value_objects::JobId;

#[async_trait]
pub trait CancellationRegistry: Send + Sync {
    /// Set the cancel flag for a task, with the registry's configured TTL.
    async fn set(&self, task_id: &JobId) -> Result<()>;

    /// Check whether the cancel flag is set for a task.
    async fn get(&self, task_id: &JobId) -> Result<bool>;

    /// Clear the cancel flag for a task (e.g. on terminal completion, to
    /// avoid a stale flag lingering until TTL expiry).
    async fn clear(&self, task_id: &JobId) -> Result<()>;
}
