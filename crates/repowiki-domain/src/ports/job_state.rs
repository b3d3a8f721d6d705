//! The Job State Machine port — persistent task records with typed status
//! transitions, stage tracking, progress, and failure attribution.

use async_trait::async_trait;

use crate::entities::{Stage, Task};
use crate::error::Result;
use crate::value_objects::JobId;

/// Interface for managing the lifecycle of a [`Task`].
///
/// Every successful [`Self::set_stage`] commits immediately so observers
/// reading via a separate connection see the update. `set_stage` first reads
/// the current status and *refuses* to advance if the task is already
/// `cancelled` or `interrupted`, returning [`crate::error::Error::Cancelled`]
/// so the caller can unwind the pipeline.
#[async_trait]
pub trait JobStateMachine: Send + Sync {
    /// Create a new task row in `Pending` status.
    async fn create(&self, repo_id: crate::value_objects::RepositoryId, task_type: crate::entities::TaskType) -> Result<JobId>;

    /// Advance the task to the running status for `stage`, recording progress
    /// and a human-readable label. Fails with `Cancelled` if the task has
    /// already reached `cancelled` or `interrupted`.
    async fn set_stage(&self, task_id: &JobId, stage: Stage, progress_pct: f32, label: &str) -> Result<()>;

    /// Mark the task failed, stamping `failed_at_stage` and a scrubbed error
    /// message.
    async fn fail(&self, task_id: &JobId, stage: Stage, message: &str) -> Result<()>;

    /// Mark the task successfully completed.
    async fn complete(&self, task_id: &JobId) -> Result<()>;

    /// Mark the task cancelled (best-effort; the cancellation registry flag
    /// is the primary channel — see [`crate::ports::CancellationRegistry`]).
    async fn cancel(&self, task_id: &JobId) -> Result<()>;

    /// Reset a failed task back to `Pending` ahead of a job-runner retry.
    /// No-op if the task has since reached `cancelled` or `interrupted`.
    async fn reset_to_pending(&self, task_id: &JobId) -> Result<()>;

    /// Fetch a task by id.
    async fn get(&self, task_id: &JobId) -> Result<Option<Task>>;

    /// Scan for any non-terminal task and move it (and its repo, unless
    /// already `ready`/`error`) to `interrupted`. Invoked once at worker
    /// startup to prevent ghost jobs: a task whose `external_runner_id`
    /// belonged to a prior worker generation must never auto-resume.
    async fn mark_interrupted_if_non_terminal(&self) -> Result<usize>;

    /// Returns the non-terminal task for a repo, if any (used to enforce the
    /// at-most-one-active-task invariant at submission time).
    async fn active_task_for_repo(&self, repo_id: &crate::value_objects::RepositoryId) -> Result<Option<Task>>;
}
