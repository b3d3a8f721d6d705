//! The Task query port — read-side lookups that sit alongside
//! [`crate::ports::JobStateMachine`] for listing/history use cases the state
//! machine itself does not need.

use async_trait::async_trait;

use crate::entities::Task;
use crate::error::Result;
use crate::value_objects::RepositoryId;

#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Most recent tasks for a repo, newest first.
    async fn list_for_repo(&self, repo_id: &RepositoryId, limit: usize) -> Result<Vec<Task>>;

    /// Returns `true` if any task anywhere in the system is in a
    /// non-terminal status, used as the Orphan Reconciler's safety interlock.
    async fn any_non_terminal(&self) -> Result<bool>;
}
