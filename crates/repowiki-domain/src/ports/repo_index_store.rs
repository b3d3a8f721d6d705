//! The RepoIndex persistence port.

use async_trait::async_trait;

use crate::entities::RepoIndex;
use crate::error::Result;
use crate::value_objects::RepositoryId;

#[async_trait]
pub trait RepoIndexStore: Send + Sync {
    async fn get(&self, repo_id: &RepositoryId) -> Result<Option<RepoIndex>>;

    /// Replace the whole index (used after a full rebuild).
    async fn save(&self, repo_id: &RepositoryId, index: &RepoIndex) -> Result<()>;

    async fn delete(&self, repo_id: &RepositoryId) -> Result<()>;
}
