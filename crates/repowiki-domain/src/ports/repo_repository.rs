//! The Repository persistence port.

use async_trait::async_trait;

use crate::entities::Repository;
use crate::error::Result;
use crate::value_objects::RepositoryId;

#[async_trait]
pub trait RepoRepository: Send + Sync {
    async fn insert(&self, repo: &Repository) -> Result<()>;

    async fn get(&self, id: &RepositoryId) -> Result<Option<Repository>>;

    async fn get_by_url(&self, canonical_url: &str) -> Result<Option<Repository>>;

    async fn list(&self) -> Result<Vec<Repository>>;

    async fn update(&self, repo: &Repository) -> Result<()>;

    /// Cascading delete: repository row, its tasks, file states, wiki, and
    /// (via the caller, which owns the vector store handle) its collection.
    async fn delete(&self, id: &RepositoryId) -> Result<()>;
}
