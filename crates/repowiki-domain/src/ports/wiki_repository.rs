//! The Wiki persistence port.

use async_trait::async_trait;

use crate::entities::Wiki;
use crate::error::Result;
use crate::value_objects::{RepositoryId, WikiPageId};

#[async_trait]
pub trait WikiRepository: Send + Sync {
    async fn get(&self, repo_id: &RepositoryId) -> Result<Option<Wiki>>;

    /// Replace the whole wiki for a repo: cascading delete of any existing
    /// sections/pages followed by inserting `wiki` in full.
    async fn replace(&self, wiki: &Wiki) -> Result<()>;

    /// Update a single page's body/importance/summary in place, without
    /// touching the rest of the tree (used by incremental regeneration).
    async fn update_page(&self, repo_id: &RepositoryId, page: &crate::entities::WikiPage) -> Result<()>;

    async fn get_page(&self, page_id: &WikiPageId) -> Result<Option<crate::entities::WikiPage>>;

    async fn delete(&self, repo_id: &RepositoryId) -> Result<()>;
}
