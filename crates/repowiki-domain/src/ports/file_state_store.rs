//! The File State Store port — the per-repo, per-path idempotency ledger.

use async_trait::async_trait;

use crate::entities::FileState;
use crate::error::Result;
use crate::value_objects::RepositoryId;

#[async_trait]
pub trait FileStateStore: Send + Sync {
    /// Fetch the recorded state for a single path, if any.
    async fn get(&self, repo_id: &RepositoryId, relative_path: &str) -> Result<Option<FileState>>;

    /// All paths currently recorded for a repo (used by the incremental
    /// syncer's rename/deletion reconciliation).
    async fn list_paths(&self, repo_id: &RepositoryId) -> Result<Vec<String>>;

    /// Atomically write a FileState row *after* the corresponding chunks have
    /// been upserted into the vector store. Never called on parse alone.
    async fn upsert(&self, state: &FileState) -> Result<()>;

    /// Remove the row for a path, returning the chunk ids that were listed
    /// (so the caller can delete them from the vector store).
    async fn delete(&self, repo_id: &RepositoryId, relative_path: &str) -> Result<Vec<crate::value_objects::ChunkId>>;

    /// Remove every row for a repo (used by cascading delete).
    async fn delete_all_for_repo(&self, repo_id: &RepositoryId) -> Result<()>;
}
