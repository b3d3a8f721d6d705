//! The [`FileState`] ledger — per-repo, per-file processing record that
//! enforces exactly-once idempotency across retries.

use serde::{Deserialize, Serialize};

use crate::value_objects::{ChunkId, RepositoryId};

/// Per-repo, per-file processing ledger.
///
/// Invariant: if a row exists with `content_hash == H`, every id in
/// `chunk_ids` is present in the vector store and was derived from content
/// hash `H`. Written atomically *after* embedding success; never on parse
/// alone (see [`crate::ports::FileStateStore::upsert`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileState {
    /// Repository this file belongs to.
    pub repo_id: RepositoryId,
    /// Path relative to the repository root (unique together with `repo_id`).
    pub relative_path: String,
    /// Commit hash this file was last processed at.
    pub last_processed_commit: String,
    /// SHA-256 of the file's content at `last_processed_commit`.
    pub content_hash: String,
    /// Ordered ids of the chunks produced for this file.
    pub chunk_ids: Vec<ChunkId>,
}

impl FileState {
    /// Number of chunks currently recorded for this file.
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunk_ids.len()
    }

    /// Returns `true` if this row is current for the given content hash,
    /// meaning a re-run without file modification should skip processing.
    #[must_use]
    pub fn is_current(&self, content_hash: &str) -> bool {
        self.content_hash == content_hash
    }
}
