//! The Git port — subprocess-backed clone/fetch/diff capability used by the
//! Clone/Sync stage. Never touches network credentials directly; callers
//! inject auth via a pre-scrubbed URL or environment and the implementation
//! guarantees argv never leaks into logs unredacted.

use async_trait::async_trait;

use crate::error::Result;

/// Classification of a changed path between two revisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffKind {
    Added,
    Modified,
    Deleted,
    /// Renames are decomposed by the caller into a `Deleted` (old path) plus
    /// an `Added` (new path); this variant is kept only for diagnostics.
    Renamed { from: String },
}

/// A single changed path between two revisions.
#[derive(Debug, Clone)]
pub struct DiffEntry {
    pub path: String,
    pub kind: DiffKind,
}

#[async_trait]
pub trait GitClient: Send + Sync {
    /// Clone `url` into `dest`, shallow or full depending on implementation
    /// policy, honoring [`crate::constants::GIT_CLONE_TIMEOUT`].
    async fn clone_repo(&self, url: &str, dest: &std::path::Path) -> Result<()>;

    /// Fetch updates for an existing working copy, honoring
    /// [`crate::constants::GIT_FETCH_TIMEOUT`].
    async fn fetch(&self, repo_path: &std::path::Path) -> Result<()>;

    /// The current local HEAD commit hash.
    async fn rev_parse_head(&self, repo_path: &std::path::Path) -> Result<String>;

    /// The remote's `HEAD` on the default branch, without mutating the
    /// working copy (used to detect whether a fetch/merge is needed).
    async fn remote_head(&self, repo_path: &std::path::Path) -> Result<String>;

    /// Fast-forward the local branch to `target`. Implementations must refuse
    /// (returning [`crate::error::Error::Git`]) rather than perform a
    /// non-fast-forward merge.
    async fn fast_forward(&self, repo_path: &std::path::Path, target: &str) -> Result<()>;

    /// Diff two revisions, honoring [`crate::constants::GIT_DIFF_TIMEOUT`].
    async fn diff(&self, repo_path: &std::path::Path, from: &str, to: &str) -> Result<Vec<DiffEntry>>;
}
