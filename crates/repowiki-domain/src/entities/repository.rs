//! The [`Repository`] entity — the logical subject the pipeline operates over.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::RepositoryId;

/// Lifecycle status of a tracked repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepositoryStatus {
    /// Submitted but not yet cloned.
    Pending,
    /// Clone or incremental sync in progress.
    Cloning,
    /// Clone is current and no task is running against it.
    Ready,
    /// The last clone/sync/process attempt failed.
    Error,
    /// An incremental sync is in progress.
    Syncing,
    /// A task against this repo was interrupted by a worker restart.
    Interrupted,
}

impl RepositoryStatus {
    /// Repos in these statuses are exempt from the ghost-job sweep at worker
    /// boot — they already reflect a terminal or stable outcome.
    #[must_use]
    pub fn is_stable(self) -> bool {
        matches!(self, Self::Ready | Self::Error)
    }
}

/// The logical subject of the pipeline: one Git repository and its derived
/// artifacts (tasks, file states, wiki, vectors, on-disk clone).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    /// Stable opaque identifier.
    pub id: RepositoryId,
    /// Canonical URL (unique across the system).
    pub canonical_url: String,
    /// Display name shown to clients.
    pub display_name: String,
    /// Hosting platform tag (e.g. `github`, `gitlab`, `bitbucket`).
    pub hosting_platform: String,
    /// Default branch name to clone/sync.
    pub default_branch: String,
    /// Local clone path, `None` until the first successful clone.
    pub local_clone_path: Option<String>,
    /// Current lifecycle status.
    pub status: RepositoryStatus,
    /// Timestamp of the last successful sync, if any.
    pub last_synced_at: Option<DateTime<Utc>>,
    /// Commit hash the local clone currently points at.
    pub current_commit: Option<String>,
}

impl Repository {
    /// Create a new repository record in `Pending` status, deriving a stable
    /// id from the canonical URL so repeated submissions of the same URL are
    /// idempotent at the identity layer (the conflict check still applies at
    /// the task layer).
    #[must_use]
    pub fn new(canonical_url: impl Into<String>, display_name: impl Into<String>) -> Self {
        let canonical_url = canonical_url.into();
        Self {
            id: RepositoryId::from_name(&canonical_url),
            hosting_platform: detect_hosting_platform(&canonical_url),
            canonical_url,
            display_name: display_name.into(),
            default_branch: "main".to_owned(),
            local_clone_path: None,
            status: RepositoryStatus::Pending,
            last_synced_at: None,
            current_commit: None,
        }
    }
}

fn detect_hosting_platform(url: &str) -> String {
    for (needle, tag) in [
        ("github.com", "github"),
        ("gitlab.com", "gitlab"),
        ("bitbucket.org", "bitbucket"),
    ] {
        if url.contains(needle) {
            return tag.to_owned();
        }
    }
    "unknown".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_url_yields_same_id() {
        let a = Repository::new("https://github.com/owner/repo", "repo");
        let b = Repository::new("https://github.com/owner/repo", "repo (renamed)");
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn detects_known_hosts() {
        let r = Repository::new("https://gitlab.com/owner/repo", "repo");
        assert_eq!(r.hosting_platform, "gitlab");
    }
}
