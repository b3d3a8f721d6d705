//! Orphan Reconciler (§4.7): sweeps on-disk clones and vector-store
//! collections that no live repository owns.

use std::path::PathBuf;
use std::sync::Arc;

use repowiki_domain::error::{Error, Result};
use repowiki_domain::ports::{RepoRepository, TaskRepository, VectorStoreProvider};
use tracing::{info, warn};

/// One orphaned resource found during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Orphan {
    /// A directory under the clones root not referenced by any repo row.
    ClonePath(PathBuf),
    /// A vector-store collection not owned by any repo row.
    VectorCollection(String),
}

/// Result of a scan, ready for the caller to inspect before opting into
/// deletion.
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub orphans: Vec<Orphan>,
}

impl ReconcileReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.orphans.is_empty()
    }
}

pub struct OrphanReconciler {
    repos: Arc<dyn RepoRepository>,
    tasks: Arc<dyn TaskRepository>,
    vector_store: Arc<dyn VectorStoreProvider>,
    clones_root: PathBuf,
}

impl OrphanReconciler {
    #[must_use]
    pub fn new(
        repos: Arc<dyn RepoRepository>,
        tasks: Arc<dyn TaskRepository>,
        vector_store: Arc<dyn VectorStoreProvider>,
        clones_root: PathBuf,
    ) -> Self {
        Self {
            repos,
            tasks,
            vector_store,
            clones_root,
        }
    }

    /// Scan the clones root and the vector-store collection listing,
    /// comparing against live repo ids and their declared clone paths.
    /// Refuses to run while any non-terminal task exists anywhere in the
    /// system (a running job may be mid-clone or mid-collection-creation).
    pub async fn scan(&self) -> Result<ReconcileReport> {
        if self.tasks.any_non_terminal().await? {
            return Err(Error::validation(
                "orphan reconciliation refused: a non-terminal task exists",
            ));
        }

        let live_repos = self.repos.list().await?;
        let live_ids: std::collections::HashSet<String> =
            live_repos.iter().map(|r| r.id.to_string()).collect();
        let live_clone_paths: std::collections::HashSet<PathBuf> = live_repos
            .iter()
            .filter_map(|r| r.local_clone_path.as_ref())
            .map(PathBuf::from)
            .collect();

        let mut orphans = Vec::new();

        if let Ok(entries) = std::fs::read_dir(&self.clones_root) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() && !live_clone_paths.contains(&path) {
                    orphans.push(Orphan::ClonePath(path));
                }
            }
        }

        let collections = self.vector_store.list_collections().await?;
        for collection in collections {
            let owned = live_ids
                .iter()
                .any(|id| collection == format!("repo_{}_chunks", id.replace('-', "_")));
            if !owned {
                orphans.push(Orphan::VectorCollection(collection));
            }
        }

        Ok(ReconcileReport { orphans })
    }

    /// Execute deletion of every orphan found in `report`. Re-checks the
    /// non-terminal-task interlock before each destructive action, since the
    /// report may be stale by the time the caller opts into execution.
    pub async fn execute(&self, report: &ReconcileReport) -> Result<usize> {
        if self.tasks.any_non_terminal().await? {
            return Err(Error::validation(
                "orphan execution refused: a non-terminal task exists",
            ));
        }

        let mut deleted = 0;
        for orphan in &report.orphans {
            match orphan {
                Orphan::ClonePath(path) => match std::fs::remove_dir_all(path) {
                    Ok(()) => {
                        info!(path = %path.display(), "removed orphaned clone directory");
                        deleted += 1;
                    }
                    Err(e) => warn!(path = %path.display(), error = %e, "failed to remove orphaned clone directory"),
                },
                Orphan::VectorCollection(name) => {
                    self.vector_store.delete_collection(name).await?;
                    info!(collection = %name, "removed orphaned vector-store collection");
                    deleted += 1;
                }
            }
        }
        Ok(deleted)
    }
}
