//! Clone/Sync stage: full shallow clone for `full_process`, fetch+diff+
//! fast-forward for `incremental_sync`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use repowiki_domain::entities::{Repository, RepositoryStatus, Stage, TaskType};
use repowiki_domain::error::{Error, Result};
use repowiki_domain::ports::{DiffEntry, DiffKind, FileStateStore, GitClient, RepoRepository, VectorStoreProvider};

use super::StageContext;

/// Outcome of the Clone/Sync stage, consumed by Parse.
pub struct CloneSyncOutput {
    /// `true` for `full_process` (forces Parse to ignore FileState hits).
    pub full_rebuild: bool,
    /// Union of added, modified, and deleted paths (empty for full rebuild,
    /// where every recognized file is implicitly "changed").
    pub changed_paths: Vec<String>,
    /// Paths added since the last sync (renames decomposed into add+delete).
    pub added: usize,
    /// Paths modified since the last sync.
    pub modified: usize,
    /// Paths deleted since the last sync (renames decomposed into add+delete).
    pub deleted: usize,
}

pub struct CloneSyncStage {
    git: Arc<dyn GitClient>,
    repos: Arc<dyn RepoRepository>,
    file_states: Arc<dyn FileStateStore>,
    vector_store: Arc<dyn VectorStoreProvider>,
    clones_root: PathBuf,
}

impl CloneSyncStage {
    #[must_use]
    pub fn new(
        git: Arc<dyn GitClient>,
        repos: Arc<dyn RepoRepository>,
        file_states: Arc<dyn FileStateStore>,
        vector_store: Arc<dyn VectorStoreProvider>,
        clones_root: PathBuf,
    ) -> Self {
        Self {
            git,
            repos,
            file_states,
            vector_store,
            clones_root,
        }
    }

    pub async fn run(
        &self,
        ctx: &StageContext,
        repo: &mut Repository,
        task_type: TaskType,
    ) -> Result<CloneSyncOutput> {
        ctx.report(Stage::CloneSync, 0.0, "Cloning repository").await?;

        match task_type {
            TaskType::FullProcess => self.full_clone(ctx, repo).await,
            TaskType::IncrementalSync => self.incremental_sync(ctx, repo).await,
            TaskType::WikiRegenerate | TaskType::ParseOnly => Ok(CloneSyncOutput {
                full_rebuild: false,
                changed_paths: Vec::new(),
                added: 0,
                modified: 0,
                deleted: 0,
            }),
        }
    }

    async fn full_clone(&self, ctx: &StageContext, repo: &mut Repository) -> Result<CloneSyncOutput> {
        let dest = self.clones_root.join(repo.id.to_string());
        self.git.clone_repo(&repo.canonical_url, &dest).await?;

        ctx.check_cancelled().await?;

        let commit = self.git.rev_parse_head(&dest).await?;
        repo.local_clone_path = Some(dest.to_string_lossy().into_owned());
        repo.current_commit = Some(commit);
        repo.status = RepositoryStatus::Ready;
        repo.last_synced_at = Some(chrono::Utc::now());
        self.repos.update(repo).await?;

        ctx.report(Stage::CloneSync, 20.0, "Clone complete").await?;

        Ok(CloneSyncOutput {
            full_rebuild: true,
            changed_paths: Vec::new(),
            added: 0,
            modified: 0,
            deleted: 0,
        })
    }

    async fn incremental_sync(&self, ctx: &StageContext, repo: &mut Repository) -> Result<CloneSyncOutput> {
        let clone_path = repo
            .local_clone_path
            .as_ref()
            .ok_or_else(|| Error::internal("incremental sync requested but repo has no clone path"))?
            .clone();
        let clone_path = Path::new(&clone_path);

        self.git.fetch(clone_path).await?;
        ctx.check_cancelled().await?;

        let local_head = self.git.rev_parse_head(clone_path).await?;
        let remote_head = self.git.remote_head(clone_path).await?;

        if local_head == remote_head {
            ctx.report(Stage::CloneSync, 20.0, "No changes to sync").await?;
            return Ok(CloneSyncOutput {
                full_rebuild: false,
                changed_paths: Vec::new(),
                added: 0,
                modified: 0,
                deleted: 0,
            });
        }

        let raw_diff = self.git.diff(clone_path, &local_head, &remote_head).await?;
        let entries = decompose_renames(raw_diff);

        let mut changed = Vec::with_capacity(entries.len());
        let (mut added, mut modified, mut deleted) = (0usize, 0usize, 0usize);
        for entry in &entries {
            match entry.kind {
                DiffKind::Added => added += 1,
                DiffKind::Modified => modified += 1,
                DiffKind::Deleted => deleted += 1,
                DiffKind::Renamed { .. } => unreachable!("renames decomposed above"),
            }
            if matches!(entry.kind, DiffKind::Deleted | DiffKind::Modified) {
                let removed_ids = self
                    .file_states
                    .delete(&repo.id, &entry.path)
                    .await?
                    .into_iter()
                    .map(|id| id.to_string())
                    .collect::<Vec<_>>();
                if !removed_ids.is_empty() {
                    let collection = format!("repo_{}_chunks", repo.id.to_string().replace('-', "_"));
                    self.vector_store.delete_points(&collection, &removed_ids).await?;
                }
            }
            changed.push(entry.path.clone());
        }

        self.git.fast_forward(clone_path, &remote_head).await?;
        repo.current_commit = Some(remote_head);
        repo.last_synced_at = Some(chrono::Utc::now());
        repo.status = RepositoryStatus::Ready;
        self.repos.update(repo).await?;

        ctx.report(Stage::CloneSync, 20.0, "Sync complete").await?;

        Ok(CloneSyncOutput {
            full_rebuild: false,
            changed_paths: changed,
            added,
            modified,
            deleted,
        })
    }
}

/// Decode `R` (rename) diff entries as a delete of the old path plus an add
/// of the new path, so no downstream stage ever sees a rename.
fn decompose_renames(entries: Vec<DiffEntry>) -> Vec<DiffEntry> {
    let mut out = Vec::with_capacity(entries.len());
    for entry in entries {
        if let DiffKind::Renamed { from } = entry.kind {
            out.push(DiffEntry {
                path: from,
                kind: DiffKind::Deleted,
            });
            out.push(DiffEntry {
                path: entry.path,
                kind: DiffKind::Added,
            });
        } else {
            out.push(entry);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rename_decomposes_into_delete_and_add() {
        let entries = vec![DiffEntry {
            path: "new.rs".to_owned(),
            kind: DiffKind::Renamed {
                from: "old.rs".to_owned(),
            },
        }];
        let out = decompose_renames(entries);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].path, "old.rs");
        assert_eq!(out[0].kind, DiffKind::Deleted);
        assert_eq!(out[1].path, "new.rs");
        assert_eq!(out[1].kind, DiffKind::Added);
    }
}
