//! Orchestrates the four ordered stages for one task, short-circuiting to
//! Generate for `wiki_regenerate` and dispatching `full_process` versus
//! `incremental_sync` semantics.

use std::sync::Arc;

use async_trait::async_trait;
use repowiki_domain::entities::{RepoIndex, Stage, TaskStatus, TaskType};
use repowiki_domain::error::{Error, Result};
use repowiki_domain::events::{ProgressEvent, SyncStats};
use repowiki_domain::ports::{CancellationRegistry, JobStateMachine, ProgressBus, RepoIndexStore, RepoRepository};
use repowiki_domain::value_objects::{JobId, RepositoryId};

use super::job_runner::PipelineExecutor;
use super::stages::clone_sync::CloneSyncStage;
use super::stages::embed::EmbedStage;
use super::stages::generate::GenerateStage;
use super::stages::parse::ParseStage;
use super::stages::StageContext;

pub struct Pipeline {
    job_state: Arc<dyn JobStateMachine>,
    cancellation: Arc<dyn CancellationRegistry>,
    progress_bus: Arc<dyn ProgressBus>,
    repos: Arc<dyn RepoRepository>,
    repo_index_store: Arc<dyn RepoIndexStore>,
    clone_sync: Arc<CloneSyncStage>,
    parse: Arc<ParseStage>,
    embed: Arc<EmbedStage>,
    generate: Arc<GenerateStage>,
}

impl Pipeline {
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        job_state: Arc<dyn JobStateMachine>,
        cancellation: Arc<dyn CancellationRegistry>,
        progress_bus: Arc<dyn ProgressBus>,
        repos: Arc<dyn RepoRepository>,
        repo_index_store: Arc<dyn RepoIndexStore>,
        clone_sync: Arc<CloneSyncStage>,
        parse: Arc<ParseStage>,
        embed: Arc<EmbedStage>,
        generate: Arc<GenerateStage>,
    ) -> Self {
        Self {
            job_state,
            cancellation,
            progress_bus,
            repos,
            repo_index_store,
            clone_sync,
            parse,
            embed,
            generate,
        }
    }

    fn ctx(&self, task_id: JobId) -> StageContext {
        StageContext {
            task_id,
            job_state: Arc::clone(&self.job_state),
            cancellation: Arc::clone(&self.cancellation),
            progress_bus: Arc::clone(&self.progress_bus),
        }
    }

    async fn run_full_or_incremental(
        &self,
        ctx: &StageContext,
        repo_id: RepositoryId,
        task_type: TaskType,
    ) -> Result<()> {
        let mut repo = self
            .repos
            .get(&repo_id)
            .await?
            .ok_or_else(|| Error::GhostJob {
                task_id: ctx.task_id.to_string(),
            })?;

        let clone_out = self.clone_sync.run(ctx, &mut repo, task_type).await?;

        if clone_out.changed_paths.is_empty() && !clone_out.full_rebuild && task_type == TaskType::IncrementalSync {
            self.emit_terminal(
                ctx.task_id,
                TaskStatus::Completed,
                None,
                None,
                None,
                Some(SyncStats {
                    added: 0,
                    modified: 0,
                    deleted: 0,
                    chunk_delta: 0,
                    no_changes: true,
                }),
            )
            .await?;
            self.job_state.complete(&ctx.task_id).await?;
            return Ok(());
        }

        let clone_path_str = repo
            .local_clone_path
            .clone()
            .ok_or_else(|| Error::internal("clone path missing after clone/sync stage"))?;
        let clone_path = std::path::Path::new(&clone_path_str);

        let parse_out = self
            .parse
            .run(ctx, repo_id, clone_path, clone_out.full_rebuild)
            .await?;

        let current_commit = repo
            .current_commit
            .clone()
            .ok_or_else(|| Error::internal("current commit missing after clone/sync stage"))?;

        let embed_out = self
            .embed
            .run(
                ctx,
                repo_id,
                parse_out.chunks.clone(),
                parse_out.path_hashes.clone(),
                &current_commit,
            )
            .await?;

        let repo_index = if clone_out.full_rebuild {
            RepoIndex::rebuild(&parse_out.chunks)
        } else {
            let mut existing = self.repo_index_store.get(&repo_id).await?.unwrap_or_default();
            existing.remove_paths(&clone_out.changed_paths);
            existing.patch(&clone_out.changed_paths, &parse_out.chunks);
            existing
        };
        self.repo_index_store.save(&repo_id, &repo_index).await?;

        let generate_out = if clone_out.full_rebuild {
            self.generate
                .run_full(ctx, repo_id, &repo.display_name, &parse_out.chunks, &repo_index)
                .await?
        } else {
            self.generate
                .run_incremental(ctx, repo_id, &clone_out.changed_paths, &parse_out.chunks)
                .await?
        };

        let sync_stats = (!clone_out.full_rebuild).then_some(SyncStats {
            added: clone_out.added,
            modified: clone_out.modified,
            deleted: clone_out.deleted,
            chunk_delta: embed_out.chunk_count as i64,
            no_changes: false,
        });

        self.emit_terminal(
            ctx.task_id,
            TaskStatus::Completed,
            generate_out.wiki_id,
            generate_out.wiki_regen_suggestion,
            Some(generate_out.skipped_pages).filter(|&n| n > 0),
            sync_stats,
        )
        .await?;
        self.job_state.complete(&ctx.task_id).await?;

        Ok(())
    }

    async fn run_wiki_regenerate(&self, ctx: &StageContext, repo_id: RepositoryId) -> Result<()> {
        let repo = self
            .repos
            .get(&repo_id)
            .await?
            .ok_or_else(|| Error::GhostJob {
                task_id: ctx.task_id.to_string(),
            })?;
        let repo_index = self.repo_index_store.get(&repo_id).await?.unwrap_or_default();

        let generate_out = self
            .generate
            .run_full(ctx, repo_id, &repo.display_name, &[], &repo_index)
            .await?;

        self.emit_terminal(
            ctx.task_id,
            TaskStatus::Completed,
            generate_out.wiki_id,
            generate_out.wiki_regen_suggestion,
            Some(generate_out.skipped_pages).filter(|&n| n > 0),
            None,
        )
        .await?;
        self.job_state.complete(&ctx.task_id).await?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    async fn emit_terminal(
        &self,
        task_id: JobId,
        status: TaskStatus,
        wiki_id: Option<String>,
        wiki_regen_suggestion: Option<String>,
        skipped_pages: Option<usize>,
        sync_stats: Option<SyncStats>,
    ) -> Result<()> {
        self.progress_bus
            .publish(ProgressEvent {
                task_id,
                status,
                progress_pct: 100.0,
                stage: Stage::Generate.label().to_owned(),
                timestamp: chrono::Utc::now(),
                wiki_id,
                wiki_regen_suggestion,
                skipped_pages,
                sync_stats,
            })
            .await
    }
}

#[async_trait]
impl PipelineExecutor for Pipeline {
    async fn run(&self, task_id: JobId, repo_id: RepositoryId, task_type: TaskType) -> Result<()> {
        let ctx = self.ctx(task_id);

        let result = match task_type {
            TaskType::FullProcess | TaskType::IncrementalSync | TaskType::ParseOnly => {
                self.run_full_or_incremental(&ctx, repo_id, task_type).await
            }
            TaskType::WikiRegenerate => self.run_wiki_regenerate(&ctx, repo_id).await,
        };

        // Unexpected failures are left unmarked here: the job runner decides
        // whether to retry (reset to pending) or give up (mark failed),
        // since marking failed now would make the task terminal and block
        // the runner's own retry reset.
        if let Err(Error::Cancelled { .. }) = &result {
            self.job_state.cancel(&task_id).await.ok();
        }

        result
    }
}

/// Map a task's current running status back to its pipeline stage, used to
/// attribute a failure to the stage it occurred in.
#[must_use]
pub fn stage_for_status(status: &TaskStatus) -> Option<Stage> {
    match status {
        TaskStatus::Cloning => Some(Stage::CloneSync),
        TaskStatus::Parsing => Some(Stage::Parse),
        TaskStatus::Embedding => Some(Stage::Embed),
        TaskStatus::Generating => Some(Stage::Generate),
        _ => None,
    }
}
