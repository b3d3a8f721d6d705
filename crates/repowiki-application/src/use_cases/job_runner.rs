//! The Job Runner — wraps pipeline execution in a durable task envelope:
//! ghost-job pre-flight rejection, retry-with-backoff on unexpected
//! failures, and cancellation-sentinel short-circuiting.

use std::sync::Arc;

use async_trait::async_trait;
use repowiki_domain::constants::{JOB_MAX_RETRIES, JOB_RETRY_DELAYS};
use repowiki_domain::entities::{Task, TaskStatus, TaskType};
use repowiki_domain::error::{Error, Result};
use repowiki_domain::ports::JobStateMachine;
use repowiki_domain::value_objects::{JobId, RepositoryId};
use tracing::{info, warn};

/// Executes the four-stage pipeline (or the short-circuited subset) for one
/// task. Implemented by [`crate::use_cases::pipeline::Pipeline`]; abstracted
/// here so the runner's retry/ghost-job logic can be tested without a real
/// pipeline.
#[async_trait]
pub trait PipelineExecutor: Send + Sync {
    async fn run(&self, task_id: JobId, repo_id: RepositoryId, task_type: TaskType) -> Result<()>;
}

/// Durable envelope around [`PipelineExecutor::run`].
pub struct JobRunner {
    job_state: Arc<dyn JobStateMachine>,
    pipeline: Arc<dyn PipelineExecutor>,
}

impl JobRunner {
    #[must_use]
    pub fn new(job_state: Arc<dyn JobStateMachine>, pipeline: Arc<dyn PipelineExecutor>) -> Self {
        Self { job_state, pipeline }
    }

    /// Run one dequeued task to completion, retrying unexpected failures.
    ///
    /// Ghost jobs (missing task row, or task already `interrupted`) are
    /// silently dropped — this is not an error, just a no-op.
    pub async fn run_task(&self, task_id: JobId) -> Result<()> {
        let task = match self.preflight(task_id).await? {
            Some(task) => task,
            None => return Ok(()),
        };

        let mut attempt = 0u32;
        loop {
            match self.pipeline.run(task_id, task.repo_id, task.task_type).await {
                Ok(()) => {
                    info!(task_id = %task_id, "task completed");
                    return Ok(());
                }
                Err(Error::Cancelled { .. }) => {
                    info!(task_id = %task_id, "task cancelled, not retrying");
                    return Ok(());
                }
                Err(Error::GhostJob { .. }) => {
                    info!(task_id = %task_id, "ghost job detected mid-run, dropping");
                    return Ok(());
                }
                Err(e) if attempt < JOB_MAX_RETRIES => {
                    warn!(task_id = %task_id, attempt, error = %e, "task failed, scheduling retry");

                    match self.job_state.get(&task_id).await? {
                        Some(current) if matches!(current.status, TaskStatus::Cancelled | TaskStatus::Interrupted) => {
                            return Ok(());
                        }
                        Some(_) => {
                            self.job_state.reset_to_pending(&task_id).await?;
                        }
                        None => return Ok(()),
                    }

                    tokio::time::sleep(JOB_RETRY_DELAYS[attempt as usize]).await;
                    attempt += 1;
                }
                Err(e) => {
                    warn!(task_id = %task_id, error = %e, "task failed, retry budget exhausted");
                    let stage = self
                        .job_state
                        .get(&task_id)
                        .await?
                        .and_then(|t| crate::use_cases::pipeline::stage_for_status(&t.status))
                        .unwrap_or(repowiki_domain::entities::Stage::CloneSync);
                    self.job_state.fail(&task_id, stage, &e.to_string()).await.ok();
                    return Err(e);
                }
            }
        }
    }

    /// Reject resurrecting a ghost job: missing task row or already
    /// `interrupted`.
    async fn preflight(&self, task_id: JobId) -> Result<Option<Task>> {
        let Some(task) = self.job_state.get(&task_id).await? else {
            warn!(task_id = %task_id, "ghost job: task row missing, dropping");
            return Ok(None);
        };

        if task.status == TaskStatus::Interrupted {
            warn!(task_id = %task_id, "ghost job: task already interrupted, dropping");
            return Ok(None);
        }

        if task.status.is_terminal() {
            warn!(task_id = %task_id, status = ?task.status, "ghost job: task already terminal, dropping");
            return Ok(None);
        }

        Ok(Some(task))
    }
}
