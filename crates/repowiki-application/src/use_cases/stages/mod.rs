//! The four ordered pipeline stages: Clone/Sync, Parse, Embed, Generate.

pub mod clone_sync;
pub mod embed;
pub mod generate;
pub mod parse;

use std::sync::Arc;

use repowiki_domain::entities::{Stage, TaskStatus};
use repowiki_domain::error::{Error, Result};
use repowiki_domain::events::ProgressEvent;
use repowiki_domain::ports::{CancellationRegistry, JobStateMachine, ProgressBus};
use repowiki_domain::value_objects::JobId;

/// Shared handle passed to every stage: progress reporting and cancellation
/// checks, the two cross-cutting concerns every stage needs at its
/// suspension points.
#[derive(Clone)]
pub struct StageContext {
    pub task_id: JobId,
    pub job_state: Arc<dyn JobStateMachine>,
    pub cancellation: Arc<dyn CancellationRegistry>,
    pub progress_bus: Arc<dyn ProgressBus>,
}

impl StageContext {
    /// Check the cancellation registry; if set, publish nothing further and
    /// return the cancellation sentinel. Called at every suspension point.
    pub async fn check_cancelled(&self) -> Result<()> {
        if self.cancellation.get(&self.task_id).await? {
            return Err(Error::Cancelled {
                task_id: self.task_id.to_string(),
            });
        }
        Ok(())
    }

    /// Advance the task's persisted stage/status and publish a progress
    /// event in one call, checking cancellation first so no progress is
    /// recorded once the flag is set (cancel dominance).
    pub async fn report(&self, stage: Stage, pct: f32, label: &str) -> Result<()> {
        self.check_cancelled().await?;
        self.job_state.set_stage(&self.task_id, stage, pct, label).await?;
        self.progress_bus
            .publish(ProgressEvent::progress(
                self.task_id,
                TaskStatus::for_stage(stage),
                pct,
                label,
            ))
            .await?;
        Ok(())
    }
}
