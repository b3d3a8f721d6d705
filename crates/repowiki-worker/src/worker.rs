//! Boot sequence and queue-consumption loop.
//!
//! On start, every non-terminal task/repository is swept to `interrupted`
//! (a crash-recovery invariant: nothing can still be legitimately "running"
//! right after process start). Then the loop dequeues one task at a time
//! (prefetch = 1) and only lets the job queue forget it once
//! [`JobRunner::run_task`] returns (late-ack), so a worker crash mid-task
//! leaves the task recoverable rather than silently dropped.

use std::sync::Arc;

use tracing::{info, warn};

use crate::di::Container;

/// Sweep interrupted non-terminal work, then run the dequeue loop until
/// `shutdown` resolves.
pub async fn run(container: Arc<Container>, mut shutdown: tokio::sync::oneshot::Receiver<()>) {
    if let Err(e) = container.job_state.mark_interrupted_if_non_terminal().await {
        warn!(error = %e, "failed to sweep non-terminal tasks at startup");
    }

    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown => {
                info!("shutdown signal received, stopping queue consumption");
                return;
            }
            dequeued = container.job_queue.dequeue() => {
                match dequeued {
                    Ok(Some(task_id)) => {
                        info!(task_id = %task_id, "dequeued task");
                        if let Err(e) = container.job_runner.run_task(task_id).await {
                            warn!(task_id = %task_id, error = %e, "task run ended in error");
                        }
                    }
                    Ok(None) => {
                        // Clean poll timeout; loop back around.
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to dequeue from job queue");
                        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
                    }
                }
            }
        }
    }
}
