//! Progress event schema published on `task_progress:<task_id>` topics.

use serde::{Deserialize, Serialize};

use crate::entities::TaskStatus;
use crate::value_objects::JobId;

/// One progress update for a task, as published to the [`crate::ports::ProgressBus`].
///
/// Terminal events are those whose `status` is in
/// `{completed, failed, cancelled, interrupted}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// The task this event describes.
    pub task_id: JobId,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Progress percentage, one decimal place.
    pub progress_pct: f32,
    /// Human-readable stage label.
    pub stage: String,
    /// RFC3339 timestamp of the event.
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Id of the generated/updated wiki, set on a successful terminal event.
    pub wiki_id: Option<String>,
    /// Set instead of failing when incremental regeneration can't fully
    /// refresh the wiki (dirty ratio over threshold).
    pub wiki_regen_suggestion: Option<String>,
    /// Count of wiki pages that failed generation without aborting the job.
    pub skipped_pages: Option<usize>,
    /// Summary statistics for an incremental sync terminal event.
    pub sync_stats: Option<SyncStats>,
}

impl ProgressEvent {
    /// Build a non-terminal progress event.
    #[must_use]
    pub fn progress(task_id: JobId, status: TaskStatus, progress_pct: f32, stage: &str) -> Self {
        Self {
            task_id,
            status,
            progress_pct,
            stage: stage.to_owned(),
            timestamp: chrono::Utc::now(),
            wiki_id: None,
            wiki_regen_suggestion: None,
            skipped_pages: None,
            sync_stats: None,
        }
    }

    /// Returns `true` if this event reports a terminal task status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Summary of an incremental sync, attached to its terminal event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncStats {
    /// Number of files added.
    pub added: usize,
    /// Number of files modified.
    pub modified: usize,
    /// Number of files deleted.
    pub deleted: usize,
    /// Net change in vector-store chunk count.
    pub chunk_delta: i64,
    /// `true` if the diff was empty (no changes to sync).
    pub no_changes: bool,
}
