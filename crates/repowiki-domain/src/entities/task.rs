//! The [`Task`] entity and its typed status/stage machinery.

use serde::{Deserialize, Serialize};

use crate::value_objects::{JobId, RepositoryId};

/// The kind of work a task performs against a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    /// Full clone, parse, embed, and wiki generation.
    FullProcess,
    /// Incremental sync: diff, re-parse/embed changed files, patch the wiki.
    IncrementalSync,
    /// Regenerate the wiki only, skipping Clone/Sync/Parse/Embed.
    WikiRegenerate,
    /// Parse (and optionally embed) without generating a wiki.
    ParseOnly,
}

/// One of the four ordered pipeline stages. Used both for progress labels and
/// for `failed_at_stage` attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Clone (full) or fetch+diff (incremental).
    CloneSync,
    /// Walk the clone and chunk recognized files.
    Parse,
    /// Embed chunks and upsert into the vector store.
    Embed,
    /// Generate or patch the wiki.
    Generate,
}

impl Stage {
    /// Stages in pipeline order.
    pub const ORDER: [Stage; 4] = [Stage::CloneSync, Stage::Parse, Stage::Embed, Stage::Generate];

    /// Machine-readable tag used for `failed_at_stage` and progress events.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::CloneSync => "clone_sync",
            Self::Parse => "parse",
            Self::Embed => "embed",
            Self::Generate => "generate",
        }
    }

    /// Human-readable label surfaced in progress events.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::CloneSync => "Cloning repository",
            Self::Parse => "Parsing source files",
            Self::Embed => "Embedding chunks",
            Self::Generate => "Generating wiki",
        }
    }

    /// The ordinal position of this stage (0-indexed), used to enforce that
    /// status transitions only move forward.
    #[must_use]
    pub fn ordinal(self) -> usize {
        Self::ORDER.iter().position(|s| *s == self).unwrap_or(0)
    }
}

/// Lifecycle status of a task.
///
/// Transitions are only permitted forward along the stage order
/// (`pending -> cloning -> parsing -> embedding -> generating -> completed`)
/// until a terminal state is reached; terminal states never transition again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskStatus {
    /// Queued, not yet picked up by a worker.
    Pending,
    /// Clone/Sync stage running.
    Cloning,
    /// Parse stage running.
    Parsing,
    /// Embed stage running.
    Embedding,
    /// Generate stage running.
    Generating,
    /// Finished successfully.
    Completed,
    /// Finished with an unrecoverable error.
    Failed,
    /// Ended via cooperative cancellation.
    Cancelled,
    /// Worker restarted mid-run; never auto-resumed.
    Interrupted,
}

impl TaskStatus {
    /// Returns `true` if no further transitions are permitted.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Failed | Self::Cancelled | Self::Interrupted
        )
    }

    /// The running status that corresponds to a given pipeline stage.
    #[must_use]
    pub fn for_stage(stage: Stage) -> Self {
        match stage {
            Stage::CloneSync => Self::Cloning,
            Stage::Parse => Self::Parsing,
            Stage::Embed => Self::Embedding,
            Stage::Generate => Self::Generating,
        }
    }

    /// Ordinal used to check forward-only transitions; terminal statuses sort
    /// after all running statuses.
    fn ordinal(&self) -> usize {
        match self {
            Self::Pending => 0,
            Self::Cloning => 1,
            Self::Parsing => 2,
            Self::Embedding => 3,
            Self::Generating => 4,
            Self::Completed | Self::Failed | Self::Cancelled | Self::Interrupted => 5,
        }
    }

    /// Returns `true` if moving from `self` to `next` respects forward-only
    /// ordering and the terminal-monotonicity invariant.
    #[must_use]
    pub fn can_transition_to(&self, next: &Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        next.ordinal() >= self.ordinal()
    }
}

/// One unit of work against a repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier.
    pub id: JobId,
    /// Repository this task operates against.
    pub repo_id: RepositoryId,
    /// What kind of work this task performs.
    pub task_type: TaskType,
    /// Current lifecycle status.
    pub status: TaskStatus,
    /// Progress percentage, one decimal place (0.0..=100.0).
    pub progress_pct: f32,
    /// Human-readable label for the current stage.
    pub current_stage_label: String,
    /// Machine-readable tag of the stage a failure occurred in, if any.
    pub failed_at_stage: Option<Stage>,
    /// Opaque id assigned by the external task-runner/queue (for revoke).
    pub external_runner_id: Option<String>,
    /// Free-form error message (credential-scrubbed before storage).
    pub error_message: Option<String>,
    /// Unix epoch seconds the task was created.
    pub created_at: i64,
    /// Unix epoch seconds the task reached a terminal state, if any.
    pub completed_at: Option<i64>,
}

impl Task {
    /// Create a new task in `Pending` status for the given repository.
    #[must_use]
    pub fn new(repo_id: RepositoryId, task_type: TaskType) -> Self {
        Self {
            id: JobId::new(),
            repo_id,
            task_type,
            status: TaskStatus::Pending,
            progress_pct: 0.0,
            current_stage_label: "Queued".to_owned(),
            failed_at_stage: None,
            external_runner_id: None,
            error_message: None,
            created_at: chrono::Utc::now().timestamp(),
            completed_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses_never_transition() {
        let done = TaskStatus::Completed;
        assert!(!done.can_transition_to(&TaskStatus::Cloning));
        assert!(!done.can_transition_to(&TaskStatus::Failed));
    }

    #[test]
    fn forward_transitions_allowed() {
        let pending = TaskStatus::Pending;
        assert!(pending.can_transition_to(&TaskStatus::Cloning));
        assert!(pending.can_transition_to(&TaskStatus::Completed));
    }

    #[test]
    fn backward_transition_rejected() {
        let embedding = TaskStatus::Embedding;
        assert!(!embedding.can_transition_to(&TaskStatus::Parsing));
    }

    #[test]
    fn stage_order_matches_pipeline() {
        assert_eq!(Stage::ORDER[0], Stage::CloneSync);
        assert_eq!(Stage::ORDER[3], Stage::Generate);
        assert_eq!(Stage::Embed.ordinal(), 2);
    }
}
