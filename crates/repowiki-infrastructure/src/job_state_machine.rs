//! SQLite-backed [`JobStateMachine`].

use async_trait::async_trait;
use repowiki_domain::entities::{Stage, Task, TaskStatus, TaskType};
use repowiki_domain::error::{Error, Result};
use repowiki_domain::ports::JobStateMachine;
use repowiki_domain::value_objects::{JobId, RepositoryId};
use sqlx::{Row, SqlitePool};

pub struct SqliteJobStateMachine {
    pool: SqlitePool,
}

impl SqliteJobStateMachine {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn task_type_tag(t: TaskType) -> &'static str {
    match t {
        TaskType::FullProcess => "full_process",
        TaskType::IncrementalSync => "incremental_sync",
        TaskType::WikiRegenerate => "wiki_regenerate",
        TaskType::ParseOnly => "parse_only",
    }
}

fn parse_task_type(tag: &str) -> TaskType {
    match tag {
        "incremental_sync" => TaskType::IncrementalSync,
        "wiki_regenerate" => TaskType::WikiRegenerate,
        "parse_only" => TaskType::ParseOnly,
        _ => TaskType::FullProcess,
    }
}

fn status_tag(status: &TaskStatus) -> &'static str {
    match status {
        TaskStatus::Pending => "pending",
        TaskStatus::Cloning => "cloning",
        TaskStatus::Parsing => "parsing",
        TaskStatus::Embedding => "embedding",
        TaskStatus::Generating => "generating",
        TaskStatus::Completed => "completed",
        TaskStatus::Failed => "failed",
        TaskStatus::Cancelled => "cancelled",
        TaskStatus::Interrupted => "interrupted",
    }
}

fn parse_status(tag: &str) -> TaskStatus {
    match tag {
        "cloning" => TaskStatus::Cloning,
        "parsing" => TaskStatus::Parsing,
        "embedding" => TaskStatus::Embedding,
        "generating" => TaskStatus::Generating,
        "completed" => TaskStatus::Completed,
        "failed" => TaskStatus::Failed,
        "cancelled" => TaskStatus::Cancelled,
        "interrupted" => TaskStatus::Interrupted,
        _ => TaskStatus::Pending,
    }
}

fn parse_stage(tag: &str) -> Stage {
    match tag {
        "parse" => Stage::Parse,
        "embed" => Stage::Embed,
        "generate" => Stage::Generate,
        _ => Stage::CloneSync,
    }
}

pub(crate) fn row_to_task(row: &sqlx::sqlite::SqliteRow) -> Task {
    let id: String = row.get("id");
    let repo_id: String = row.get("repo_id");
    let task_type: String = row.get("task_type");
    let status: String = row.get("status");
    let failed_at_stage: Option<String> = row.get("failed_at_stage");
    Task {
        id: JobId::from_string(&id),
        repo_id: RepositoryId::from_string(&repo_id),
        task_type: parse_task_type(&task_type),
        status: parse_status(&status),
        progress_pct: row.get::<f64, _>("progress_pct") as f32,
        current_stage_label: row.get("current_stage_label"),
        failed_at_stage: failed_at_stage.as_deref().map(parse_stage),
        external_runner_id: row.get("external_runner_id"),
        error_message: row.get("error_message"),
        created_at: row.get("created_at"),
        completed_at: row.get("completed_at"),
    }
}

#[async_trait]
impl JobStateMachine for SqliteJobStateMachine {
    async fn create(&self, repo_id: RepositoryId, task_type: TaskType) -> Result<JobId> {
        let task = Task::new(repo_id, task_type);
        sqlx::query(
            r"
            INSERT INTO tasks
                (id, repo_id, task_type, status, progress_pct, current_stage_label,
                 failed_at_stage, external_runner_id, error_message, created_at, completed_at)
            VALUES (?, ?, ?, ?, ?, ?, NULL, NULL, NULL, ?, NULL)
            ",
        )
        .bind(task.id.to_string())
        .bind(task.repo_id.to_string())
        .bind(task_type_tag(task.task_type))
        .bind(status_tag(&task.status))
        .bind(f64::from(task.progress_pct))
        .bind(&task.current_stage_label)
        .bind(task.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::database(format!("failed to create task: {e}")))?;
        Ok(task.id)
    }

    async fn set_stage(&self, task_id: &JobId, stage: Stage, progress_pct: f32, label: &str) -> Result<()> {
        let Some(task) = self.get(task_id).await? else {
            return Err(Error::not_found(format!("task {task_id}")));
        };
        if task.status.is_terminal() {
            return Err(Error::Cancelled {
                task_id: task_id.to_string(),
            });
        }
        let next = TaskStatus::for_stage(stage);
        sqlx::query(
            "UPDATE tasks SET status = ?, progress_pct = ?, current_stage_label = ? WHERE id = ?",
        )
        .bind(status_tag(&next))
        .bind(f64::from(progress_pct))
        .bind(label)
        .bind(task_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| Error::database(format!("failed to set task stage: {e}")))?;
        Ok(())
    }

    async fn fail(&self, task_id: &JobId, stage: Stage, message: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            r"
            UPDATE tasks SET status = 'failed', failed_at_stage = ?, error_message = ?,
                completed_at = ?
            WHERE id = ?
            ",
        )
        .bind(stage.tag())
        .bind(crate::scrubber::scrub(message))
        .bind(now)
        .bind(task_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| Error::database(format!("failed to mark task failed: {e}")))?;
        Ok(())
    }

    async fn complete(&self, task_id: &JobId) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            "UPDATE tasks SET status = 'completed', progress_pct = 100.0, completed_at = ? WHERE id = ?",
        )
        .bind(now)
        .bind(task_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| Error::database(format!("failed to mark task completed: {e}")))?;
        Ok(())
    }

    async fn cancel(&self, task_id: &JobId) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query("UPDATE tasks SET status = 'cancelled', completed_at = ? WHERE id = ?")
            .bind(now)
            .bind(task_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| Error::database(format!("failed to mark task cancelled: {e}")))?;
        Ok(())
    }

    async fn reset_to_pending(&self, task_id: &JobId) -> Result<()> {
        let Some(task) = self.get(task_id).await? else {
            return Ok(());
        };
        if matches!(task.status, TaskStatus::Cancelled | TaskStatus::Interrupted) {
            return Ok(());
        }
        sqlx::query(
            "UPDATE tasks SET status = 'pending', progress_pct = 0.0, current_stage_label = 'Queued' WHERE id = ?",
        )
        .bind(task_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| Error::database(format!("failed to reset task to pending: {e}")))?;
        Ok(())
    }

    async fn get(&self, task_id: &JobId) -> Result<Option<Task>> {
        let row = sqlx::query("SELECT * FROM tasks WHERE id = ?")
            .bind(task_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::database(format!("failed to fetch task: {e}")))?;
        Ok(row.map(|r| row_to_task(&r)))
    }

    async fn mark_interrupted_if_non_terminal(&self) -> Result<usize> {
        let result = sqlx::query(
            "UPDATE tasks SET status = 'interrupted' WHERE status NOT IN ('completed', 'failed', 'cancelled', 'interrupted')",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::database(format!("failed to sweep interrupted tasks: {e}")))?;

        sqlx::query(
            "UPDATE repositories SET status = 'interrupted' WHERE status NOT IN ('ready', 'error')",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| Error::database(format!("failed to sweep interrupted repositories: {e}")))?;

        Ok(result.rows_affected() as usize)
    }

    async fn active_task_for_repo(&self, repo_id: &RepositoryId) -> Result<Option<Task>> {
        let row = sqlx::query(
            "SELECT * FROM tasks WHERE repo_id = ? \
             AND status NOT IN ('completed', 'failed', 'cancelled', 'interrupted') \
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(repo_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::database(format!("failed to query active task: {e}")))?;
        Ok(row.map(|r| row_to_task(&r)))
    }
}

#[cfg(test)]
mod tests {
    use repowiki_domain::value_objects::RepositoryId;

    use super::*;
    use crate::db;

    async fn machine() -> SqliteJobStateMachine {
        let pool = db::connect("sqlite::memory:").await.unwrap();
        SqliteJobStateMachine::new(pool)
    }

    #[tokio::test]
    async fn reset_to_pending_is_noop_after_terminal_cancel() {
        let machine = machine().await;
        let repo_id = RepositoryId::new();
        let task_id = machine.create(repo_id, TaskType::FullProcess).await.unwrap();

        machine.cancel(&task_id).await.unwrap();
        machine.reset_to_pending(&task_id).await.unwrap();

        let task = machine.get(&task_id).await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Cancelled);
    }

    #[tokio::test]
    async fn fail_after_exhausted_retries_stamps_stage_and_scrubs_message() {
        let machine = machine().await;
        let repo_id = RepositoryId::new();
        let task_id = machine.create(repo_id, TaskType::FullProcess).await.unwrap();

        machine
            .fail(&task_id, Stage::Embed, "token ghp_abcdefghijklmnop rejected")
            .await
            .unwrap();

        let task = machine.get(&task_id).await.unwrap().unwrap();
        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.failed_at_stage, Some(Stage::Embed));
        assert!(!task.error_message.unwrap().contains("ghp_"));
    }

    #[tokio::test]
    async fn active_task_for_repo_ignores_terminal_tasks() {
        let machine = machine().await;
        let repo_id = RepositoryId::new();
        let task_id = machine.create(repo_id, TaskType::FullProcess).await.unwrap();

        assert!(machine.active_task_for_repo(&repo_id).await.unwrap().is_some());

        machine.complete(&task_id).await.unwrap();
        assert!(machine.active_task_for_repo(&repo_id).await.unwrap().is_none());
    }
}
