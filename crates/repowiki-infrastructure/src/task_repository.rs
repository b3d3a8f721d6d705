//! SQLite-backed [`TaskRepository`] (read-side queries alongside the
//! job state machine).

use async_trait::async_trait;
use repowiki_domain::entities::Task;
use repowiki_domain::error::{Error, Result};
use repowiki_domain::ports::TaskRepository;
use repowiki_domain::value_objects::RepositoryId;
use sqlx::SqlitePool;

use crate::job_state_machine::row_to_task;

pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn list_for_repo(&self, repo_id: &RepositoryId, limit: usize) -> Result<Vec<Task>> {
        let rows = sqlx::query("SELECT * FROM tasks WHERE repo_id = ? ORDER BY created_at DESC LIMIT ?")
            .bind(repo_id.to_string())
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::database(format!("failed to list tasks for repo: {e}")))?;
        Ok(rows.iter().map(row_to_task).collect())
    }

    async fn any_non_terminal(&self) -> Result<bool> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM tasks WHERE status NOT IN ('completed', 'failed', 'cancelled', 'interrupted')",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Error::database(format!("failed to check for non-terminal tasks: {e}")))?;
        Ok(row.0 > 0)
    }
}
