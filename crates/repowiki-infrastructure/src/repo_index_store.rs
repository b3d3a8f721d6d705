//! SQLite-backed [`RepoIndexStore`], also stored as a JSON blob per repo.

use async_trait::async_trait;
use repowiki_domain::entities::RepoIndex;
use repowiki_domain::error::{Error, Result};
use repowiki_domain::ports::RepoIndexStore;
use repowiki_domain::value_objects::RepositoryId;
use sqlx::{Row, SqlitePool};

pub struct SqliteRepoIndexStore {
    pool: SqlitePool,
}

impl SqliteRepoIndexStore {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RepoIndexStore for SqliteRepoIndexStore {
    async fn get(&self, repo_id: &RepositoryId) -> Result<Option<RepoIndex>> {
        let row = sqlx::query("SELECT files_json FROM repo_indexes WHERE repo_id = ?")
            .bind(repo_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::database(format!("failed to fetch repo index: {e}")))?;
        let Some(row) = row else { return Ok(None) };
        let files_json: String = row.get("files_json");
        Ok(Some(serde_json::from_str(&files_json)?))
    }

    async fn save(&self, repo_id: &RepositoryId, index: &RepoIndex) -> Result<()> {
        let files_json = serde_json::to_string(index)?;
        sqlx::query(
            r"
            INSERT INTO repo_indexes (repo_id, files_json) VALUES (?, ?)
            ON CONFLICT(repo_id) DO UPDATE SET files_json = excluded.files_json
            ",
        )
        .bind(repo_id.to_string())
        .bind(files_json)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::database(format!("failed to save repo index: {e}")))?;
        Ok(())
    }

    async fn delete(&self, repo_id: &RepositoryId) -> Result<()> {
        sqlx::query("DELETE FROM repo_indexes WHERE repo_id = ?")
            .bind(repo_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| Error::database(format!("failed to delete repo index: {e}")))?;
        Ok(())
    }
}
