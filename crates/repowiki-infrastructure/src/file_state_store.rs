//! SQLite-backed [`FileStateStore`] — the per-file idempotency ledger.

use async_trait::async_trait;
use repowiki_domain::entities::FileState;
use repowiki_domain::error::{Error, Result};
use repowiki_domain::ports::FileStateStore;
use repowiki_domain::value_objects::{ChunkId, RepositoryId};
use sqlx::{Row, SqlitePool};

pub struct SqliteFileStateStore {
    pool: SqlitePool,
}

impl SqliteFileStateStore {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn row_to_state(row: &sqlx::sqlite::SqliteRow) -> Result<FileState> {
    let repo_id: String = row.get("repo_id");
    let chunk_ids_json: String = row.get("chunk_ids");
    let chunk_ids: Vec<String> = serde_json::from_str(&chunk_ids_json)?;
    Ok(FileState {
        repo_id: RepositoryId::from_string(&repo_id),
        relative_path: row.get("relative_path"),
        last_processed_commit: row.get("last_processed_commit"),
        content_hash: row.get("content_hash"),
        chunk_ids: chunk_ids.iter().map(|s| ChunkId::from_string(s)).collect(),
    })
}

#[async_trait]
impl FileStateStore for SqliteFileStateStore {
    async fn get(&self, repo_id: &RepositoryId, relative_path: &str) -> Result<Option<FileState>> {
        let row = sqlx::query("SELECT * FROM file_states WHERE repo_id = ? AND relative_path = ?")
            .bind(repo_id.to_string())
            .bind(relative_path)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::database(format!("failed to fetch file state: {e}")))?;
        row.map(|r| row_to_state(&r)).transpose()
    }

    async fn list_paths(&self, repo_id: &RepositoryId) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT relative_path FROM file_states WHERE repo_id = ?")
            .bind(repo_id.to_string())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::database(format!("failed to list file state paths: {e}")))?;
        Ok(rows.into_iter().map(|(p,)| p).collect())
    }

    async fn upsert(&self, state: &FileState) -> Result<()> {
        let chunk_ids_json = serde_json::to_string(
            &state.chunk_ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
        )?;
        sqlx::query(
            r"
            INSERT INTO file_states (repo_id, relative_path, last_processed_commit, content_hash, chunk_ids)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(repo_id, relative_path) DO UPDATE SET
                last_processed_commit = excluded.last_processed_commit,
                content_hash = excluded.content_hash,
                chunk_ids = excluded.chunk_ids
            ",
        )
        .bind(state.repo_id.to_string())
        .bind(&state.relative_path)
        .bind(&state.last_processed_commit)
        .bind(&state.content_hash)
        .bind(chunk_ids_json)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::database(format!("failed to upsert file state: {e}")))?;
        Ok(())
    }

    async fn delete(&self, repo_id: &RepositoryId, relative_path: &str) -> Result<Vec<ChunkId>> {
        let existing = self.get(repo_id, relative_path).await?;
        sqlx::query("DELETE FROM file_states WHERE repo_id = ? AND relative_path = ?")
            .bind(repo_id.to_string())
            .bind(relative_path)
            .execute(&self.pool)
            .await
            .map_err(|e| Error::database(format!("failed to delete file state: {e}")))?;
        Ok(existing.map(|s| s.chunk_ids).unwrap_or_default())
    }

    async fn delete_all_for_repo(&self, repo_id: &RepositoryId) -> Result<()> {
        sqlx::query("DELETE FROM file_states WHERE repo_id = ?")
            .bind(repo_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| Error::database(format!("failed to delete file states for repo: {e}")))?;
        Ok(())
    }
}
