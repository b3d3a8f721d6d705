//! SQLite-backed [`RepoRepository`].

use async_trait::async_trait;
use repowiki_domain::entities::{Repository, RepositoryStatus};
use repowiki_domain::error::{Error, Result};
use repowiki_domain::ports::RepoRepository;
use repowiki_domain::value_objects::RepositoryId;
use sqlx::{Row, SqlitePool};

pub struct SqliteRepoRepository {
    pool: SqlitePool,
}

impl SqliteRepoRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn status_tag(status: RepositoryStatus) -> &'static str {
    match status {
        RepositoryStatus::Pending => "pending",
        RepositoryStatus::Cloning => "cloning",
        RepositoryStatus::Ready => "ready",
        RepositoryStatus::Error => "error",
        RepositoryStatus::Syncing => "syncing",
        RepositoryStatus::Interrupted => "interrupted",
    }
}

fn parse_status(tag: &str) -> RepositoryStatus {
    match tag {
        "cloning" => RepositoryStatus::Cloning,
        "ready" => RepositoryStatus::Ready,
        "error" => RepositoryStatus::Error,
        "syncing" => RepositoryStatus::Syncing,
        "interrupted" => RepositoryStatus::Interrupted,
        _ => RepositoryStatus::Pending,
    }
}

fn row_to_repository(row: &sqlx::sqlite::SqliteRow) -> Repository {
    let id: String = row.get("id");
    let status: String = row.get("status");
    Repository {
        id: RepositoryId::from_string(&id),
        canonical_url: row.get("canonical_url"),
        display_name: row.get("display_name"),
        hosting_platform: row.get("hosting_platform"),
        default_branch: row.get("default_branch"),
        local_clone_path: row.get("local_clone_path"),
        status: parse_status(&status),
        last_synced_at: row
            .get::<Option<i64>, _>("last_synced_at")
            .map(|secs| chrono::DateTime::from_timestamp(secs, 0).unwrap_or_default()),
        current_commit: row.get("current_commit"),
    }
}

#[async_trait]
impl RepoRepository for SqliteRepoRepository {
    async fn insert(&self, repo: &Repository) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO repositories
                (id, canonical_url, display_name, hosting_platform, default_branch,
                 local_clone_path, status, last_synced_at, current_commit)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(repo.id.to_string())
        .bind(&repo.canonical_url)
        .bind(&repo.display_name)
        .bind(&repo.hosting_platform)
        .bind(&repo.default_branch)
        .bind(&repo.local_clone_path)
        .bind(status_tag(repo.status))
        .bind(repo.last_synced_at.map(|t| t.timestamp()))
        .bind(&repo.current_commit)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::database(format!("failed to insert repository: {e}")))?;
        Ok(())
    }

    async fn get(&self, id: &RepositoryId) -> Result<Option<Repository>> {
        let row = sqlx::query("SELECT * FROM repositories WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::database(format!("failed to fetch repository: {e}")))?;
        Ok(row.map(|r| row_to_repository(&r)))
    }

    async fn get_by_url(&self, canonical_url: &str) -> Result<Option<Repository>> {
        let row = sqlx::query("SELECT * FROM repositories WHERE canonical_url = ?")
            .bind(canonical_url)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::database(format!("failed to fetch repository by url: {e}")))?;
        Ok(row.map(|r| row_to_repository(&r)))
    }

    async fn list(&self) -> Result<Vec<Repository>> {
        let rows = sqlx::query("SELECT * FROM repositories ORDER BY canonical_url")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::database(format!("failed to list repositories: {e}")))?;
        Ok(rows.iter().map(row_to_repository).collect())
    }

    async fn update(&self, repo: &Repository) -> Result<()> {
        sqlx::query(
            r"
            UPDATE repositories SET
                display_name = ?, hosting_platform = ?, default_branch = ?,
                local_clone_path = ?, status = ?, last_synced_at = ?, current_commit = ?
            WHERE id = ?
            ",
        )
        .bind(&repo.display_name)
        .bind(&repo.hosting_platform)
        .bind(&repo.default_branch)
        .bind(&repo.local_clone_path)
        .bind(status_tag(repo.status))
        .bind(repo.last_synced_at.map(|t| t.timestamp()))
        .bind(&repo.current_commit)
        .bind(repo.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| Error::database(format!("failed to update repository: {e}")))?;
        Ok(())
    }

    async fn delete(&self, id: &RepositoryId) -> Result<()> {
        let id_str = id.to_string();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::database(format!("failed to begin transaction: {e}")))?;

        for statement in [
            "DELETE FROM file_states WHERE repo_id = ?",
            "DELETE FROM tasks WHERE repo_id = ?",
            "DELETE FROM wikis WHERE repo_id = ?",
            "DELETE FROM repo_indexes WHERE repo_id = ?",
            "DELETE FROM repositories WHERE id = ?",
        ] {
            sqlx::query(statement)
                .bind(&id_str)
                .execute(&mut *tx)
                .await
                .map_err(|e| Error::database(format!("failed to cascade-delete repository: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| Error::database(format!("failed to commit repository delete: {e}")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[tokio::test]
    async fn insert_then_get_by_url_round_trips() {
        let pool = db::connect("sqlite::memory:").await.unwrap();
        let store = SqliteRepoRepository::new(pool);
        let repo = Repository::new("https://github.com/owner/repo", "repo");

        store.insert(&repo).await.unwrap();
        let found = store
            .get_by_url("https://github.com/owner/repo")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, repo.id);
        assert_eq!(found.status, RepositoryStatus::Pending);
    }

    #[tokio::test]
    async fn update_persists_status_change() {
        let pool = db::connect("sqlite::memory:").await.unwrap();
        let store = SqliteRepoRepository::new(pool);
        let mut repo = Repository::new("https://github.com/owner/repo", "repo");
        store.insert(&repo).await.unwrap();

        repo.status = RepositoryStatus::Ready;
        repo.current_commit = Some("abc123".to_owned());
        store.update(&repo).await.unwrap();

        let found = store.get(&repo.id).await.unwrap().unwrap();
        assert_eq!(found.status, RepositoryStatus::Ready);
        assert_eq!(found.current_commit.as_deref(), Some("abc123"));
    }
}
