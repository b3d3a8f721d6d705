//! SQLite-backed [`WikiRepository`]. The wiki tree is stored as a single JSON
//! blob per repository rather than normalized tables: the tree is replaced
//! wholesale on full (re)generation and only individual pages are patched in
//! place, so a relational schema would buy nothing beyond patch complexity.

use async_trait::async_trait;
use repowiki_domain::entities::{Wiki, WikiPage};
use repowiki_domain::error::{Error, Result};
use repowiki_domain::ports::WikiRepository;
use repowiki_domain::value_objects::{RepositoryId, WikiPageId};
use sqlx::{Row, SqlitePool};

pub struct SqliteWikiRepository {
    pool: SqlitePool,
}

impl SqliteWikiRepository {
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WikiRepository for SqliteWikiRepository {
    async fn get(&self, repo_id: &RepositoryId) -> Result<Option<Wiki>> {
        let row = sqlx::query("SELECT sections_json, title FROM wikis WHERE repo_id = ?")
            .bind(repo_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| Error::database(format!("failed to fetch wiki: {e}")))?;
        let Some(row) = row else { return Ok(None) };
        let sections_json: String = row.get("sections_json");
        let sections = serde_json::from_str(&sections_json)?;
        Ok(Some(Wiki {
            repo_id: *repo_id,
            title: row.get("title"),
            sections,
        }))
    }

    async fn replace(&self, wiki: &Wiki) -> Result<()> {
        let sections_json = serde_json::to_string(&wiki.sections)?;
        sqlx::query(
            r"
            INSERT INTO wikis (repo_id, title, sections_json) VALUES (?, ?, ?)
            ON CONFLICT(repo_id) DO UPDATE SET title = excluded.title, sections_json = excluded.sections_json
            ",
        )
        .bind(wiki.repo_id.to_string())
        .bind(&wiki.title)
        .bind(sections_json)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::database(format!("failed to replace wiki: {e}")))?;
        Ok(())
    }

    async fn update_page(&self, repo_id: &RepositoryId, page: &WikiPage) -> Result<()> {
        let Some(mut wiki) = self.get(repo_id).await? else {
            return Err(Error::not_found(format!("wiki for repo {repo_id}")));
        };
        let mut found = false;
        for section in &mut wiki.sections {
            if let Some(existing) = section.pages.iter_mut().find(|p| p.id == page.id) {
                *existing = page.clone();
                found = true;
                break;
            }
        }
        if !found {
            return Err(Error::not_found(format!("wiki page {}", page.id)));
        }
        self.replace(&wiki).await
    }

    async fn get_page(&self, page_id: &WikiPageId) -> Result<Option<WikiPage>> {
        let rows = sqlx::query("SELECT repo_id, sections_json FROM wikis")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| Error::database(format!("failed to scan wikis for page: {e}")))?;
        for row in rows {
            let sections_json: String = row.get("sections_json");
            let sections: Vec<repowiki_domain::entities::WikiSection> =
                serde_json::from_str(&sections_json)?;
            for section in sections {
                if let Some(page) = section.pages.into_iter().find(|p| p.id == *page_id) {
                    return Ok(Some(page));
                }
            }
        }
        Ok(None)
    }

    async fn delete(&self, repo_id: &RepositoryId) -> Result<()> {
        sqlx::query("DELETE FROM wikis WHERE repo_id = ?")
            .bind(repo_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| Error::database(format!("failed to delete wiki: {e}")))?;
        Ok(())
    }
}
