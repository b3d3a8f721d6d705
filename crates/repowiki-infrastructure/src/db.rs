//! SQLite connection pool bootstrap and schema migrations, shared by every
//! sqlx-backed repository in this crate. Mirrors the teacher's pattern of a
//! single pool plus inline `CREATE TABLE IF NOT EXISTS` migrations run once
//! at startup, rather than a separate migration tool.

use repowiki_domain::error::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

/// Connect to the configured SQLite database, creating the file (and any
/// missing parent directory) if needed, and run schema migrations.
pub async fn connect(database_url: &str) -> Result<SqlitePool> {
    if let Some(path_str) = database_url.strip_prefix("sqlite:")
        && path_str != ":memory:"
    {
        let path = std::path::Path::new(path_str);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }

    let options: SqliteConnectOptions = database_url
        .parse()
        .map_err(|e| Error::database(format!("invalid database URL: {e}")))?;
    let options = options.create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await
        .map_err(|e| Error::database(format!("failed to connect to database: {e}")))?;

    run_migrations(&pool).await?;
    Ok(pool)
}

async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let statements = [
        r"
        CREATE TABLE IF NOT EXISTS repositories (
            id TEXT PRIMARY KEY,
            canonical_url TEXT NOT NULL UNIQUE,
            display_name TEXT NOT NULL,
            hosting_platform TEXT NOT NULL,
            default_branch TEXT NOT NULL,
            local_clone_path TEXT,
            status TEXT NOT NULL,
            last_synced_at INTEGER,
            current_commit TEXT
        )",
        r"
        CREATE TABLE IF NOT EXISTS tasks (
            id TEXT PRIMARY KEY,
            repo_id TEXT NOT NULL,
            task_type TEXT NOT NULL,
            status TEXT NOT NULL,
            progress_pct REAL NOT NULL,
            current_stage_label TEXT NOT NULL,
            failed_at_stage TEXT,
            external_runner_id TEXT,
            error_message TEXT,
            created_at INTEGER NOT NULL,
            completed_at INTEGER
        )",
        "CREATE INDEX IF NOT EXISTS idx_tasks_repo_id ON tasks(repo_id)",
        r"
        CREATE TABLE IF NOT EXISTS file_states (
            repo_id TEXT NOT NULL,
            relative_path TEXT NOT NULL,
            last_processed_commit TEXT NOT NULL,
            content_hash TEXT NOT NULL,
            chunk_ids TEXT NOT NULL,
            PRIMARY KEY (repo_id, relative_path)
        )",
        r"
        CREATE TABLE IF NOT EXISTS wikis (
            repo_id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            sections_json TEXT NOT NULL
        )",
        r"
        CREATE TABLE IF NOT EXISTS repo_indexes (
            repo_id TEXT PRIMARY KEY,
            files_json TEXT NOT NULL
        )",
    ];

    for statement in statements {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| Error::database(format!("migration failed: {e}")))?;
    }

    Ok(())
}
