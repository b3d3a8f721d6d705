//! repowiki worker CLI: run the queue-consumption loop, submit a one-off
//! task, or reconcile orphaned clones/vector collections.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use repowiki_domain::value_objects::RepositoryId;
use repowiki_infrastructure::config::AppConfig;
use repowiki_infrastructure::logging;
use repowiki_worker::di::Container;
use repowiki_worker::worker;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "repowiki-worker", about = "Repository ingestion and wiki-generation worker")]
struct Cli {
    /// Path to a config.toml, overriding the default lookup.
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the queue-consumption loop until SIGINT/SIGTERM.
    Serve,
    /// Submit a `full_process` task for a repository URL.
    Submit {
        /// Canonical clone URL.
        url: String,
        /// Human-readable display name.
        #[arg(long, default_value = "")]
        name: String,
    },
    /// Report (and optionally delete) orphaned clones/vector collections.
    Reconcile {
        /// Actually delete orphans instead of only reporting them.
        #[arg(long)]
        execute: bool,
    },
    /// Cancel any in-flight task and cascade-delete a repository.
    Delete {
        /// Repository id (UUID).
        repo_id: String,
    },
}

#[tokio::main]
async fn main() {
    logging::init();

    if let Err(e) = run().await {
        error!(error = %e, "worker exited with an error");
        std::process::exit(1);
    }
}

/// Top-level bootstrapping has no recovery path (bad config, unreachable
/// Redis/SQLite/Git at startup), so `anyhow` is used here rather than the
/// domain's typed `Error` — the pipeline's own stages still propagate the
/// typed error all the way through `Container`.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    let container = Arc::new(Container::build(&config).await?);

    match cli.command {
        Command::Serve => {
            let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
            tokio::spawn(async move {
                let _ = tokio::signal::ctrl_c().await;
                let _ = shutdown_tx.send(());
            });
            info!("worker starting");
            worker::run(container, shutdown_rx).await;
        }
        Command::Submit { url, name } => {
            let display_name = if name.is_empty() { url.clone() } else { name };
            let task_id = container.task_submission.submit_repo(&url, &display_name).await?;
            info!(task_id = %task_id, "submitted task");
            println!("{task_id}");
        }
        Command::Reconcile { execute } => {
            let report = container.orphan_reconciler.scan().await?;
            if report.is_clean() {
                println!("no orphans found");
            } else {
                for orphan in &report.orphans {
                    println!("{orphan:?}");
                }
                if execute {
                    let deleted = container.orphan_reconciler.execute(&report).await?;
                    println!("deleted {deleted} orphan(s)");
                }
            }
        }
        Command::Delete { repo_id } => {
            let repo_id = RepositoryId::from_string(&repo_id);
            container.delete_repo.delete(repo_id).await?;
            info!(repo_id = %repo_id, "repository deleted");
            println!("deleted {repo_id}");
        }
    }

    Ok(())
}
