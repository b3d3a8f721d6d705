//! Subprocess-backed [`GitClient`]. Shells out to the system `git` binary
//! (located once via `which`) rather than linking libgit2, so host-configured
//! credential helpers and SSH agents work without extra wiring.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use repowiki_domain::constants::{GIT_CLONE_TIMEOUT, GIT_DIFF_TIMEOUT, GIT_FETCH_TIMEOUT};
use repowiki_domain::error::{Error, Result};
use repowiki_domain::ports::git::{DiffEntry, DiffKind};
use repowiki_domain::ports::GitClient;
use tokio::process::Command;

/// Runs `git` as a subprocess for clone/fetch/diff operations.
pub struct ProcessGitClient {
    git_binary: std::path::PathBuf,
}

impl ProcessGitClient {
    /// Locate the `git` binary on `PATH`.
    pub fn discover() -> Result<Self> {
        let git_binary =
            which::which("git").map_err(|e| Error::git(format!("git binary not found: {e}")))?;
        Ok(Self { git_binary })
    }

    async fn run(&self, args: &[&str], cwd: Option<&Path>, timeout: std::time::Duration) -> Result<String> {
        let mut command = Command::new(&self.git_binary);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = cwd {
            command.current_dir(cwd);
        }

        let output = tokio::time::timeout(timeout, command.output())
            .await
            .map_err(|_| Error::git(format!("git {args:?} timed out after {timeout:?}")))?
            .map_err(|e| Error::git(format!("failed to spawn git: {e}")))?;

        if !output.status.success() {
            let stderr = crate::scrub_argv(&String::from_utf8_lossy(&output.stderr));
            return Err(Error::git(format!(
                "git {} failed: {stderr}",
                args.first().unwrap_or(&"")
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
    }
}

#[async_trait]
impl GitClient for ProcessGitClient {
    async fn clone_repo(&self, url: &str, dest: &Path) -> Result<()> {
        let dest_str = dest.to_string_lossy().into_owned();
        self.run(
            &["clone", "--no-tags", url, &dest_str],
            None,
            GIT_CLONE_TIMEOUT,
        )
        .await?;
        Ok(())
    }

    async fn fetch(&self, repo_path: &Path) -> Result<()> {
        self.run(&["fetch", "origin"], Some(repo_path), GIT_FETCH_TIMEOUT)
            .await?;
        Ok(())
    }

    async fn rev_parse_head(&self, repo_path: &Path) -> Result<String> {
        self.run(&["rev-parse", "HEAD"], Some(repo_path), GIT_FETCH_TIMEOUT)
            .await
    }

    async fn remote_head(&self, repo_path: &Path) -> Result<String> {
        let out = self
            .run(&["rev-parse", "origin/HEAD"], Some(repo_path), GIT_FETCH_TIMEOUT)
            .await?;
        Ok(out)
    }

    async fn fast_forward(&self, repo_path: &Path, target: &str) -> Result<()> {
        let current = self.rev_parse_head(repo_path).await?;
        let is_ancestor = Command::new(&self.git_binary)
            .args(["merge-base", "--is-ancestor", &current, target])
            .current_dir(repo_path)
            .status()
            .await
            .map_err(|e| Error::git(format!("failed to check fast-forward ancestry: {e}")))?;
        if !is_ancestor.success() {
            return Err(Error::git(
                "refusing non-fast-forward update: local HEAD is not an ancestor of target".to_owned(),
            ));
        }
        self.run(&["merge", "--ff-only", target], Some(repo_path), GIT_FETCH_TIMEOUT)
            .await?;
        Ok(())
    }

    async fn diff(&self, repo_path: &Path, from: &str, to: &str) -> Result<Vec<DiffEntry>> {
        let out = self
            .run(
                &["diff", "--name-status", "-M", from, to],
                Some(repo_path),
                GIT_DIFF_TIMEOUT,
            )
            .await?;
        Ok(out.lines().filter_map(parse_diff_line).collect())
    }
}

fn parse_diff_line(line: &str) -> Option<DiffEntry> {
    let mut parts = line.split('\t');
    let status = parts.next()?;
    match status.chars().next()? {
        'A' => Some(DiffEntry {
            path: parts.next()?.to_owned(),
            kind: DiffKind::Added,
        }),
        'M' => Some(DiffEntry {
            path: parts.next()?.to_owned(),
            kind: DiffKind::Modified,
        }),
        'D' => Some(DiffEntry {
            path: parts.next()?.to_owned(),
            kind: DiffKind::Deleted,
        }),
        'R' => {
            let from = parts.next()?.to_owned();
            let to = parts.next()?.to_owned();
            Some(DiffEntry {
                path: to,
                kind: DiffKind::Renamed { from },
            })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_added_modified_deleted() {
        assert_eq!(parse_diff_line("A\tsrc/new.rs").unwrap().kind, DiffKind::Added);
        assert_eq!(parse_diff_line("M\tsrc/lib.rs").unwrap().kind, DiffKind::Modified);
        assert_eq!(parse_diff_line("D\told.rs").unwrap().kind, DiffKind::Deleted);
    }

    #[test]
    fn parses_rename_into_from_and_path() {
        let entry = parse_diff_line("R100\told.rs\tnew.rs").unwrap();
        assert_eq!(entry.path, "new.rs");
        assert_eq!(entry.kind, DiffKind::Renamed { from: "old.rs".to_owned() });
    }
}
