use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command as AsyncCommand;
use tracing::debug;

/// The narrow slice of version control the sync engine depends on.
///
/// Implementations may shell out or speak a protocol directly; the engine
/// only assumes these five operations succeed or fail.
#[async_trait]
pub trait VcsClient: Send + Sync {
    /// Clone a single branch of `url` into `workspace/dir`
    async fn clone_branch(&self, workspace: &Path, url: &str, branch: &str, dir: &str)
        -> Result<()>;

    /// Rename a named remote inside a working copy
    async fn rename_remote(&self, repo: &Path, from: &str, to: &str) -> Result<()>;

    /// Register a new named remote inside a working copy
    async fn add_remote(&self, repo: &Path, name: &str, url: &str) -> Result<()>;

    /// Push `refspec` to `remote`, optionally recording it as upstream
    async fn push(&self, repo: &Path, remote: &str, refspec: &str, set_upstream: bool)
        -> Result<()>;

    /// Pull from a named remote using its tracked branch configuration
    async fn pull(&self, repo: &Path, remote: &str) -> Result<()>;
}

/// `VcsClient` backed by the installed `git` binary
#[derive(Debug, Default)]
pub struct GitCli;

impl GitCli {
    pub fn new() -> Self {
        Self
    }

    async fn run_git(&self, cwd: &Path, args: &[&str]) -> Result<()> {
        debug!("git {} (in {})", args.join(" "), cwd.display());

        let output = AsyncCommand::new("git")
            .args(args)
            .current_dir(cwd)
            .output()
            .await
            .with_context(|| format!("failed to execute git {}", args[0]))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!(
                "git {} exited with {}: {}",
                args[0],
                output.status,
                stderr_tail(&stderr)
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl VcsClient for GitCli {
    async fn clone_branch(
        &self,
        workspace: &Path,
        url: &str,
        branch: &str,
        dir: &str,
    ) -> Result<()> {
        self.run_git(workspace, &["clone", "-b", branch, url, dir])
            .await
    }

    async fn rename_remote(&self, repo: &Path, from: &str, to: &str) -> Result<()> {
        self.run_git(repo, &["remote", "rename", from, to]).await
    }

    async fn add_remote(&self, repo: &Path, name: &str, url: &str) -> Result<()> {
        self.run_git(repo, &["remote", "add", name, url]).await
    }

    async fn push(
        &self,
        repo: &Path,
        remote: &str,
        refspec: &str,
        set_upstream: bool,
    ) -> Result<()> {
        if set_upstream {
            self.run_git(repo, &["push", "-u", remote, refspec]).await
        } else {
            self.run_git(repo, &["push", remote, refspec]).await
        }
    }

    async fn pull(&self, repo: &Path, remote: &str) -> Result<()> {
        self.run_git(repo, &["pull", remote]).await
    }
}

/// Verify the git binary is reachable before starting a batch
pub async fn ensure_git_available() -> Result<String> {
    let output = AsyncCommand::new("git")
        .arg("--version")
        .output()
        .await
        .context("git executable not found on PATH")?;

    if !output.status.success() {
        return Err(anyhow!("git --version exited with {}", output.status));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Last few non-empty stderr lines, enough to identify the failure
fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.is_empty() {
        return "(no stderr output)".to_string();
    }

    let start = lines.len().saturating_sub(3);
    lines[start..].join(" / ")
}
