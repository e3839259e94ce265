use log::debug;
use std::path::Path;
use tokio::process::Command;

use crate::error::{Result, RunnerError};

/// State of the local checkout the pipeline runs against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInfo {
    pub branch: String,
    pub commit: String,
    pub repository: GitHubRepository,
}

/// A GitHub repository identified by owner and name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitHubRepository {
    pub owner: String,
    pub name: String,
}

impl GitHubRepository {
    /// Parses a GitHub remote URL.
    ///
    /// Accepts `https://github.com/owner/repo`, `git@github.com:owner/repo`
    /// and `ssh://git@github.com/owner/repo`, each with or without `.git`.
    pub fn from_remote_url(remote: &str) -> Result<Self> {
        let remote = remote.trim();
        let path = remote
            .strip_prefix("git@github.com:")
            .or_else(|| remote.strip_prefix("ssh://git@github.com/"))
            .or_else(|| remote.strip_prefix("https://github.com/"))
            .or_else(|| remote.strip_prefix("http://github.com/"))
            .ok_or_else(|| RunnerError::Git(format!("Not a GitHub remote: {remote}")))?;

        let path = path.trim_end_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);

        match path.split('/').collect::<Vec<_>>().as_slice() {
            [owner, name] if !owner.is_empty() && !name.is_empty() => Ok(Self {
                owner: (*owner).to_string(),
                name: (*name).to_string(),
            }),
            _ => Err(RunnerError::Git(format!(
                "Remote URL must point at owner/repo: {remote}"
            ))),
        }
    }

    /// `owner/repo`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    pub fn url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.name)
    }
}

impl SourceInfo {
    /// Reads branch, commit and origin remote from the checkout at `dir`.
    pub async fn discover(dir: &Path) -> Result<Self> {
        let branch = run_git(dir, &["rev-parse", "--abbrev-ref", "HEAD"]).await?;
        let commit = run_git(dir, &["rev-parse", "HEAD"]).await?;
        let remote = run_git(dir, &["remote", "get-url", "origin"]).await?;

        debug!("Checkout at {}: branch={branch} commit={commit} origin={remote}", dir.display());

        Ok(Self {
            branch,
            commit,
            repository: GitHubRepository::from_remote_url(&remote)?,
        })
    }

    pub fn ref_name(&self) -> String {
        format!("refs/heads/{}", self.branch)
    }
}

async fn run_git(dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .await
        .map_err(|e| RunnerError::Git(format!("Failed to run git {}: {e}", args.join(" "))))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(RunnerError::Git(format!(
            "git {} failed: {}",
            args.join(" "),
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
