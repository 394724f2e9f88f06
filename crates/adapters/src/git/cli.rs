// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess-backed git adapter

use super::{GitAdapter, GitError};
use crate::subprocess::{
    output_exceeds_cap, run_with_timeout, GIT_TIMEOUT, GIT_WORKTREE_TIMEOUT, MAX_CAPTURED_OUTPUT,
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

/// Git adapter invoking the `git` binary.
#[derive(Clone)]
pub struct CliGitAdapter {
    timeout: Duration,
}

impl Default for CliGitAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl CliGitAdapter {
    pub fn new() -> Self {
        Self {
            timeout: GIT_TIMEOUT,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn run(
        &self,
        workdir: &Path,
        args: &[&str],
        timeout: Duration,
    ) -> Result<String, GitError> {
        let display = args.join(" ");
        let mut cmd = Command::new("git");
        cmd.args(args).current_dir(workdir);

        let output = run_with_timeout(cmd, timeout, &format!("git {display}"))
            .await
            .map_err(|message| {
                if message.contains("timed out") {
                    GitError::Timeout {
                        args: display.clone(),
                        secs: timeout.as_secs(),
                    }
                } else {
                    GitError::Spawn(message)
                }
            })?;

        if output_exceeds_cap(&output) {
            return Err(GitError::OutputTooLarge {
                args: display,
                cap: MAX_CAPTURED_OUTPUT,
            });
        }

        if !output.status.success() {
            return Err(GitError::Failed {
                args: display,
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

#[async_trait]
impl GitAdapter for CliGitAdapter {
    async fn fetch(&self, workdir: &Path, remote: &str, branch: &str) -> Result<(), GitError> {
        self.run(workdir, &["fetch", remote, branch], self.timeout)
            .await
            .map(|_| ())
    }

    async fn get_commit_hash(&self, workdir: &Path, reference: &str) -> Result<String, GitError> {
        self.run(workdir, &["rev-parse", reference], self.timeout).await
    }

    async fn merge_base(&self, workdir: &Path, a: &str, b: &str) -> Result<String, GitError> {
        self.run(workdir, &["merge-base", a, b], self.timeout).await
    }

    async fn merge(&self, workdir: &Path, reference: &str, ff_only: bool) -> Result<(), GitError> {
        let mut args = vec!["merge"];
        if ff_only {
            args.push("--ff-only");
        }
        args.push(reference);
        self.run(workdir, &args, self.timeout).await.map(|_| ())
    }

    async fn rebase(&self, workdir: &Path, onto: &str) -> Result<(), GitError> {
        self.run(workdir, &["rebase", onto], self.timeout).await.map(|_| ())
    }

    async fn commit(&self, workdir: &Path, message: &str) -> Result<(), GitError> {
        self.run(workdir, &["commit", "-m", message], self.timeout)
            .await
            .map(|_| ())
    }

    async fn add(&self, workdir: &Path, paths: &[PathBuf]) -> Result<(), GitError> {
        let mut args = vec!["add".to_string(), "--".to_string()];
        for p in paths {
            args.push(p.display().to_string());
        }
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run(workdir, &refs, self.timeout).await.map(|_| ())
    }

    async fn push(&self, workdir: &Path, remote: &str, refspec: &str) -> Result<(), GitError> {
        self.run(workdir, &["push", remote, refspec], self.timeout)
            .await
            .map(|_| ())
    }

    async fn create_branch_no_checkout(
        &self,
        workdir: &Path,
        name: &str,
        start: &str,
    ) -> Result<(), GitError> {
        self.run(workdir, &["branch", "--no-track", name, start], self.timeout)
            .await
            .map(|_| ())
    }

    async fn worktree_add_existing(
        &self,
        workdir: &Path,
        path: &Path,
        branch: &str,
    ) -> Result<(), GitError> {
        let path_str = path.display().to_string();
        self.run(
            workdir,
            &["worktree", "add", &path_str, branch],
            GIT_WORKTREE_TIMEOUT,
        )
        .await
        .map(|_| ())
    }

    async fn worktree_remove(&self, workdir: &Path, path: &Path) -> Result<(), GitError> {
        let path_str = path.display().to_string();
        self.run(
            workdir,
            &["worktree", "remove", "--force", &path_str],
            GIT_WORKTREE_TIMEOUT,
        )
        .await
        .map(|_| ())
    }

    async fn raw(&self, workdir: &Path, args: &[String]) -> Result<String, GitError> {
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        self.run(workdir, &refs, self.timeout).await
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
