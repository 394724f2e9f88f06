// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Git capability consumed by the engine.
//!
//! Every operation takes an explicit working directory: the merge pipeline
//! runs the same adapter against the trunk checkout, lane worktrees, and
//! scratch worktrees, and must never rely on an ambient cwd.

mod cli;
#[cfg(any(test, feature = "test-support"))]
mod fake;

pub use cli::CliGitAdapter;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeGitAdapter, GitCall};

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from git operations
#[derive(Debug, Clone, Error)]
pub enum GitError {
    #[error("git {args} failed (exit {status}): {stderr}")]
    Failed {
        args: String,
        status: i32,
        stderr: String,
    },
    #[error("git {args} timed out after {secs}s")]
    Timeout { args: String, secs: u64 },
    #[error("git {args} produced more output than the {cap} byte cap")]
    OutputTooLarge { args: String, cap: usize },
    #[error("failed to run git: {0}")]
    Spawn(String),
}

impl GitError {
    /// Network-shaped failure: remote unreachable, DNS, auth transport.
    pub fn is_network(&self) -> bool {
        match self {
            GitError::Failed { stderr, .. } => {
                let s = stderr.to_lowercase();
                s.contains("could not resolve host")
                    || s.contains("unable to access")
                    || s.contains("could not read from remote")
                    || s.contains("connection refused")
                    || s.contains("connection timed out")
            }
            GitError::Timeout { .. } => true,
            _ => false,
        }
    }

    /// The merge could not fast-forward.
    pub fn is_non_fast_forward(&self) -> bool {
        match self {
            GitError::Failed { stderr, .. } => {
                let s = stderr.to_lowercase();
                s.contains("not possible to fast-forward")
                    || s.contains("non-fast-forward")
                    || s.contains("cannot fast-forward")
            }
            _ => false,
        }
    }

    /// Merge or rebase hit conflicting changes.
    pub fn is_conflict(&self) -> bool {
        match self {
            GitError::Failed { stderr, .. } => stderr.to_lowercase().contains("conflict"),
            _ => false,
        }
    }
}

/// Git operations the engine consumes.
#[async_trait]
pub trait GitAdapter: Send + Sync {
    async fn fetch(&self, workdir: &Path, remote: &str, branch: &str) -> Result<(), GitError>;

    async fn get_commit_hash(&self, workdir: &Path, reference: &str) -> Result<String, GitError>;

    async fn merge_base(&self, workdir: &Path, a: &str, b: &str) -> Result<String, GitError>;

    /// Merge `reference` into the current branch of `workdir`.
    async fn merge(&self, workdir: &Path, reference: &str, ff_only: bool) -> Result<(), GitError>;

    /// Rebase the current branch of `workdir` onto `onto`.
    async fn rebase(&self, workdir: &Path, onto: &str) -> Result<(), GitError>;

    async fn commit(&self, workdir: &Path, message: &str) -> Result<(), GitError>;

    async fn add(&self, workdir: &Path, paths: &[PathBuf]) -> Result<(), GitError>;

    /// Push a refspec (e.g. `scratch-branch:main`) to a remote.
    async fn push(&self, workdir: &Path, remote: &str, refspec: &str) -> Result<(), GitError>;

    async fn create_branch_no_checkout(
        &self,
        workdir: &Path,
        name: &str,
        start: &str,
    ) -> Result<(), GitError>;

    /// Add a worktree at `path` for an existing branch.
    async fn worktree_add_existing(
        &self,
        workdir: &Path,
        path: &Path,
        branch: &str,
    ) -> Result<(), GitError>;

    async fn worktree_remove(&self, workdir: &Path, path: &Path) -> Result<(), GitError>;

    /// Escape hatch for operations without a dedicated method.
    async fn raw(&self, workdir: &Path, args: &[String]) -> Result<String, GitError>;
}
