// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake git adapter for deterministic testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{GitAdapter, GitError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Recorded call to FakeGitAdapter
#[derive(Debug, Clone, PartialEq)]
pub enum GitCall {
    Fetch { remote: String, branch: String },
    GetCommitHash { reference: String },
    MergeBase { a: String, b: String },
    Merge { reference: String, ff_only: bool },
    Rebase { onto: String },
    Commit { message: String },
    Add { paths: Vec<PathBuf> },
    Push { remote: String, refspec: String },
    CreateBranch { name: String, start: String },
    WorktreeAdd { path: PathBuf, branch: String },
    WorktreeRemove { path: PathBuf },
    Raw { args: Vec<String> },
}

impl GitCall {
    /// Operation key used for scripted results.
    pub fn op(&self) -> &'static str {
        match self {
            GitCall::Fetch { .. } => "fetch",
            GitCall::GetCommitHash { .. } => "get_commit_hash",
            GitCall::MergeBase { .. } => "merge_base",
            GitCall::Merge { .. } => "merge",
            GitCall::Rebase { .. } => "rebase",
            GitCall::Commit { .. } => "commit",
            GitCall::Add { .. } => "add",
            GitCall::Push { .. } => "push",
            GitCall::CreateBranch { .. } => "create_branch_no_checkout",
            GitCall::WorktreeAdd { .. } => "worktree_add_existing",
            GitCall::WorktreeRemove { .. } => "worktree_remove",
            GitCall::Raw { .. } => "raw",
        }
    }
}

struct FakeGitState {
    calls: Vec<GitCall>,
    /// Scripted results per operation, consumed front to back.
    scripted: HashMap<&'static str, VecDeque<Result<String, GitError>>>,
    /// Commit hashes per reference for get_commit_hash.
    hashes: HashMap<String, String>,
}

/// Fake git adapter: records all calls, returns scripted results.
///
/// Unscripted operations succeed with an empty output; unscripted hash
/// lookups return a deterministic per-reference value.
#[derive(Clone)]
pub struct FakeGitAdapter {
    inner: Arc<Mutex<FakeGitState>>,
}

impl Default for FakeGitAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeGitAdapter {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeGitState {
                calls: Vec::new(),
                scripted: HashMap::new(),
                hashes: HashMap::new(),
            })),
        }
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<GitCall> {
        self.inner.lock().calls.clone()
    }

    /// Recorded calls for one operation
    pub fn calls_of(&self, op: &str) -> Vec<GitCall> {
        self.inner
            .lock()
            .calls
            .iter()
            .filter(|c| c.op() == op)
            .cloned()
            .collect()
    }

    /// Clear recorded calls
    pub fn clear_calls(&self) {
        self.inner.lock().calls.clear();
    }

    /// Queue a result for the next call of `op`.
    pub fn script(&self, op: &'static str, result: Result<String, GitError>) {
        self.inner.lock().scripted.entry(op).or_default().push_back(result);
    }

    /// Queue `n` failures for `op`.
    pub fn script_failures(&self, op: &'static str, n: usize, error: GitError) {
        for _ in 0..n {
            self.script(op, Err(error.clone()));
        }
    }

    /// Set the hash returned for a reference.
    pub fn set_hash(&self, reference: &str, hash: &str) {
        self.inner
            .lock()
            .hashes
            .insert(reference.to_string(), hash.to_string());
    }

    fn record(&self, call: GitCall) -> Result<String, GitError> {
        let mut inner = self.inner.lock();
        let op = call.op();
        let scripted = inner
            .scripted
            .get_mut(op)
            .and_then(|queue| queue.pop_front());

        let result = match scripted {
            Some(result) => result,
            None => match &call {
                GitCall::GetCommitHash { reference } => Ok(inner
                    .hashes
                    .get(reference)
                    .cloned()
                    .unwrap_or_else(|| format!("fake-{reference}"))),
                _ => Ok(String::new()),
            },
        };

        inner.calls.push(call);
        result
    }
}

#[async_trait]
impl GitAdapter for FakeGitAdapter {
    async fn fetch(&self, _workdir: &Path, remote: &str, branch: &str) -> Result<(), GitError> {
        self.record(GitCall::Fetch {
            remote: remote.to_string(),
            branch: branch.to_string(),
        })
        .map(|_| ())
    }

    async fn get_commit_hash(&self, _workdir: &Path, reference: &str) -> Result<String, GitError> {
        self.record(GitCall::GetCommitHash {
            reference: reference.to_string(),
        })
    }

    async fn merge_base(&self, _workdir: &Path, a: &str, b: &str) -> Result<String, GitError> {
        self.record(GitCall::MergeBase {
            a: a.to_string(),
            b: b.to_string(),
        })
    }

    async fn merge(&self, _workdir: &Path, reference: &str, ff_only: bool) -> Result<(), GitError> {
        self.record(GitCall::Merge {
            reference: reference.to_string(),
            ff_only,
        })
        .map(|_| ())
    }

    async fn rebase(&self, _workdir: &Path, onto: &str) -> Result<(), GitError> {
        self.record(GitCall::Rebase {
            onto: onto.to_string(),
        })
        .map(|_| ())
    }

    async fn commit(&self, _workdir: &Path, message: &str) -> Result<(), GitError> {
        self.record(GitCall::Commit {
            message: message.to_string(),
        })
        .map(|_| ())
    }

    async fn add(&self, _workdir: &Path, paths: &[PathBuf]) -> Result<(), GitError> {
        self.record(GitCall::Add {
            paths: paths.to_vec(),
        })
        .map(|_| ())
    }

    async fn push(&self, _workdir: &Path, remote: &str, refspec: &str) -> Result<(), GitError> {
        self.record(GitCall::Push {
            remote: remote.to_string(),
            refspec: refspec.to_string(),
        })
        .map(|_| ())
    }

    async fn create_branch_no_checkout(
        &self,
        _workdir: &Path,
        name: &str,
        start: &str,
    ) -> Result<(), GitError> {
        self.record(GitCall::CreateBranch {
            name: name.to_string(),
            start: start.to_string(),
        })
        .map(|_| ())
    }

    async fn worktree_add_existing(
        &self,
        _workdir: &Path,
        path: &Path,
        branch: &str,
    ) -> Result<(), GitError> {
        self.record(GitCall::WorktreeAdd {
            path: path.to_path_buf(),
            branch: branch.to_string(),
        })
        .map(|_| ())
    }

    async fn worktree_remove(&self, _workdir: &Path, path: &Path) -> Result<(), GitError> {
        self.record(GitCall::WorktreeRemove {
            path: path.to_path_buf(),
        })
        .map(|_| ())
    }

    async fn raw(&self, _workdir: &Path, args: &[String]) -> Result<String, GitError> {
        self.record(GitCall::Raw {
            args: args.to_vec(),
        })
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
