// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Traced adapter wrappers for consistent observability

use crate::git::{GitAdapter, GitError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::Instrument;

/// Wrapper that adds tracing to any GitAdapter
#[derive(Clone)]
pub struct TracedGit<G> {
    inner: G,
}

impl<G> TracedGit<G> {
    pub fn new(inner: G) -> Self {
        Self { inner }
    }
}

impl<G: GitAdapter> TracedGit<G> {
    async fn traced<T>(
        &self,
        op: &'static str,
        workdir: &Path,
        fut: impl std::future::Future<Output = Result<T, GitError>>,
    ) -> Result<T, GitError> {
        async {
            let start = std::time::Instant::now();
            let result = fut.await;
            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &result {
                Ok(_) => tracing::debug!(elapsed_ms, "ok"),
                Err(e) => tracing::warn!(elapsed_ms, error = %e, "git failed"),
            }
            result
        }
        .instrument(tracing::debug_span!("git", op, workdir = %workdir.display()))
        .await
    }
}

#[async_trait]
impl<G: GitAdapter> GitAdapter for TracedGit<G> {
    async fn fetch(&self, workdir: &Path, remote: &str, branch: &str) -> Result<(), GitError> {
        self.traced("fetch", workdir, self.inner.fetch(workdir, remote, branch))
            .await
    }

    async fn get_commit_hash(&self, workdir: &Path, reference: &str) -> Result<String, GitError> {
        self.traced(
            "get_commit_hash",
            workdir,
            self.inner.get_commit_hash(workdir, reference),
        )
        .await
    }

    async fn merge_base(&self, workdir: &Path, a: &str, b: &str) -> Result<String, GitError> {
        self.traced("merge_base", workdir, self.inner.merge_base(workdir, a, b))
            .await
    }

    async fn merge(&self, workdir: &Path, reference: &str, ff_only: bool) -> Result<(), GitError> {
        self.traced("merge", workdir, self.inner.merge(workdir, reference, ff_only))
            .await
    }

    async fn rebase(&self, workdir: &Path, onto: &str) -> Result<(), GitError> {
        self.traced("rebase", workdir, self.inner.rebase(workdir, onto))
            .await
    }

    async fn commit(&self, workdir: &Path, message: &str) -> Result<(), GitError> {
        self.traced("commit", workdir, self.inner.commit(workdir, message))
            .await
    }

    async fn add(&self, workdir: &Path, paths: &[PathBuf]) -> Result<(), GitError> {
        self.traced("add", workdir, self.inner.add(workdir, paths)).await
    }

    async fn push(&self, workdir: &Path, remote: &str, refspec: &str) -> Result<(), GitError> {
        self.traced("push", workdir, self.inner.push(workdir, remote, refspec))
            .await
    }

    async fn create_branch_no_checkout(
        &self,
        workdir: &Path,
        name: &str,
        start: &str,
    ) -> Result<(), GitError> {
        self.traced(
            "create_branch_no_checkout",
            workdir,
            self.inner.create_branch_no_checkout(workdir, name, start),
        )
        .await
    }

    async fn worktree_add_existing(
        &self,
        workdir: &Path,
        path: &Path,
        branch: &str,
    ) -> Result<(), GitError> {
        self.traced(
            "worktree_add_existing",
            workdir,
            self.inner.worktree_add_existing(workdir, path, branch),
        )
        .await
    }

    async fn worktree_remove(&self, workdir: &Path, path: &Path) -> Result<(), GitError> {
        self.traced(
            "worktree_remove",
            workdir,
            self.inner.worktree_remove(workdir, path),
        )
        .await
    }

    async fn raw(&self, workdir: &Path, args: &[String]) -> Result<String, GitError> {
        self.traced("raw", workdir, self.inner.raw(workdir, args)).await
    }
}
