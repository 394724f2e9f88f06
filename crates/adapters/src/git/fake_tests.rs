// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::path::Path;

#[tokio::test]
async fn records_calls_in_order() {
    let git = FakeGitAdapter::new();
    let dir = Path::new("/repo");

    git.fetch(dir, "origin", "main").await.unwrap();
    git.merge(dir, "lane/core", true).await.unwrap();

    let calls = git.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].op(), "fetch");
    assert_eq!(
        calls[1],
        GitCall::Merge {
            reference: "lane/core".to_string(),
            ff_only: true
        }
    );
}

#[tokio::test]
async fn scripted_results_are_consumed_in_order() {
    let git = FakeGitAdapter::new();
    let dir = Path::new("/repo");
    let non_ff = GitError::Failed {
        args: "merge --ff-only lane/core".to_string(),
        status: 128,
        stderr: "Not possible to fast-forward".to_string(),
    };
    git.script("merge", Err(non_ff));
    git.script("merge", Ok(String::new()));

    assert!(git.merge(dir, "lane/core", true).await.is_err());
    assert!(git.merge(dir, "lane/core", true).await.is_ok());
    // unscripted falls back to success
    assert!(git.merge(dir, "lane/core", true).await.is_ok());
}

#[tokio::test]
async fn hashes_are_deterministic_per_reference() {
    let git = FakeGitAdapter::new();
    let dir = Path::new("/repo");
    git.set_hash("main", "abc123");

    assert_eq!(git.get_commit_hash(dir, "main").await.unwrap(), "abc123");
    assert_eq!(
        git.get_commit_hash(dir, "origin/main").await.unwrap(),
        "fake-origin/main"
    );
}

#[tokio::test]
async fn calls_of_filters_by_operation() {
    let git = FakeGitAdapter::new();
    let dir = Path::new("/repo");
    git.fetch(dir, "origin", "main").await.unwrap();
    git.push(dir, "origin", "scratch:main").await.unwrap();
    git.fetch(dir, "origin", "main").await.unwrap();

    assert_eq!(git.calls_of("fetch").len(), 2);
    assert_eq!(git.calls_of("push").len(), 1);
}
