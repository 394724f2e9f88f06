// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::pipeline::PipelineState::*;
use lf_adapters::{FakeGitAdapter, GitCall};
use std::path::PathBuf;

// The full scope table, row by row.
#[yare::parameterized(
    not_started = { None,             false, false, false },
    validating  = { Some(Validating), false, false, false },
    gating      = { Some(Gating),     false, false, false },
    preparing   = { Some(Preparing),  false, false, false },
    committing  = { Some(Committing), true,  false, false },
    merging     = { Some(Merging),    true,  true,  false },
    pushing     = { Some(Pushing),    true,  true,  false },
    cleaning_up = { Some(CleaningUp), false, false, true  },
)]
fn scope_table(
    failed_at: Option<crate::pipeline::PipelineState>,
    snapshot: bool,
    branch: bool,
    worktree: bool,
) {
    let scope = compute_rollback_scope(failed_at);
    assert_eq!(scope.restore_snapshot, snapshot);
    assert_eq!(scope.reset_branch, branch);
    assert_eq!(scope.remove_worktree, worktree);
}

#[tokio::test]
async fn merging_rollback_restores_files_and_resets_branch() {
    let dir = tempfile::tempdir().unwrap();
    let wu_file = dir.path().join("wu/WU-5.yaml");
    let backlog = dir.path().join("tasks/backlog.md");
    let status = dir.path().join("tasks/status.md");
    for (path, content) in [(&wu_file, "status: in_progress"), (&backlog, "old backlog"), (&status, "old status")] {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    let snapshot =
        FsSnapshot::capture([wu_file.clone(), backlog.clone(), status.clone()]).unwrap();
    std::fs::write(&wu_file, "status: done").unwrap();
    std::fs::write(&backlog, "new backlog").unwrap();
    std::fs::write(&status, "new status").unwrap();

    let git = FakeGitAdapter::new();
    let scratch = dir.path().join("scratch");
    let notes = execute_rollback(
        compute_rollback_scope(Some(Merging)),
        RollbackActions {
            snapshot: Some(&snapshot),
            git: &git,
            repo_root: dir.path(),
            lane_workdir: dir.path(),
            pre_commit_sha: Some("preCommitSha"),
            scratch_worktree: Some(&scratch),
        },
    )
    .await;

    assert!(notes.is_empty());
    // all three snapshotted files are back to their pre-commit bytes
    assert_eq!(std::fs::read_to_string(&wu_file).unwrap(), "status: in_progress");
    assert_eq!(std::fs::read_to_string(&backlog).unwrap(), "old backlog");
    assert_eq!(std::fs::read_to_string(&status).unwrap(), "old status");
    // the lane branch tip was reset to the pre-commit sha
    let raws = git.calls_of("raw");
    assert_eq!(
        raws,
        vec![GitCall::Raw {
            args: vec!["reset".to_string(), "--hard".to_string(), "preCommitSha".to_string()],
        }]
    );
    // the scratch worktree is not touched by a merging rollback
    assert!(git.calls_of("worktree_remove").is_empty());
}

#[tokio::test]
async fn cleaning_up_rollback_only_removes_the_worktree() {
    let dir = tempfile::tempdir().unwrap();
    let git = FakeGitAdapter::new();
    let scratch = PathBuf::from("/tmp/scratch-wu-1");

    let notes = execute_rollback(
        compute_rollback_scope(Some(CleaningUp)),
        RollbackActions {
            snapshot: None,
            git: &git,
            repo_root: dir.path(),
            lane_workdir: dir.path(),
            pre_commit_sha: None,
            scratch_worktree: Some(&scratch),
        },
    )
    .await;

    assert!(notes.is_empty());
    assert_eq!(git.calls_of("worktree_remove").len(), 1);
    assert!(git.calls_of("raw").is_empty());
}

#[tokio::test]
async fn missing_snapshot_is_noted_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let git = FakeGitAdapter::new();

    let notes = execute_rollback(
        compute_rollback_scope(Some(Committing)),
        RollbackActions {
            snapshot: None,
            git: &git,
            repo_root: dir.path(),
            lane_workdir: dir.path(),
            pre_commit_sha: None,
            scratch_worktree: None,
        },
    )
    .await;

    assert_eq!(notes.len(), 1);
    assert!(notes[0].contains("snapshot"));
}

#[tokio::test]
async fn failed_branch_reset_is_noted() {
    let dir = tempfile::tempdir().unwrap();
    let git = FakeGitAdapter::new();
    git.script(
        "raw",
        Err(lf_adapters::GitError::Failed {
            args: "reset --hard preCommitSha".to_string(),
            status: 128,
            stderr: "fatal: bad object".to_string(),
        }),
    );

    let notes = execute_rollback(
        compute_rollback_scope(Some(Pushing)),
        RollbackActions {
            snapshot: None,
            git: &git,
            repo_root: dir.path(),
            lane_workdir: dir.path(),
            pre_commit_sha: Some("preCommitSha"),
            scratch_worktree: None,
        },
    )
    .await;

    assert!(notes.iter().any(|n| n.contains("branch reset")));
}
