// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Rollback scope: one pure function of where the pipeline failed, and a
//! dumb executor of its verdict.
//!
//! Everything that undoes pipeline side effects goes through here; no other
//! module decides what rollback means.

use crate::pipeline::PipelineState;
use crate::transaction::FsSnapshot;
use lf_adapters::GitAdapter;
use std::path::Path;
use tracing::{error, info};

/// What a rollback must undo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RollbackScope {
    /// Restore every snapshotted metadata file to its pre-commit bytes.
    pub restore_snapshot: bool,
    /// Reset the lane branch tip to the pre-commit SHA.
    pub reset_branch: bool,
    /// Remove the scratch worktree.
    pub remove_worktree: bool,
}

impl RollbackScope {
    pub fn is_empty(&self) -> bool {
        !(self.restore_snapshot || self.reset_branch || self.remove_worktree)
    }
}

/// The single source of rollback truth.
///
/// | failed at                          | snapshot | branch | worktree |
/// |------------------------------------|----------|--------|----------|
/// | none / validating / gating / preparing | no   | no     | no       |
/// | committing                         | yes      | no     | no       |
/// | merging / pushing                  | yes      | yes    | no       |
/// | cleaning up                        | no       | no     | yes      |
pub fn compute_rollback_scope(failed_at: Option<PipelineState>) -> RollbackScope {
    match failed_at {
        None
        | Some(PipelineState::Validating)
        | Some(PipelineState::Gating)
        | Some(PipelineState::Preparing) => RollbackScope::default(),
        Some(PipelineState::Committing) => RollbackScope {
            restore_snapshot: true,
            ..Default::default()
        },
        Some(PipelineState::Merging) | Some(PipelineState::Pushing) => RollbackScope {
            restore_snapshot: true,
            reset_branch: true,
            remove_worktree: false,
        },
        Some(PipelineState::CleaningUp) => RollbackScope {
            remove_worktree: true,
            ..Default::default()
        },
    }
}

/// Everything the executor may need; absent pieces skip their action.
pub struct RollbackActions<'a> {
    pub snapshot: Option<&'a FsSnapshot>,
    pub git: &'a dyn GitAdapter,
    pub repo_root: &'a Path,
    /// Workdir whose branch tip gets reset (the lane worktree).
    pub lane_workdir: &'a Path,
    pub pre_commit_sha: Option<&'a str>,
    pub scratch_worktree: Option<&'a Path>,
}

/// Execute a scope. Errors are logged and returned as notes; they must
/// never mask the original pipeline error.
pub async fn execute_rollback(scope: RollbackScope, actions: RollbackActions<'_>) -> Vec<String> {
    let mut notes = Vec::new();

    if scope.restore_snapshot {
        match actions.snapshot {
            Some(snapshot) => {
                if let Err(failures) = snapshot.restore() {
                    for (path, message) in failures {
                        let note = format!("restore {} failed: {message}", path.display());
                        error!("{note}");
                        notes.push(note);
                    }
                } else {
                    info!("rollback: snapshot restored");
                }
            }
            None => notes.push("rollback wanted a snapshot restore but none was taken".to_string()),
        }
    }

    if scope.reset_branch {
        match actions.pre_commit_sha {
            Some(sha) => {
                let args = vec!["reset".to_string(), "--hard".to_string(), sha.to_string()];
                match actions.git.raw(actions.lane_workdir, &args).await {
                    Ok(_) => info!(sha, "rollback: lane branch reset"),
                    Err(e) => {
                        let note = format!("branch reset to {sha} failed: {e}");
                        error!("{note}");
                        notes.push(note);
                    }
                }
            }
            None => notes.push("rollback wanted a branch reset but no pre-commit sha".to_string()),
        }
    }

    if scope.remove_worktree {
        if let Some(path) = actions.scratch_worktree {
            match actions.git.worktree_remove(actions.repo_root, path).await {
                Ok(()) => info!(path = %path.display(), "rollback: scratch worktree removed"),
                Err(e) => {
                    let note = format!("scratch worktree removal failed: {e}");
                    error!("{note}");
                    notes.push(note);
                }
            }
        }
    }

    notes
}

#[cfg(test)]
#[path = "rollback_tests.rs"]
mod tests;
