// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The closed error taxonomy of the engine.
//!
//! Every kind carries structured context and maps to an actionable message:
//! `error_kind()` is the stable wire name, `next_steps()` is what a human
//! (or an agent) should do about it.

use lf_adapters::GitError;
use lf_core::{WuId, WuStatus};
use lf_storage::{EventLogError, SpawnRegistryError, StampError, StoreError, WuFileError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in engine operations
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("validation failed: {}", .problems.join("; "))]
    Validation {
        wu_id: Option<WuId>,
        problems: Vec<String>,
    },

    #[error("illegal transition for {wu_id}: {from} → {to}")]
    StateTransition {
        wu_id: WuId,
        from: WuStatus,
        to: WuStatus,
    },

    #[error("lock busy on {resource}")]
    LockBusy {
        resource: String,
        held_by: Option<WuId>,
    },

    #[error("merge of {branch} could not complete: {detail}")]
    MergeConflict { branch: String, detail: String },

    #[error("merge retries exhausted after {attempts} attempts on {branch}")]
    RetryExhaustion { branch: String, attempts: u32 },

    #[error("transaction failed (snapshot restored: {restored}); failed: {}", .failed.join(", "))]
    Transaction { failed: Vec<String>, restored: bool },

    #[error("rollback action `{action}` failed: {detail}")]
    Rollback { action: String, detail: String },

    #[error("{wu_id} has failed completion {attempts} time(s) (max {max}); manual intervention required")]
    RecoveryExhaustion {
        wu_id: WuId,
        attempts: u32,
        max: u32,
    },

    #[error("network failure during {operation}: {detail}")]
    Network { operation: String, detail: String },

    #[error("{wu_id} is done but its worktree still exists at {}", .worktree.display())]
    Zombie { wu_id: WuId, worktree: PathBuf },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    WuFile(#[from] WuFileError),

    #[error(transparent)]
    Stamp(#[from] StampError),

    #[error(transparent)]
    SpawnRegistry(#[from] SpawnRegistryError),

    #[error(transparent)]
    EventLog(#[from] EventLogError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Stable kind name for JSON output.
    pub fn error_kind(&self) -> &'static str {
        match self {
            EngineError::Validation { .. } => "validation_error",
            EngineError::StateTransition { .. } => "state_transition",
            EngineError::Store(StoreError::IllegalTransition { .. }) => "state_transition",
            EngineError::LockBusy { .. } => "lock_busy",
            EngineError::MergeConflict { .. } => "merge_conflict",
            EngineError::RetryExhaustion { .. } => "retry_exhaustion",
            EngineError::Transaction { .. } => "transaction",
            EngineError::Rollback { .. } => "rollback",
            EngineError::RecoveryExhaustion { .. } => "recovery_exhaustion",
            EngineError::Network { .. } => "network",
            EngineError::Zombie { .. } => "zombie",
            EngineError::WuFile(_) | EngineError::Stamp(_) => "validation_error",
            EngineError::Store(_) | EngineError::SpawnRegistry(_) | EngineError::EventLog(_) => {
                "io"
            }
            EngineError::Git(e) if e.is_network() => "network",
            EngineError::Git(_) | EngineError::Io(_) => "io",
        }
    }

    /// Actionable guidance for the caller.
    pub fn next_steps(&self) -> Vec<String> {
        match self {
            EngineError::Validation { wu_id, .. } => match wu_id {
                Some(id) => vec![
                    format!("edit wu/{id}.yaml to fix the listed problems"),
                    format!("re-check with `lf wu validate --id {id}`"),
                ],
                None => vec!["fix the listed problems and re-run".to_string()],
            },
            EngineError::StateTransition { wu_id, from, .. }
            | EngineError::Store(StoreError::IllegalTransition { wu_id, from, .. }) => vec![
                format!("{wu_id} is currently `{from}`"),
                "run `lf wu validate` to see which operations are legal".to_string(),
            ],
            EngineError::LockBusy { resource, .. } => vec![
                format!("another session holds `{resource}`; retry shortly"),
                "inspect leases with `lf state doctor`".to_string(),
            ],
            EngineError::MergeConflict { branch, .. } => vec![
                format!("resolve the conflict on `{branch}` in its worktree"),
                "re-run `lf wu done` once the branch rebases cleanly".to_string(),
            ],
            EngineError::RetryExhaustion { .. } => vec![
                "peers kept updating the trunk; re-run `lf wu done` when the repo is quieter"
                    .to_string(),
            ],
            EngineError::Transaction { failed, .. } => vec![
                format!("inspect the failed path(s): {}", failed.join(", ")),
                "the snapshot was restored; no partial metadata was left behind".to_string(),
            ],
            EngineError::Rollback { .. } => vec![
                "a rollback step failed; the original error above still stands".to_string(),
                "run `lf state doctor` and repair manually before retrying".to_string(),
            ],
            EngineError::RecoveryExhaustion { wu_id, .. } => vec![
                format!(
                    "manual intervention required: inspect the lane branch and .lumenflow/state/recovery/{wu_id}.recovery"
                ),
                format!("after repairing, run `lf wu recover --id {wu_id} --force`"),
            ],
            EngineError::Network { .. } => vec![
                "check connectivity to the git remote".to_string(),
                "read-only preconditions fail open; pushes never do".to_string(),
            ],
            EngineError::Zombie { wu_id, worktree } => vec![
                format!("{wu_id} completed but {} was left behind", worktree.display()),
                "remove the worktree (or run `lf state doctor`) before retrying".to_string(),
            ],
            EngineError::Git(e) if e.is_network() => vec![
                "check connectivity to the git remote".to_string(),
            ],
            _ => vec!["see the error message; `lf state doctor` reports overall health".to_string()],
        }
    }

    /// Structured context for JSON error output.
    pub fn context(&self) -> serde_json::Value {
        match self {
            EngineError::Validation { wu_id, problems } => serde_json::json!({
                "wu_id": wu_id.map(|id| id.to_string()),
                "problems": problems,
            }),
            EngineError::StateTransition { wu_id, from, to } => serde_json::json!({
                "wu_id": wu_id.to_string(), "from": from.to_string(), "to": to.to_string(),
            }),
            EngineError::LockBusy { resource, held_by } => serde_json::json!({
                "resource": resource, "held_by": held_by.map(|id| id.to_string()),
            }),
            EngineError::MergeConflict { branch, detail } => serde_json::json!({
                "branch": branch, "detail": detail,
            }),
            EngineError::RetryExhaustion { branch, attempts } => serde_json::json!({
                "branch": branch, "attempts": attempts,
            }),
            EngineError::Transaction { failed, restored } => serde_json::json!({
                "failed": failed, "restored": restored,
            }),
            EngineError::RecoveryExhaustion { wu_id, attempts, max } => serde_json::json!({
                "wu_id": wu_id.to_string(), "attempts": attempts, "max": max,
            }),
            EngineError::Zombie { wu_id, worktree } => serde_json::json!({
                "wu_id": wu_id.to_string(), "worktree": worktree.display().to_string(),
            }),
            _ => serde_json::json!({}),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
