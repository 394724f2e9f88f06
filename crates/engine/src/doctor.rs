// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State doctor: read-only integrity checks across the store, WU files,
//! projections, locks, and recovery markers. Flags, never repairs.

use crate::context::EngineCtx;
use crate::error::EngineError;
use crate::lock::LockManager;
use lf_core::{ClaimMode, WuId, WuStatus};
use lf_storage::{check_consistency, list_wu_files, load_wu, EventStore};
use serde::Serialize;

/// What kind of problem a finding reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// In-progress worktree claim whose directory is gone.
    MissingWorktree,
    /// Done WU whose worktree directory still exists.
    ZombieDone,
    /// Backlog document disagrees with the store.
    BacklogDrift,
    StaleLock,
    ZombieLock,
    /// A WU has recorded failed completion attempts.
    RecoveryMarker,
    /// Done WU without a parseable completion stamp.
    MissingStamp,
    WuFileIssue,
}

/// One doctor finding.
#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub kind: FindingKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wu_id: Option<WuId>,
    pub message: String,
}

/// Full doctor report.
#[derive(Debug, Default, Serialize)]
pub struct DoctorReport {
    pub findings: Vec<Finding>,
}

impl DoctorReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    fn push(&mut self, kind: FindingKind, wu_id: Option<WuId>, message: impl Into<String>) {
        self.findings.push(Finding {
            kind,
            wu_id,
            message: message.into(),
        });
    }
}

/// Run every check. Tolerates a missing backlog (reported) and a corrupt
/// trailing event-log line (already skipped by the store load).
pub fn run_doctor(
    ctx: &EngineCtx,
    store: &EventStore,
    locks: &LockManager,
) -> Result<DoctorReport, EngineError> {
    let mut report = DoctorReport::default();

    // Worktree invariants per WU
    for id in store.state().ids() {
        let Some(state) = store.get_state(id) else { continue };
        let worktree_exists = state
            .worktree_path
            .as_ref()
            .map(|p| p.is_dir())
            .unwrap_or(false);

        match state.status {
            WuStatus::InProgress => {
                let is_worktree_claim = matches!(
                    state.claimed_mode,
                    Some(ClaimMode::Worktree) | Some(ClaimMode::MicroWorktree)
                );
                if is_worktree_claim && !worktree_exists {
                    report.push(
                        FindingKind::MissingWorktree,
                        Some(id),
                        format!(
                            "{id} is in progress in a worktree that no longer exists ({})",
                            state
                                .worktree_path
                                .as_ref()
                                .map(|p| p.display().to_string())
                                .unwrap_or_else(|| "unknown path".to_string())
                        ),
                    );
                }
            }
            WuStatus::Done => {
                if worktree_exists {
                    report.push(
                        FindingKind::ZombieDone,
                        Some(id),
                        format!("{id} is done but its worktree still exists"),
                    );
                }
                if lf_storage::read_stamp(&ctx.paths.stamp_path(id)).is_err() {
                    report.push(
                        FindingKind::MissingStamp,
                        Some(id),
                        format!("{id} is done but has no readable completion stamp"),
                    );
                }
            }
            _ => {}
        }
    }

    // Backlog consistency
    match std::fs::read_to_string(ctx.paths.backlog_path()) {
        Ok(document) => {
            for issue in check_consistency(&document, store.state()) {
                report.push(
                    FindingKind::BacklogDrift,
                    Some(issue.wu_id),
                    format!(
                        "{} expected in {:?}, found in {:?}",
                        issue.wu_id, issue.expected_section, issue.found_section
                    ),
                );
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if !store.state().is_empty() {
                report.push(FindingKind::BacklogDrift, None, "backlog.md is missing");
            }
        }
        Err(e) => return Err(e.into()),
    }

    // Lock inventory
    for (name, info) in locks.inventory()? {
        if info.is_stale {
            report.push(
                FindingKind::StaleLock,
                Some(info.wu_id),
                format!("lock `{name}` held by {} is stale (since {})", info.wu_id, info.since),
            );
        } else if info.is_zombie {
            report.push(
                FindingKind::ZombieLock,
                Some(info.wu_id),
                format!("lock `{name}` held by {} points at a dead pid {}", info.wu_id, info.pid),
            );
        }
    }

    // Recovery markers
    let recovery_dir = ctx.paths.recovery_dir();
    if let Ok(entries) = std::fs::read_dir(&recovery_dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Ok(id) = stem.parse::<WuId>() {
                let attempts = crate::recovery::read_attempts(ctx, id);
                if attempts > 0 {
                    report.push(
                        FindingKind::RecoveryMarker,
                        Some(id),
                        format!("{id} has {attempts} recorded failed completion attempt(s)"),
                    );
                }
            }
        }
    }

    // WU file sweep
    for (id, path) in list_wu_files(&ctx.paths.wu_dir())? {
        match load_wu(&path) {
            Ok(wu) => {
                for problem in wu.validate() {
                    report.push(FindingKind::WuFileIssue, Some(id), problem);
                }
            }
            Err(e) => report.push(FindingKind::WuFileIssue, Some(id), e.to_string()),
        }
    }

    Ok(report)
}

#[cfg(test)]
#[path = "doctor_tests.rs"]
mod tests;
