// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Multi-file metadata mutations as one unit: snapshot, staged writes,
//! commit-or-restore, and post-mutation verification.
//!
//! The snapshot is held for the duration of the commit and handed back to
//! the caller on success, so a later pipeline stage (merge, push) can still
//! restore the exact pre-commit bytes.

use lf_core::{WuId, WuStatus};
use lf_storage::{load_wu, read_stamp};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, warn};

/// One queued write.
#[derive(Debug, Clone)]
pub struct StagedWrite {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    pub description: String,
}

/// Pre-commit bytes (or absence) of every path a transaction touches.
#[derive(Debug, Clone)]
pub struct FsSnapshot {
    entries: Vec<(PathBuf, Option<Vec<u8>>)>,
}

impl FsSnapshot {
    /// Capture current contents; a missing file is remembered as absent.
    pub fn capture<I>(paths: I) -> std::io::Result<Self>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut entries = Vec::new();
        for path in paths {
            let original = match std::fs::read(&path) {
                Ok(bytes) => Some(bytes),
                // A path whose parent is not a directory is just as absent
                // as a missing file.
                Err(e) if matches!(
                    e.kind(),
                    std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory
                ) =>
                {
                    None
                }
                Err(e) => return Err(e),
            };
            entries.push((path, original));
        }
        Ok(Self { entries })
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|(p, _)| p.as_path())
    }

    /// Original bytes for a path (None = file was absent).
    pub fn original(&self, path: &Path) -> Option<&Option<Vec<u8>>> {
        self.entries.iter().find(|(p, _)| p == path).map(|(_, b)| b)
    }

    /// Put every path back to its captured state. Failures are collected,
    /// logged, and returned; restoration continues past them.
    pub fn restore(&self) -> Result<(), Vec<(PathBuf, String)>> {
        let mut failures = Vec::new();
        for (path, original) in &self.entries {
            let result = match original {
                Some(bytes) => std::fs::write(path, bytes),
                None => match std::fs::remove_file(path) {
                    Err(e) if matches!(
                        e.kind(),
                        std::io::ErrorKind::NotFound | std::io::ErrorKind::NotADirectory
                    ) =>
                    {
                        Ok(())
                    }
                    other => other,
                },
            };
            if let Err(e) = result {
                error!(path = %path.display(), error = %e, "snapshot restore failed");
                failures.push((path.clone(), e.to_string()));
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures)
        }
    }
}

/// A commit that wrote everything; carries the snapshot for later rollback.
#[derive(Debug)]
pub struct CommitReceipt {
    pub written: Vec<PathBuf>,
    pub snapshot: FsSnapshot,
}

/// A commit that failed partway; the snapshot has been restored.
#[derive(Debug, Error)]
#[error("transaction failed on {}: {}", .failed.iter().map(|(p, _)| p.display().to_string()).collect::<Vec<_>>().join(", "), .failed.iter().map(|(_, e)| e.as_str()).collect::<Vec<_>>().join("; "))]
pub struct TransactionFailure {
    pub failed: Vec<(PathBuf, String)>,
    /// Whether the snapshot restore itself succeeded.
    pub restored: bool,
}

/// What the transaction is trying to establish; drives validation.
#[derive(Debug, Clone)]
pub struct CommitIntent {
    pub wu_id: WuId,
    pub status: WuStatus,
    pub wu_path: PathBuf,
    pub backlog_path: Option<PathBuf>,
    pub stamp_path: Option<PathBuf>,
}

/// An ephemeral batch of pending metadata writes.
#[derive(Debug)]
pub struct Transaction {
    wu_id: Option<WuId>,
    writes: Vec<StagedWrite>,
}

impl Transaction {
    pub fn new(wu_id: WuId) -> Self {
        Self {
            wu_id: Some(wu_id),
            writes: Vec::new(),
        }
    }

    /// A transaction not tied to a single WU (projection-only refreshes).
    pub fn anonymous() -> Self {
        Self {
            wu_id: None,
            writes: Vec::new(),
        }
    }

    pub fn wu_id(&self) -> Option<WuId> {
        self.wu_id
    }

    /// Queue a pending write.
    pub fn stage(
        &mut self,
        path: impl Into<PathBuf>,
        bytes: impl Into<Vec<u8>>,
        description: impl Into<String>,
    ) {
        self.writes.push(StagedWrite {
            path: path.into(),
            bytes: bytes.into(),
            description: description.into(),
        });
    }

    pub fn writes(&self) -> &[StagedWrite] {
        &self.writes
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    /// Semantic preconditions on the staged bytes, before anything lands.
    pub fn validate(&self, intent: &CommitIntent) -> Vec<String> {
        let mut problems = Vec::new();

        match self.staged_for(&intent.wu_path) {
            Some(bytes) => match parse_wu(bytes) {
                Ok(wu) => {
                    if wu.id != intent.wu_id {
                        problems.push(format!(
                            "staged WU file declares {}, expected {}",
                            wu.id, intent.wu_id
                        ));
                    }
                    if wu.status != intent.status {
                        problems.push(format!(
                            "staged WU status is {}, intent is {}",
                            wu.status, intent.status
                        ));
                    }
                }
                Err(e) => problems.push(format!("staged WU file does not parse: {e}")),
            },
            None => problems.push("transaction does not stage the WU file".to_string()),
        }

        if let Some(backlog_path) = &intent.backlog_path {
            match self.staged_for(backlog_path) {
                Some(bytes) => {
                    let text = String::from_utf8_lossy(bytes);
                    for heading in ["## Ready", "## In Progress", "## Blocked", "## Done"] {
                        if !text.contains(heading) {
                            problems.push(format!("staged backlog is missing `{heading}`"));
                        }
                    }
                }
                None => problems.push("transaction does not stage the backlog".to_string()),
            }
        }

        if let Some(stamp_path) = &intent.stamp_path {
            match self.staged_for(stamp_path) {
                Some(bytes) => match serde_yaml::from_slice::<StampHead>(bytes) {
                    Ok(stamp) => {
                        if stamp.id != intent.wu_id {
                            problems.push(format!(
                                "staged stamp declares {}, expected {}",
                                stamp.id, intent.wu_id
                            ));
                        }
                    }
                    Err(e) => problems.push(format!("staged stamp does not parse: {e}")),
                },
                None => problems.push("transaction does not stage the stamp".to_string()),
            }
        }

        problems
    }

    /// Snapshot every target, then write all pending files. On any write
    /// failure the snapshot is restored and the failure returned.
    pub fn commit(self) -> Result<CommitReceipt, TransactionFailure> {
        let snapshot = match FsSnapshot::capture(self.writes.iter().map(|w| w.path.clone())) {
            Ok(s) => s,
            Err(e) => {
                return Err(TransactionFailure {
                    failed: vec![(PathBuf::from("<snapshot>"), e.to_string())],
                    restored: true,
                })
            }
        };

        let mut written = Vec::new();
        let mut failed = Vec::new();

        // Every pending write is attempted so the failure report names all
        // of the paths that need attention, not just the first.
        for write in &self.writes {
            if let Some(parent) = write.path.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    warn!(
                        path = %write.path.display(),
                        what = %write.description,
                        error = %e,
                        "staged write failed",
                    );
                    failed.push((write.path.clone(), e.to_string()));
                    continue;
                }
            }
            match std::fs::write(&write.path, &write.bytes) {
                Ok(()) => written.push(write.path.clone()),
                Err(e) => {
                    warn!(
                        path = %write.path.display(),
                        what = %write.description,
                        error = %e,
                        "staged write failed",
                    );
                    failed.push((write.path.clone(), e.to_string()));
                }
            }
        }

        if failed.is_empty() {
            Ok(CommitReceipt { written, snapshot })
        } else {
            warn!(failures = failed.len(), "transaction failed, restoring snapshot");
            let restored = snapshot.restore().is_ok();
            Err(TransactionFailure { failed, restored })
        }
    }

    fn staged_for(&self, path: &Path) -> Option<&[u8]> {
        self.writes
            .iter()
            .rev()
            .find(|w| w.path == path)
            .map(|w| w.bytes.as_slice())
    }
}

#[derive(Deserialize)]
struct StampHead {
    id: WuId,
}

fn parse_wu(bytes: &[u8]) -> Result<lf_core::WorkUnit, serde_yaml::Error> {
    serde_yaml::from_slice(bytes)
}

/// Post-mutation invariants, read back from disk after a commit: the WU
/// file parses with the intended status, and the stamp (when intended)
/// exists and parses. The completion-event invariant is the pipeline's to
/// check, since the event lands after the merge succeeds.
pub fn verify_post_commit(intent: &CommitIntent) -> Vec<String> {
    let mut problems = Vec::new();

    match load_wu(&intent.wu_path) {
        Ok(wu) => {
            if wu.status != intent.status {
                problems.push(format!(
                    "{} is `{}` on disk, expected `{}`",
                    intent.wu_id, wu.status, intent.status
                ));
            }
        }
        Err(e) => problems.push(format!("WU file unreadable after commit: {e}")),
    }

    if let Some(stamp_path) = &intent.stamp_path {
        match read_stamp(stamp_path) {
            Ok(stamp) => {
                if stamp.id != intent.wu_id {
                    problems.push(format!(
                        "stamp declares {}, expected {}",
                        stamp.id, intent.wu_id
                    ));
                }
            }
            Err(e) => problems.push(format!("stamp unreadable after commit: {e}")),
        }
    }

    problems
}

#[cfg(test)]
#[path = "transaction_tests.rs"]
mod tests;
