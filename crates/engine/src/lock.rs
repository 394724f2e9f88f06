// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-based lock manager: mutual exclusion between cooperating processes
//! with the filesystem as the arbitration medium.
//!
//! One lease is one JSON file under the lock directory. Acquisition relies
//! on exclusive-create being atomic; stale and zombie leases are reclaimed
//! in a bounded loop so a crashed peer can never wedge a lane forever. The
//! lock directory lives outside every worktree so a lease can never end up
//! on a branch.

use crate::env::stale_lock_threshold;
use crate::error::EngineError;
use chrono::{DateTime, Duration, Utc};
use lf_core::{lane_slug, Clock, LockId, LockPolicy, SystemClock, WuId};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Coarse polling interval while waiting on a busy lock.
const POLL_INTERVAL_MS: u64 = 100;

/// Jitter added to each poll so peers do not retry in lockstep.
const POLL_JITTER_MS: u64 = 50;

/// A lockable resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockResource {
    /// A lane, locked during claim under the lane's policy.
    Lane(String),
    /// The global merge lock serializing merge pipelines.
    Merge,
    /// The cleanup lock serializing worktree/branch garbage collection.
    Cleanup,
}

impl LockResource {
    pub fn lane(name: impl Into<String>) -> Self {
        LockResource::Lane(name.into())
    }

    /// File name of the lease under the lock directory.
    pub fn file_name(&self) -> String {
        match self {
            LockResource::Lane(lane) => format!("{}.lock", lane_slug(lane)),
            LockResource::Merge => "merge.lock".to_string(),
            LockResource::Cleanup => "cleanup.lock".to_string(),
        }
    }

    /// Human-readable name.
    pub fn name(&self) -> String {
        match self {
            LockResource::Lane(lane) => lane.clone(),
            LockResource::Merge => "merge".to_string(),
            LockResource::Cleanup => "cleanup".to_string(),
        }
    }
}

/// On-disk lease record (pretty-printed JSON).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockRecord {
    pub wu_id: WuId,
    pub lock_id: LockId,
    pub created_at: DateTime<Utc>,
    pub pid: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lane: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worktree_path: Option<PathBuf>,
}

/// Why an existing lease was reclaimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReclaimReason {
    /// Lease older than the stale threshold (or unreadable).
    Stale,
    /// Holder process no longer exists.
    Zombie,
}

impl std::fmt::Display for ReclaimReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReclaimReason::Stale => write!(f, "stale"),
            ReclaimReason::Zombie => write!(f, "zombie"),
        }
    }
}

/// Why an acquire came back busy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyReason {
    /// A live peer holds the lease.
    Held,
    /// An unexpected filesystem error; treated as busy, never as acquired.
    Io,
}

/// Outcome of an acquire.
#[derive(Debug, Clone, PartialEq)]
pub enum Acquire {
    Acquired {
        lock_id: LockId,
        /// Set when a stale/zombie lease was reclaimed on the way in.
        reclaimed: Option<ReclaimReason>,
        /// True when the caller already held the lease (same `wu_id`).
        reacquired: bool,
    },
    Busy {
        held_by: Option<WuId>,
        reason: BusyReason,
    },
    Skipped {
        policy: LockPolicy,
    },
}

impl Acquire {
    pub fn is_acquired(&self) -> bool {
        matches!(self, Acquire::Acquired { .. })
    }

    /// The lock id when acquired.
    pub fn lock_id(&self) -> Option<&LockId> {
        match self {
            Acquire::Acquired { lock_id, .. } => Some(lock_id),
            _ => None,
        }
    }
}

/// Outcome of a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Release {
    Released,
    NotHeld,
    Denied { holder: WuId },
}

/// Observation of a lease without touching it.
#[derive(Debug, Clone, PartialEq)]
pub struct LockInfo {
    pub wu_id: WuId,
    pub lock_id: LockId,
    pub since: DateTime<Utc>,
    pub pid: u32,
    pub is_stale: bool,
    pub is_zombie: bool,
}

/// Errors from `audited_release`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuditError {
    #[error("audited release requires a non-empty reason")]
    EmptyReason,
    #[error("lock is actively held by {holder}; pass force to break it")]
    ActiveLease { holder: WuId },
}

/// Options for an acquire.
#[derive(Debug, Clone, Default)]
pub struct AcquireOpts {
    /// Wait budget; `None` means a single attempt.
    pub wait: Option<std::time::Duration>,
    /// Lane policy; `none` skips lane locks entirely.
    pub policy: LockPolicy,
    /// Recorded in the lease for `peek`/doctor.
    pub lane: Option<String>,
    pub worktree_path: Option<PathBuf>,
}

/// File-based lease manager.
pub struct LockManager {
    dir: PathBuf,
    clock: Arc<dyn Clock>,
    stale_threshold: Duration,
}

impl LockManager {
    /// Manager over `dir` with the wall clock and the env-resolved stale
    /// threshold.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            clock: Arc::new(SystemClock),
            stale_threshold: stale_lock_threshold(),
        }
    }

    pub fn with_clock(dir: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            dir: dir.into(),
            clock,
            stale_threshold: stale_lock_threshold(),
        }
    }

    pub fn with_stale_threshold(mut self, threshold: Duration) -> Self {
        self.stale_threshold = threshold;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Acquire with an optional wait budget. Polls at a coarse interval
    /// with jitter; never holds the lock while waiting.
    pub async fn acquire(
        &self,
        resource: &LockResource,
        wu_id: WuId,
        opts: &AcquireOpts,
    ) -> Acquire {
        let deadline = opts.wait.map(|budget| std::time::Instant::now() + budget);

        loop {
            let outcome = self.try_acquire(resource, wu_id, opts);
            let retry = match (&outcome, deadline) {
                (
                    Acquire::Busy {
                        reason: BusyReason::Held,
                        ..
                    },
                    Some(deadline),
                ) => std::time::Instant::now() < deadline,
                _ => false,
            };
            if !retry {
                return outcome;
            }
            let jitter = rand::rng().random_range(0..POLL_JITTER_MS);
            tokio::time::sleep(std::time::Duration::from_millis(POLL_INTERVAL_MS + jitter)).await;
        }
    }

    /// Single acquisition attempt (plus at most one retry after a reclaim).
    pub fn try_acquire(&self, resource: &LockResource, wu_id: WuId, opts: &AcquireOpts) -> Acquire {
        if matches!(resource, LockResource::Lane(_)) && opts.policy == LockPolicy::None {
            return Acquire::Skipped {
                policy: LockPolicy::None,
            };
        }

        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            warn!(dir = %self.dir.display(), error = %e, "cannot create lock dir");
            return Acquire::Busy {
                held_by: None,
                reason: BusyReason::Io,
            };
        }

        let path = self.dir.join(resource.file_name());
        let mut reclaimed: Option<ReclaimReason> = None;

        // Bounded: the initial attempt plus one retry after a reclaim.
        for _attempt in 0..2 {
            match self.create_new(&path, wu_id, opts) {
                Ok(lock_id) => {
                    return Acquire::Acquired {
                        lock_id,
                        reclaimed,
                        reacquired: false,
                    };
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                    match self.read_record(&path) {
                        Some(record) => {
                            if record.wu_id == wu_id {
                                // Idempotent re-acquire: same holder, same lease.
                                return Acquire::Acquired {
                                    lock_id: record.lock_id,
                                    reclaimed: None,
                                    reacquired: true,
                                };
                            }
                            if let Some(reason) = self.reclaim_reason(&record) {
                                warn!(
                                    resource = %resource.name(),
                                    held_by = %record.wu_id,
                                    pid = record.pid,
                                    reason = %reason,
                                    "reclaiming lock",
                                );
                                let _ = std::fs::remove_file(&path);
                                reclaimed = Some(reason);
                                continue;
                            }
                            return Acquire::Busy {
                                held_by: Some(record.wu_id),
                                reason: BusyReason::Held,
                            };
                        }
                        None => {
                            // Unreadable lease: treated as stale.
                            warn!(
                                resource = %resource.name(),
                                reason = %ReclaimReason::Stale,
                                "reclaiming unreadable lock",
                            );
                            let _ = std::fs::remove_file(&path);
                            reclaimed = Some(ReclaimReason::Stale);
                            continue;
                        }
                    }
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "lock create failed");
                    return Acquire::Busy {
                        held_by: None,
                        reason: BusyReason::Io,
                    };
                }
            }
        }

        // Both attempts lost the reclaim race to a peer.
        Acquire::Busy {
            held_by: None,
            reason: BusyReason::Held,
        }
    }

    /// Release a lease; only the holder of `lock_id` may delete it.
    pub fn release(&self, resource: &LockResource, lock_id: &LockId) -> Release {
        let path = self.dir.join(resource.file_name());
        let Some(record) = self.read_record(&path) else {
            return Release::NotHeld;
        };
        if record.lock_id != *lock_id {
            return Release::Denied {
                holder: record.wu_id,
            };
        }
        if let Err(e) = std::fs::remove_file(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "lock remove failed");
            }
        }
        Release::Released
    }

    /// Release a lease held on behalf of `wu_id` (cross-process release,
    /// used by block/release flows that never saw the original lock id).
    pub fn release_for_wu(&self, resource: &LockResource, wu_id: WuId) -> Release {
        let path = self.dir.join(resource.file_name());
        let Some(record) = self.read_record(&path) else {
            return Release::NotHeld;
        };
        if record.wu_id != wu_id {
            return Release::Denied {
                holder: record.wu_id,
            };
        }
        if let Err(e) = std::fs::remove_file(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "lock remove failed");
            }
        }
        Release::Released
    }

    /// Observe a lease without mutating it.
    pub fn peek(&self, resource: &LockResource) -> Option<LockInfo> {
        let path = self.dir.join(resource.file_name());
        let record = self.read_record(&path)?;
        Some(LockInfo {
            is_stale: self.is_stale(&record),
            is_zombie: is_zombie(&record),
            wu_id: record.wu_id,
            lock_id: record.lock_id,
            since: record.created_at,
            pid: record.pid,
        })
    }

    /// Break a lease with an audit trail. Refuses to break an active
    /// (non-stale, non-zombie) lease unless `force` is set.
    pub fn audited_release(
        &self,
        resource: &LockResource,
        reason: &str,
        force: bool,
    ) -> Result<Release, AuditError> {
        if reason.trim().is_empty() {
            return Err(AuditError::EmptyReason);
        }
        let path = self.dir.join(resource.file_name());
        let Some(record) = self.read_record(&path) else {
            return Ok(Release::NotHeld);
        };

        let reclaimable = self.reclaim_reason(&record).is_some();
        if !reclaimable && !force {
            return Err(AuditError::ActiveLease {
                holder: record.wu_id,
            });
        }

        info!(
            resource = %resource.name(),
            held_by = %record.wu_id,
            forced = force,
            reason,
            "audited lock release",
        );
        if let Err(e) = std::fs::remove_file(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), error = %e, "lock remove failed");
            }
        }
        Ok(Release::Released)
    }

    /// All leases currently on disk, for doctor output.
    pub fn inventory(&self) -> Result<Vec<(String, LockInfo)>, EngineError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut found = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("lock") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if let Some(record) = self.read_record(&path) {
                found.push((
                    name.to_string(),
                    LockInfo {
                        is_stale: self.is_stale(&record),
                        is_zombie: is_zombie(&record),
                        wu_id: record.wu_id,
                        lock_id: record.lock_id,
                        since: record.created_at,
                        pid: record.pid,
                    },
                ));
            }
        }
        found.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(found)
    }

    fn create_new(
        &self,
        path: &Path,
        wu_id: WuId,
        opts: &AcquireOpts,
    ) -> std::io::Result<LockId> {
        use std::io::Write;

        let record = LockRecord {
            wu_id,
            lock_id: LockId::new(uuid::Uuid::new_v4().to_string()),
            created_at: self.clock.now_utc(),
            pid: std::process::id(),
            lane: opts.lane.clone(),
            worktree_path: opts.worktree_path.clone(),
        };
        let body = serde_json::to_string_pretty(&record)
            .map_err(|e| std::io::Error::other(e.to_string()))?;

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)?;
        file.write_all(body.as_bytes())?;
        Ok(record.lock_id)
    }

    fn read_record(&self, path: &Path) -> Option<LockRecord> {
        let content = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }

    fn is_stale(&self, record: &LockRecord) -> bool {
        self.clock.now_utc() - record.created_at > self.stale_threshold
    }

    fn reclaim_reason(&self, record: &LockRecord) -> Option<ReclaimReason> {
        if self.is_stale(record) {
            Some(ReclaimReason::Stale)
        } else if is_zombie(record) {
            Some(ReclaimReason::Zombie)
        } else {
            None
        }
    }
}

/// Permission-less probe: does the recorded PID exist on this host?
fn is_zombie(record: &LockRecord) -> bool {
    !pid_alive(record.pid)
}

fn pid_alive(pid: u32) -> bool {
    let Ok(pid) = i32::try_from(pid) else {
        return false;
    };
    nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid), None).is_ok()
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
