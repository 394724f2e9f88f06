// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine-owned filesystem layout, threaded explicitly through operations.
//!
//! One `LfPaths` per repository root replaces ambient globals: every
//! component receives it and derives its own paths. The lock directory is
//! the one deliberate exception to repo-rooting — it lives under the system
//! temp directory so a lease file can never pollute a branch.

use crate::id::WuId;
use crate::lane::lane_slug;
use std::path::{Path, PathBuf};

/// Environment override for the lock directory.
pub const LOCK_DIR_ENV: &str = "LUMENFLOW_LOCK_DIR";

/// Filesystem layout rooted at a repository checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LfPaths {
    root: PathBuf,
}

impl LfPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Walk upward from `start` looking for a `.lumenflow` directory.
    pub fn discover(start: &Path) -> Option<Self> {
        let mut dir = Some(start);
        while let Some(d) = dir {
            if d.join(".lumenflow").is_dir() {
                return Some(Self::new(d));
            }
            dir = d.parent();
        }
        None
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn dot_dir(&self) -> PathBuf {
        self.root.join(".lumenflow")
    }

    pub fn config_path(&self) -> PathBuf {
        self.dot_dir().join("config.toml")
    }

    pub fn state_dir(&self) -> PathBuf {
        self.dot_dir().join("state")
    }

    pub fn events_path(&self) -> PathBuf {
        self.state_dir().join("wu-events.jsonl")
    }

    pub fn spawn_registry_path(&self) -> PathBuf {
        self.state_dir().join("spawn-registry.jsonl")
    }

    pub fn stamps_dir(&self) -> PathBuf {
        self.state_dir().join("stamps")
    }

    pub fn stamp_path(&self, id: WuId) -> PathBuf {
        self.stamps_dir().join(format!("{id}.done"))
    }

    pub fn recovery_dir(&self) -> PathBuf {
        self.state_dir().join("recovery")
    }

    pub fn recovery_marker_path(&self, id: WuId) -> PathBuf {
        self.recovery_dir().join(format!("{id}.recovery"))
    }

    pub fn wu_dir(&self) -> PathBuf {
        self.root.join("wu")
    }

    pub fn wu_path(&self, id: WuId) -> PathBuf {
        self.wu_dir().join(format!("{id}.yaml"))
    }

    pub fn tasks_dir(&self) -> PathBuf {
        self.root.join("tasks")
    }

    pub fn backlog_path(&self) -> PathBuf {
        self.tasks_dir().join("backlog.md")
    }

    pub fn status_path(&self) -> PathBuf {
        self.tasks_dir().join("status.md")
    }

    pub fn initiatives_dir(&self) -> PathBuf {
        self.tasks_dir().join("initiatives")
    }

    pub fn initiative_path(&self, name: &str) -> PathBuf {
        self.initiatives_dir().join(format!("{}.yaml", lane_slug(name)))
    }

    /// Lane worktrees live under the dot dir (gitignored by `lf init`).
    pub fn worktrees_dir(&self) -> PathBuf {
        self.dot_dir().join("worktrees")
    }

    pub fn worktree_path(&self, lane: &str) -> PathBuf {
        self.worktrees_dir().join(lane_slug(lane))
    }

    /// Lock directory: env override, else `<temp>/lumenflow-locks`.
    pub fn lock_dir(&self) -> PathBuf {
        match std::env::var_os(LOCK_DIR_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => std::env::temp_dir().join("lumenflow-locks"),
        }
    }
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
