// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory projection of the event log.
//!
//! Replay applies events in log order without re-validating transitions —
//! the log is authoritative. Scalar fields are last-write-wins. The
//! secondary indices are ordered sets so iteration is numeric-ascending
//! without sorting at query time.

use chrono::{DateTime, Utc};
use lf_core::{ClaimMode, EventKind, EventRecord, WuId, WuStatus};
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

/// Derived latest-view of one WU. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct WuState {
    pub wu_id: WuId,
    pub status: WuStatus,
    pub title: String,
    pub lane: String,
    pub completed_at: Option<DateTime<Utc>>,
    pub claimed_mode: Option<ClaimMode>,
    pub worktree_path: Option<PathBuf>,
    pub blocked_reason: Option<String>,
}

impl WuState {
    fn new(wu_id: WuId) -> Self {
        Self {
            wu_id,
            status: WuStatus::Ready,
            title: String::new(),
            lane: String::new(),
            completed_at: None,
            claimed_mode: None,
            worktree_path: None,
            blocked_reason: None,
        }
    }
}

/// Projection of the whole log, with O(1) queries after load.
#[derive(Debug, Default, Clone)]
pub struct StoreState {
    wus: HashMap<WuId, WuState>,
    by_status: HashMap<WuStatus, BTreeSet<WuId>>,
    by_lane: HashMap<String, BTreeSet<WuId>>,
}

impl StoreState {
    pub fn get(&self, id: WuId) -> Option<&WuState> {
        self.wus.get(&id)
    }

    pub fn contains(&self, id: WuId) -> bool {
        self.wus.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.wus.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wus.is_empty()
    }

    /// WUs with the given status, numeric ascending.
    pub fn by_status(&self, status: WuStatus) -> impl Iterator<Item = WuId> + '_ {
        self.by_status.get(&status).into_iter().flatten().copied()
    }

    /// WUs on the given lane, numeric ascending.
    pub fn by_lane(&self, lane: &str) -> impl Iterator<Item = WuId> + '_ {
        self.by_lane.get(lane).into_iter().flatten().copied()
    }

    /// All known WU ids, numeric ascending.
    pub fn ids(&self) -> Vec<WuId> {
        let mut ids: Vec<WuId> = self.wus.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Apply one event. Unknown WUs get a placeholder state so a log that
    /// opens mid-history still projects (the WU file remains the richer
    /// record).
    pub fn apply_event(&mut self, record: &EventRecord) {
        let id = record.wu_id;
        if !self.wus.contains_key(&id) {
            self.wus.insert(id, WuState::new(id));
            self.by_status.entry(WuStatus::Ready).or_default().insert(id);
        }

        match &record.kind {
            EventKind::Created { title, lane, .. } => {
                self.update(id, |wu| {
                    wu.title = title.clone();
                    wu.lane = lane.clone();
                });
                self.set_status(id, WuStatus::Ready);
            }
            EventKind::Claimed {
                mode,
                lane,
                worktree_path,
                ..
            } => {
                self.update(id, |wu| {
                    wu.claimed_mode = Some(*mode);
                    wu.worktree_path = worktree_path.clone();
                    wu.lane = lane.clone();
                });
                self.set_status(id, WuStatus::InProgress);
            }
            EventKind::Edited { fields } => {
                let title = fields.get("title").and_then(|v| v.as_str()).map(String::from);
                let lane = fields.get("lane").and_then(|v| v.as_str()).map(String::from);
                self.update(id, |wu| {
                    if let Some(t) = title {
                        wu.title = t;
                    }
                });
                if let Some(l) = lane {
                    self.set_lane(id, l);
                }
            }
            EventKind::Completed { .. } => {
                let at = record.timestamp;
                self.update(id, |wu| wu.completed_at = Some(at));
                self.set_status(id, WuStatus::Done);
            }
            EventKind::Blocked { reason } => {
                let reason = reason.clone();
                self.update(id, |wu| wu.blocked_reason = Some(reason));
                self.set_status(id, WuStatus::Blocked);
            }
            EventKind::Unblocked {} => {
                self.update(id, |wu| wu.blocked_reason = None);
                self.set_status(id, WuStatus::InProgress);
            }
            EventKind::Released { .. } => {
                self.set_status(id, WuStatus::Released);
            }
            EventKind::Checkpoint { .. } | EventKind::Recovered { .. } => {}
        }

        // Keep the lane index keyed by the current lane value
        if let Some(wu) = self.wus.get(&id) {
            if !wu.lane.is_empty() {
                let lane = wu.lane.clone();
                self.index_lane(id, &lane);
            }
        }
    }

    fn update(&mut self, id: WuId, f: impl FnOnce(&mut WuState)) {
        if let Some(wu) = self.wus.get_mut(&id) {
            f(wu);
        }
    }

    fn set_status(&mut self, id: WuId, status: WuStatus) {
        if let Some(wu) = self.wus.get_mut(&id) {
            let old = wu.status;
            wu.status = status;
            if let Some(set) = self.by_status.get_mut(&old) {
                set.remove(&id);
            }
            self.by_status.entry(status).or_default().insert(id);
        }
    }

    fn set_lane(&mut self, id: WuId, lane: String) {
        if let Some(wu) = self.wus.get_mut(&id) {
            let old = std::mem::replace(&mut wu.lane, lane.clone());
            if let Some(set) = self.by_lane.get_mut(&old) {
                set.remove(&id);
            }
        }
        self.index_lane(id, &lane);
    }

    fn index_lane(&mut self, id: WuId, lane: &str) {
        // Remove from any stale lane set first (lane may have changed via claim)
        for (key, set) in self.by_lane.iter_mut() {
            if key != lane {
                set.remove(&id);
            }
        }
        self.by_lane.entry(lane.to_string()).or_default().insert(id);
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
