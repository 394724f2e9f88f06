// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WU lifecycle events — the append-only ground truth.
//!
//! One event is one line of the `wu-events.jsonl` log:
//! `{"wu_id":"WU-1","kind":"claimed","details":{...},"timestamp":"...","actor_id":...}`.
//! The kind/details pair is a closed tagged union so adding an event kind is
//! a compile-time fan-out across the store and projections.

use crate::date::CivilDate;
use crate::id::{ActorId, WuId};
use crate::status::WuStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// How a claimed WU is being worked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimMode {
    /// Edits happen directly in the trunk checkout
    Inline,
    /// Edits happen in a dedicated lane worktree
    Worktree,
    /// Short-lived worktree for a single small change
    MicroWorktree,
}

impl std::fmt::Display for ClaimMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClaimMode::Inline => write!(f, "inline"),
            ClaimMode::Worktree => write!(f, "worktree"),
            ClaimMode::MicroWorktree => write!(f, "micro_worktree"),
        }
    }
}

/// Event kind plus its payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "details", rename_all = "snake_case")]
pub enum EventKind {
    Created {
        title: String,
        lane: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        created: Option<CivilDate>,
    },
    Claimed {
        mode: ClaimMode,
        lane: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        worktree_path: Option<PathBuf>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session: Option<String>,
    },
    /// Scalar field edits; last-write-wins during replay.
    Edited {
        #[serde(default)]
        fields: BTreeMap<String, serde_json::Value>,
    },
    Completed {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        merge_commit: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pr_url: Option<String>,
    },
    Blocked {
        reason: String,
    },
    Unblocked {},
    /// Progress note; does not change status.
    Checkpoint {
        note: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        progress: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        next_steps: Option<String>,
    },
    Released {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    /// A failed completion was rolled back; the claim is still live.
    Recovered {
        attempt: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        failed_at: Option<String>,
    },
}

impl EventKind {
    /// Wire name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::Created { .. } => "created",
            EventKind::Claimed { .. } => "claimed",
            EventKind::Edited { .. } => "edited",
            EventKind::Completed { .. } => "completed",
            EventKind::Blocked { .. } => "blocked",
            EventKind::Unblocked {} => "unblocked",
            EventKind::Checkpoint { .. } => "checkpoint",
            EventKind::Released { .. } => "released",
            EventKind::Recovered { .. } => "recovered",
        }
    }

    /// The status a WU holds after this event, if the event changes status.
    pub fn status_after(&self) -> Option<WuStatus> {
        match self {
            EventKind::Created { .. } => Some(WuStatus::Ready),
            EventKind::Claimed { .. } => Some(WuStatus::InProgress),
            EventKind::Completed { .. } => Some(WuStatus::Done),
            EventKind::Blocked { .. } => Some(WuStatus::Blocked),
            EventKind::Unblocked {} => Some(WuStatus::InProgress),
            EventKind::Released { .. } => Some(WuStatus::Released),
            EventKind::Edited { .. }
            | EventKind::Checkpoint { .. }
            | EventKind::Recovered { .. } => None,
        }
    }
}

/// One record of the event log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub wu_id: WuId,
    #[serde(flatten)]
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor_id: Option<ActorId>,
}

impl EventRecord {
    pub fn new(
        wu_id: WuId,
        kind: EventKind,
        timestamp: DateTime<Utc>,
        actor_id: Option<ActorId>,
    ) -> Self {
        Self {
            wu_id,
            kind,
            timestamp,
            actor_id,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
