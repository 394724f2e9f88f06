// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Work unit status and the legal transition table.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a work unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WuStatus {
    /// Specced and claimable
    Ready,
    /// Claimed by a session
    InProgress,
    /// Waiting on an external dependency
    Blocked,
    /// Merged (or referenced by a PR) and stamped
    Done,
    /// Abandoned; may be re-readied later
    Released,
}

impl WuStatus {
    /// Whether the transition `self → to` is legal.
    ///
    /// `done` is terminal. `released` can only be re-readied. A blocked WU
    /// must pass back through `in_progress` before completing.
    pub fn can_transition(self, to: WuStatus) -> bool {
        use WuStatus::*;
        matches!(
            (self, to),
            (Ready, InProgress)
                | (Ready, Blocked)
                | (Ready, Released)
                | (InProgress, Ready)
                | (InProgress, Blocked)
                | (InProgress, Done)
                | (InProgress, Released)
                | (Blocked, InProgress)
                | (Blocked, Released)
                | (Released, Ready)
        )
    }

    /// Whether no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, WuStatus::Done)
    }

    /// Backlog section heading for this status, if it has one.
    ///
    /// Released WUs do not appear in the backlog projection.
    pub fn backlog_section(self) -> Option<&'static str> {
        match self {
            WuStatus::Ready => Some("Ready"),
            WuStatus::InProgress => Some("In Progress"),
            WuStatus::Blocked => Some("Blocked"),
            WuStatus::Done => Some("Done"),
            WuStatus::Released => None,
        }
    }

    /// All statuses, in backlog section order.
    pub fn all() -> [WuStatus; 5] {
        [
            WuStatus::Ready,
            WuStatus::InProgress,
            WuStatus::Blocked,
            WuStatus::Done,
            WuStatus::Released,
        ]
    }
}

impl fmt::Display for WuStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WuStatus::Ready => write!(f, "ready"),
            WuStatus::InProgress => write!(f, "in_progress"),
            WuStatus::Blocked => write!(f, "blocked"),
            WuStatus::Done => write!(f, "done"),
            WuStatus::Released => write!(f, "released"),
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
