// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test builders shared across crates (behind the `test-support` feature).

use crate::date::CivilDate;
use crate::event::{ClaimMode, EventKind, EventRecord};
use crate::id::WuId;
use crate::wu::WorkUnit;
use chrono::{DateTime, TimeZone, Utc};
use std::path::PathBuf;

/// A fixed, readable timestamp for deterministic tests.
pub fn fixed_ts() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).single() {
        Some(ts) => ts,
        None => unreachable!("fixed timestamp is valid"),
    }
}

pub fn wu_id(n: u64) -> WuId {
    match WuId::new(n) {
        Some(id) => id,
        None => unreachable!("test ids are positive"),
    }
}

pub fn created_event(n: u64, title: &str, lane: &str) -> EventRecord {
    EventRecord::new(
        wu_id(n),
        EventKind::Created {
            title: title.to_string(),
            lane: lane.to_string(),
            created: None,
        },
        fixed_ts(),
        None,
    )
}

pub fn claimed_event(n: u64, lane: &str, mode: ClaimMode) -> EventRecord {
    let worktree_path = match mode {
        ClaimMode::Inline => None,
        _ => Some(PathBuf::from(format!("/tmp/worktrees/wu-{n}"))),
    };
    EventRecord::new(
        wu_id(n),
        EventKind::Claimed {
            mode,
            lane: lane.to_string(),
            worktree_path,
            session: None,
        },
        fixed_ts(),
        None,
    )
}

pub fn completed_event(n: u64) -> EventRecord {
    EventRecord::new(
        wu_id(n),
        EventKind::Completed {
            merge_commit: Some("deadbeef".to_string()),
            pr_url: None,
        },
        fixed_ts(),
        None,
    )
}

pub fn blocked_event(n: u64, reason: &str) -> EventRecord {
    EventRecord::new(
        wu_id(n),
        EventKind::Blocked {
            reason: reason.to_string(),
        },
        fixed_ts(),
        None,
    )
}

pub fn unblocked_event(n: u64) -> EventRecord {
    EventRecord::new(wu_id(n), EventKind::Unblocked {}, fixed_ts(), None)
}

pub fn released_event(n: u64) -> EventRecord {
    EventRecord::new(wu_id(n), EventKind::Released { reason: None }, fixed_ts(), None)
}

pub fn checkpoint_event(n: u64, note: &str) -> EventRecord {
    EventRecord::new(
        wu_id(n),
        EventKind::Checkpoint {
            note: note.to_string(),
            session: None,
            progress: None,
            next_steps: None,
        },
        fixed_ts(),
        None,
    )
}

/// A claimable WU with acceptance and a unit test reference filled in.
pub fn sample_wu(n: u64, lane: &str) -> WorkUnit {
    let created = match "2025-02-01".parse::<CivilDate>() {
        Ok(d) => d,
        Err(_) => unreachable!("fixed date is valid"),
    };
    let mut wu = WorkUnit::new(wu_id(n), format!("Sample unit {n}"), lane, created);
    wu.acceptance = vec!["does the thing".to_string()];
    wu.tests.unit = vec!["sample_tests::does_the_thing".to_string()];
    wu
}
