// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests.

use crate::context::EngineCtx;
use lf_core::test_support::{fixed_ts, sample_wu, wu_id};
use lf_core::{ClaimMode, Config, EventKind, EventRecord, FakeClock, LfPaths, WuId};
use lf_storage::{save_wu, EventStore};
use std::path::Path;
use std::sync::Arc;

/// Context rooted at a temp dir, with a fake clock at the fixed timestamp.
pub fn test_ctx(root: &Path) -> EngineCtx {
    EngineCtx::new(LfPaths::new(root), Config::default())
        .with_clock(Arc::new(FakeClock::at(fixed_ts())))
}

/// Open the store for a context.
pub fn open_store(ctx: &EngineCtx) -> EventStore {
    EventStore::open(&ctx.paths.events_path()).unwrap()
}

/// Create the WU file and its `created` event.
pub fn seed_wu(ctx: &EngineCtx, store: &mut EventStore, n: u64, lane: &str) -> WuId {
    let wu = sample_wu(n, lane);
    save_wu(&ctx.paths.wu_path(wu.id), &wu).unwrap();
    store
        .append(EventRecord::new(
            wu.id,
            EventKind::Created {
                title: wu.title.clone(),
                lane: lane.to_string(),
                created: Some(wu.created),
            },
            ctx.now(),
            None,
        ))
        .unwrap();
    wu.id
}

/// Seed and claim a WU inline, updating the WU file status too.
pub fn seed_claimed_wu(ctx: &EngineCtx, store: &mut EventStore, n: u64, lane: &str) -> WuId {
    let id = seed_wu(ctx, store, n, lane);
    store
        .append(EventRecord::new(
            id,
            EventKind::Claimed {
                mode: ClaimMode::Inline,
                lane: lane.to_string(),
                worktree_path: None,
                session: None,
            },
            ctx.now(),
            None,
        ))
        .unwrap();
    let mut wu = sample_wu(n, lane);
    wu.status = lf_core::WuStatus::InProgress;
    save_wu(&ctx.paths.wu_path(id), &wu).unwrap();
    id
}

pub fn id(n: u64) -> WuId {
    wu_id(n)
}
