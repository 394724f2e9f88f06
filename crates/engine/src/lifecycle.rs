// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WU lifecycle operations: claim, block, unblock, release, edit,
//! checkpoint.
//!
//! Every operation follows the same shape: guard the transition, stage the
//! WU file plus the re-rendered projections in one transaction, commit,
//! then append the event. An append failure restores the snapshot so files
//! and log never disagree.

use crate::context::EngineCtx;
use crate::error::EngineError;
use crate::initiative::stage_initiative_move;
use crate::lock::{Acquire, AcquireOpts, LockManager, LockResource};
use crate::projection::stage_projections;
use crate::transaction::{CommitIntent, FsSnapshot, Transaction};
use lf_adapters::GitAdapter;
use lf_core::{
    ClaimMode, EventKind, EventRecord, LockPolicy, Priority, WorkUnit, WuId, WuStatus, WuType,
};
use lf_storage::{load_wu, serialize_wu, CheckpointOpts, EventStore, SpawnRegistry};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, warn};

/// Options for a claim.
#[derive(Debug, Clone)]
pub struct ClaimOptions {
    pub mode: ClaimMode,
    pub session: Option<String>,
    /// Lane lock wait budget override; `None` uses the configured budget.
    pub wait: Option<std::time::Duration>,
}

impl Default for ClaimOptions {
    fn default() -> Self {
        Self {
            mode: ClaimMode::Inline,
            session: None,
            wait: None,
        }
    }
}

/// Successful claim.
#[derive(Debug)]
pub struct ClaimOutcome {
    pub wu_id: WuId,
    pub lane: String,
    pub mode: ClaimMode,
    pub worktree_path: Option<PathBuf>,
    pub lock: Acquire,
}

/// Claim a ready WU: lane lock under policy, dependency guard, worktree
/// setup when requested, then the metadata transaction and the event.
pub async fn claim(
    ctx: &EngineCtx,
    store: &mut EventStore,
    locks: &LockManager,
    git: Option<&dyn GitAdapter>,
    registry: Option<&mut SpawnRegistry>,
    wu_id: WuId,
    opts: ClaimOptions,
) -> Result<ClaimOutcome, EngineError> {
    let wu = load_wu(&ctx.paths.wu_path(wu_id))?;

    let problems = wu.claim_blockers();
    if !problems.is_empty() {
        return Err(EngineError::Validation {
            wu_id: Some(wu_id),
            problems,
        });
    }

    ensure_store_record(ctx, store, &wu)?;
    guard_transition(store, wu_id, WuStatus::InProgress)?;
    guard_dependencies(store, &wu)?;

    // Lane lock under the lane's policy.
    let policy = ctx.config.lock_policy_for(&wu.lane);
    guard_lane_free(store, &wu.lane, wu_id, policy)?;
    let resource = LockResource::lane(wu.lane.clone());
    let wait = opts.wait.unwrap_or(std::time::Duration::from_millis(
        ctx.config.engine.lane_lock_wait_ms,
    ));
    let worktree_path = match opts.mode {
        ClaimMode::Inline => None,
        _ => Some(ctx.paths.worktree_path(&wu.lane)),
    };
    let acquire_opts = AcquireOpts {
        wait: Some(wait),
        policy,
        lane: Some(wu.lane.clone()),
        worktree_path: worktree_path.clone(),
    };
    let lock = locks.acquire(&resource, wu_id, &acquire_opts).await;
    if let Acquire::Busy { held_by, .. } = &lock {
        return Err(EngineError::LockBusy {
            resource: resource.name(),
            held_by: *held_by,
        });
    }

    let result = claim_inner(ctx, store, git, wu_id, &wu, &opts, worktree_path).await;

    match result {
        Ok(worktree_path) => {
            if let Some(registry) = registry {
                match registry.record_pickup(wu_id, ctx.now()) {
                    Ok(()) => info!(%wu_id, "spawn pickup recorded"),
                    Err(lf_storage::SpawnRegistryError::NoPendingSpawn(_)) => {}
                    Err(e) => warn!(%wu_id, error = %e, "spawn pickup failed"),
                }
            }
            info!(%wu_id, lane = %wu.lane, mode = %opts.mode, "claimed");
            Ok(ClaimOutcome {
                wu_id,
                lane: wu.lane,
                mode: opts.mode,
                worktree_path,
                lock,
            })
        }
        Err(e) => {
            // A lock taken fresh for this claim is let go on failure.
            if let Acquire::Acquired {
                lock_id,
                reacquired: false,
                ..
            } = &lock
            {
                locks.release(&resource, lock_id);
            }
            Err(e)
        }
    }
}

async fn claim_inner(
    ctx: &EngineCtx,
    store: &mut EventStore,
    git: Option<&dyn GitAdapter>,
    wu_id: WuId,
    wu: &WorkUnit,
    opts: &ClaimOptions,
    worktree_path: Option<PathBuf>,
) -> Result<Option<PathBuf>, EngineError> {
    // Worktree setup happens before any metadata lands (an in-progress
    // worktree claim always has its directory).
    if let Some(path) = &worktree_path {
        let git = git.ok_or_else(|| EngineError::Validation {
            wu_id: Some(wu_id),
            problems: vec!["worktree claim modes require git".to_string()],
        })?;
        let branch = ctx.lane_branch(&wu.lane);
        let root = ctx.paths.root();
        if !path.exists() {
            if git.get_commit_hash(root, &branch).await.is_err() {
                git.create_branch_no_checkout(root, &branch, ctx.trunk()).await?;
            }
            git.worktree_add_existing(root, path, &branch).await?;
        }
    }

    let record = EventRecord::new(
        wu_id,
        EventKind::Claimed {
            mode: opts.mode,
            lane: wu.lane.clone(),
            worktree_path: worktree_path.clone(),
            session: opts.session.clone(),
        },
        ctx.now(),
        ctx.actor.clone(),
    );

    let mut updated = wu.clone();
    updated.status = WuStatus::InProgress;
    let snapshot = commit_with_event(ctx, store, &updated, record, None)?;
    drop(snapshot);

    Ok(worktree_path)
}

/// Block an in-progress (or ready) WU. Under the `active` policy the lane
/// lock is released while blocked.
pub fn block(
    ctx: &EngineCtx,
    store: &mut EventStore,
    locks: &LockManager,
    wu_id: WuId,
    reason: &str,
) -> Result<(), EngineError> {
    let wu = load_wu(&ctx.paths.wu_path(wu_id))?;
    ensure_store_record(ctx, store, &wu)?;
    guard_transition(store, wu_id, WuStatus::Blocked)?;

    let record = EventRecord::new(
        wu_id,
        EventKind::Blocked {
            reason: reason.to_string(),
        },
        ctx.now(),
        ctx.actor.clone(),
    );
    let mut updated = wu.clone();
    updated.status = WuStatus::Blocked;
    commit_with_event(ctx, store, &updated, record, None)?;

    if ctx.config.lock_policy_for(&wu.lane) == LockPolicy::Active {
        locks.release_for_wu(&LockResource::lane(wu.lane.clone()), wu_id);
    }
    info!(%wu_id, reason, "blocked");
    Ok(())
}

/// Unblock a blocked WU. Under the `active` policy the lane lock is
/// re-acquired first; if the lane is busy the WU stays blocked.
pub async fn unblock(
    ctx: &EngineCtx,
    store: &mut EventStore,
    locks: &LockManager,
    wu_id: WuId,
) -> Result<(), EngineError> {
    let wu = load_wu(&ctx.paths.wu_path(wu_id))?;
    ensure_store_record(ctx, store, &wu)?;
    guard_transition(store, wu_id, WuStatus::InProgress)?;

    let policy = ctx.config.lock_policy_for(&wu.lane);
    guard_lane_free(store, &wu.lane, wu_id, policy)?;
    if policy == LockPolicy::Active {
        let resource = LockResource::lane(wu.lane.clone());
        let opts = AcquireOpts {
            wait: Some(std::time::Duration::from_millis(
                ctx.config.engine.lane_lock_wait_ms,
            )),
            policy,
            lane: Some(wu.lane.clone()),
            worktree_path: None,
        };
        if let Acquire::Busy { held_by, .. } = locks.acquire(&resource, wu_id, &opts).await {
            return Err(EngineError::LockBusy {
                resource: resource.name(),
                held_by,
            });
        }
    }

    let record = EventRecord::new(wu_id, EventKind::Unblocked {}, ctx.now(), ctx.actor.clone());
    let mut updated = wu.clone();
    updated.status = WuStatus::InProgress;
    commit_with_event(ctx, store, &updated, record, None)?;
    info!(%wu_id, "unblocked");
    Ok(())
}

/// Release (abandon) a WU. Always permitted except for done WUs.
pub fn release_wu(
    ctx: &EngineCtx,
    store: &mut EventStore,
    locks: &LockManager,
    wu_id: WuId,
    reason: Option<String>,
) -> Result<(), EngineError> {
    let wu = load_wu(&ctx.paths.wu_path(wu_id))?;
    ensure_store_record(ctx, store, &wu)?;
    guard_transition(store, wu_id, WuStatus::Released)?;

    let record = EventRecord::new(
        wu_id,
        EventKind::Released { reason },
        ctx.now(),
        ctx.actor.clone(),
    );
    let mut updated = wu.clone();
    updated.status = WuStatus::Released;
    commit_with_event(ctx, store, &updated, record, None)?;

    locks.release_for_wu(&LockResource::lane(wu.lane.clone()), wu_id);
    info!(%wu_id, "released");
    Ok(())
}

/// Field edits applied by `wu edit`.
#[derive(Debug, Clone, Default)]
pub struct WuEdit {
    pub title: Option<String>,
    pub lane: Option<String>,
    pub wu_type: Option<WuType>,
    pub priority: Option<Priority>,
    /// `Some(None)` clears the field.
    pub phase: Option<Option<String>>,
    pub initiative: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub plan: Option<Option<String>>,
    pub add_acceptance: Vec<String>,
    pub add_code_paths: Vec<String>,
}

impl WuEdit {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.lane.is_none()
            && self.wu_type.is_none()
            && self.priority.is_none()
            && self.phase.is_none()
            && self.initiative.is_none()
            && self.notes.is_none()
            && self.plan.is_none()
            && self.add_acceptance.is_empty()
            && self.add_code_paths.is_empty()
    }
}

/// Edit WU spec fields. Initiative changes update both membership arrays
/// in the same transaction.
pub fn edit(
    ctx: &EngineCtx,
    store: &mut EventStore,
    wu_id: WuId,
    changes: WuEdit,
) -> Result<(), EngineError> {
    if changes.is_empty() {
        return Err(EngineError::Validation {
            wu_id: Some(wu_id),
            problems: vec!["no changes given".to_string()],
        });
    }

    let wu = load_wu(&ctx.paths.wu_path(wu_id))?;
    ensure_store_record(ctx, store, &wu)?;

    let old_initiative = wu.initiative.clone();
    let mut updated = wu.clone();
    let mut fields = BTreeMap::new();

    if let Some(title) = changes.title {
        fields.insert("title".to_string(), serde_json::json!(title));
        updated.title = title;
    }
    if let Some(lane) = changes.lane {
        fields.insert("lane".to_string(), serde_json::json!(lane));
        updated.lane = lane;
    }
    if let Some(wu_type) = changes.wu_type {
        fields.insert("type".to_string(), serde_json::json!(wu_type));
        updated.wu_type = wu_type;
    }
    if let Some(priority) = changes.priority {
        fields.insert("priority".to_string(), serde_json::json!(priority));
        updated.priority = priority;
    }
    if let Some(phase) = changes.phase {
        fields.insert("phase".to_string(), serde_json::json!(phase));
        updated.phase = phase;
    }
    if let Some(initiative) = changes.initiative.clone() {
        fields.insert("initiative".to_string(), serde_json::json!(initiative));
        updated.initiative = initiative;
    }
    if let Some(notes) = changes.notes {
        fields.insert("notes".to_string(), serde_json::json!(notes));
        updated.notes = notes;
    }
    if let Some(plan) = changes.plan {
        fields.insert("plan".to_string(), serde_json::json!(plan));
        updated.plan = plan;
    }
    if !changes.add_acceptance.is_empty() {
        updated.acceptance.extend(changes.add_acceptance.clone());
        fields.insert(
            "acceptance".to_string(),
            serde_json::json!(updated.acceptance),
        );
    }
    if !changes.add_code_paths.is_empty() {
        updated.code_paths.extend(changes.add_code_paths.clone());
        fields.insert(
            "code_paths".to_string(),
            serde_json::json!(updated.code_paths),
        );
    }

    let problems = updated.validate();
    if !problems.is_empty() {
        return Err(EngineError::Validation {
            wu_id: Some(wu_id),
            problems,
        });
    }

    let record = EventRecord::new(
        wu_id,
        EventKind::Edited { fields },
        ctx.now(),
        ctx.actor.clone(),
    );

    let mut extra = Transaction::new(wu_id);
    if changes.initiative.is_some() {
        stage_initiative_move(
            &mut extra,
            &ctx.paths,
            wu_id,
            old_initiative.as_deref(),
            updated.initiative.as_deref(),
        )
        .map_err(|e| EngineError::Validation {
            wu_id: Some(wu_id),
            problems: vec![e.to_string()],
        })?;
    }

    commit_with_event(ctx, store, &updated, record, Some(extra))?;
    info!(%wu_id, "edited");
    Ok(())
}

/// Append a checkpoint note.
pub fn checkpoint(
    ctx: &EngineCtx,
    store: &mut EventStore,
    wu_id: WuId,
    note: &str,
    opts: CheckpointOpts,
) -> Result<(), EngineError> {
    store.checkpoint(wu_id, note, opts, ctx.now(), ctx.actor.clone())?;
    Ok(())
}

// ── Shared guards and plumbing ───────────────────────────────────────────────

/// Bring the store in line with a hand-authored WU file.
fn ensure_store_record(
    ctx: &EngineCtx,
    store: &mut EventStore,
    wu: &WorkUnit,
) -> Result<(), EngineError> {
    if store.get_state(wu.id).is_none() {
        store.append(EventRecord::new(
            wu.id,
            EventKind::Created {
                title: wu.title.clone(),
                lane: wu.lane.clone(),
                created: Some(wu.created),
            },
            ctx.now(),
            ctx.actor.clone(),
        ))?;
    }
    Ok(())
}

fn guard_transition(
    store: &EventStore,
    wu_id: WuId,
    to: WuStatus,
) -> Result<(), EngineError> {
    let state = store
        .get_state(wu_id)
        .ok_or(lf_storage::StoreError::UnknownWu(wu_id))?;
    if !state.status.can_transition(to) {
        return Err(EngineError::StateTransition {
            wu_id,
            from: state.status,
            to,
        });
    }
    Ok(())
}

/// Work-in-progress check: between short-lived processes the lease file
/// alone cannot hold a lane (a dead holder pid is reclaimable), so claim
/// also refuses lanes with another in-progress WU. Policy `none` bypasses
/// this along with the lock itself.
fn guard_lane_free(
    store: &EventStore,
    lane: &str,
    wu_id: WuId,
    policy: LockPolicy,
) -> Result<(), EngineError> {
    if policy == LockPolicy::None {
        return Ok(());
    }
    let holder = store.by_lane(lane).find(|other| {
        *other != wu_id
            && store
                .get_state(*other)
                .map(|s| s.status == WuStatus::InProgress)
                .unwrap_or(false)
    });
    match holder {
        Some(other) => Err(EngineError::LockBusy {
            resource: lane.to_string(),
            held_by: Some(other),
        }),
        None => Ok(()),
    }
}

fn guard_dependencies(store: &EventStore, wu: &WorkUnit) -> Result<(), EngineError> {
    let mut problems = Vec::new();
    for dep in wu.dependencies.iter().chain(wu.blocked_by.iter()) {
        let done = store
            .get_state(*dep)
            .map(|s| s.status == WuStatus::Done)
            .unwrap_or(false);
        if !done {
            problems.push(format!("{dep} must be done first"));
        }
    }
    if problems.is_empty() {
        Ok(())
    } else {
        Err(EngineError::Validation {
            wu_id: Some(wu.id),
            problems,
        })
    }
}

/// Stage the WU file plus projections (plus any extra staged writes),
/// commit, then append the event; restore on append failure.
fn commit_with_event(
    ctx: &EngineCtx,
    store: &mut EventStore,
    updated: &WorkUnit,
    record: EventRecord,
    extra: Option<Transaction>,
) -> Result<FsSnapshot, EngineError> {
    let wu_id = updated.id;
    let wu_path = ctx.paths.wu_path(wu_id);

    let mut tx = Transaction::new(wu_id);
    tx.stage(&wu_path, serialize_wu(updated)?.into_bytes(), "WU file");
    if let Some(extra) = extra {
        for write in extra.writes() {
            tx.stage(&write.path, write.bytes.clone(), write.description.clone());
        }
    }

    // Projections are rendered against the state as it will be after the
    // event lands.
    let mut tentative = store.state().clone();
    tentative.apply_event(&record);
    stage_projections(ctx, &mut tx, &tentative, None)?;

    let intent = CommitIntent {
        wu_id,
        status: updated.status,
        wu_path,
        backlog_path: Some(ctx.paths.backlog_path()),
        stamp_path: None,
    };
    let problems = tx.validate(&intent);
    if !problems.is_empty() {
        return Err(EngineError::Validation {
            wu_id: Some(wu_id),
            problems,
        });
    }

    let receipt = tx.commit().map_err(|failure| EngineError::Transaction {
        failed: failure
            .failed
            .iter()
            .map(|(p, e)| format!("{}: {e}", p.display()))
            .collect(),
        restored: failure.restored,
    })?;

    if let Err(e) = store.append(record) {
        if receipt.snapshot.restore().is_err() {
            warn!(%wu_id, "restore after failed append left files modified");
        }
        return Err(e.into());
    }

    Ok(receipt.snapshot)
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
