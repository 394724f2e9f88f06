// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Recovery-attempt counters and the manual recovery operation.
//!
//! Each WU's marker file holds a decimal count of failed completions.
//! Corrupt content reads as zero. At the configured ceiling the engine
//! refuses further automated attempts and escalates.

use crate::context::EngineCtx;
use crate::error::EngineError;
use crate::projection::stage_projections;
use crate::transaction::Transaction;
use lf_core::{EventKind, EventRecord, WuId};
use lf_storage::{load_wu, serialize_wu, EventStore};
use tracing::{info, warn};

/// Read the attempt count for a WU. Missing or corrupt markers read zero.
pub fn read_attempts(ctx: &EngineCtx, wu_id: WuId) -> u32 {
    let path = ctx.paths.recovery_marker_path(wu_id);
    match std::fs::read_to_string(&path) {
        Ok(content) => content.trim().parse().unwrap_or_else(|_| {
            warn!(path = %path.display(), "corrupt recovery marker, treating as zero");
            0
        }),
        Err(_) => 0,
    }
}

/// Record one more failed completion. Returns the new count.
pub fn record_failure(ctx: &EngineCtx, wu_id: WuId) -> Result<u32, EngineError> {
    let count = read_attempts(ctx, wu_id) + 1;
    let path = ctx.paths.recovery_marker_path(wu_id);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, format!("{count}\n"))?;
    info!(%wu_id, count, "recorded failed completion attempt");
    Ok(count)
}

/// Clear the marker after a successful completion or recovery.
pub fn clear_attempts(ctx: &EngineCtx, wu_id: WuId) -> Result<(), EngineError> {
    match std::fs::remove_file(ctx.paths.recovery_marker_path(wu_id)) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Refuse automated work once the ceiling is reached.
pub fn ensure_attempts_remaining(ctx: &EngineCtx, wu_id: WuId) -> Result<(), EngineError> {
    let attempts = read_attempts(ctx, wu_id);
    let max = ctx.config.engine.max_recovery_attempts;
    if attempts >= max {
        return Err(EngineError::RecoveryExhaustion {
            wu_id,
            attempts,
            max,
        });
    }
    Ok(())
}

/// Outcome of a manual recovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoverOutcome {
    pub wu_id: WuId,
    /// Attempt count that was on the marker before recovery.
    pub attempts: u32,
    /// Projection files that were re-rendered.
    pub refreshed: Vec<String>,
}

/// Manual recovery: re-project metadata files from the store (the truth),
/// emit a `recovered` event, and clear the marker.
///
/// Without `force`, refuses both a clean marker (nothing to recover) and an
/// exhausted one (escalation must be deliberate).
pub fn recover(
    ctx: &EngineCtx,
    store: &mut EventStore,
    wu_id: WuId,
    force: bool,
) -> Result<RecoverOutcome, EngineError> {
    let state = store
        .get_state(wu_id)
        .ok_or(lf_storage::StoreError::UnknownWu(wu_id))?;

    let attempts = read_attempts(ctx, wu_id);
    if attempts == 0 && !force {
        return Err(EngineError::Validation {
            wu_id: Some(wu_id),
            problems: vec!["no failed attempts recorded; nothing to recover".to_string()],
        });
    }
    let max = ctx.config.engine.max_recovery_attempts;
    if attempts >= max && !force {
        return Err(EngineError::RecoveryExhaustion {
            wu_id,
            attempts,
            max,
        });
    }

    // The store is the truth; put the WU file back in line with it.
    let wu_path = ctx.paths.wu_path(wu_id);
    let mut wu = load_wu(&wu_path)?;
    let mut refreshed = Vec::new();
    let mut tx = Transaction::new(wu_id);

    if wu.status != state.status {
        warn!(%wu_id, file = %wu.status, store = %state.status, "WU file drifted from store");
        wu.status = state.status;
        tx.stage(&wu_path, serialize_wu(&wu)?.into_bytes(), "WU file");
        refreshed.push(format!("wu/{wu_id}.yaml"));
    }

    stage_projections(ctx, &mut tx, store.state(), None)?;
    refreshed.push("tasks/backlog.md".to_string());
    refreshed.push("tasks/status.md".to_string());

    if let Err(failure) = tx.commit() {
        return Err(EngineError::Transaction {
            failed: failure
                .failed
                .iter()
                .map(|(p, e)| format!("{}: {e}", p.display()))
                .collect(),
            restored: failure.restored,
        });
    }

    store.append(EventRecord::new(
        wu_id,
        EventKind::Recovered {
            attempt: attempts,
            failed_at: None,
        },
        ctx.now(),
        ctx.actor.clone(),
    ))?;

    clear_attempts(ctx, wu_id)?;
    info!(%wu_id, attempts, "manual recovery completed");

    Ok(RecoverOutcome {
        wu_id,
        attempts,
        refreshed,
    })
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
