// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared projection staging: every operation that changes store state
//! re-renders the backlog, the status document, and the checksum marker in
//! the same transaction as its other metadata writes.

use crate::context::EngineCtx;
use crate::error::EngineError;
use crate::transaction::Transaction;
use lf_core::{WorkUnit, WuId};
use lf_storage::{checksum, list_wu_files, load_wu, render_backlog, render_status, StoreState};
use tracing::warn;

/// File under the state dir holding the checksum of the last projection.
pub const CHECKSUM_FILE: &str = "backlog.checksum";

/// WU files on disk, skipping unparsable ones with a warning.
pub fn disk_work_units(ctx: &EngineCtx) -> Result<Vec<(WuId, WorkUnit)>, EngineError> {
    let mut found = Vec::new();
    for (id, path) in list_wu_files(&ctx.paths.wu_dir())? {
        match load_wu(&path) {
            Ok(wu) => found.push((id, wu)),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping unparsable WU file"),
        }
    }
    Ok(found)
}

/// Stage the backlog, status, and checksum writes for a (possibly
/// tentative) store state.
///
/// `disk` lets the caller pass a pre-computed listing; `None` reads the WU
/// directory fresh.
pub fn stage_projections(
    ctx: &EngineCtx,
    tx: &mut Transaction,
    state: &StoreState,
    disk: Option<Vec<(WuId, WorkUnit)>>,
) -> Result<(), EngineError> {
    let disk = match disk {
        Some(d) => d,
        None => disk_work_units(ctx)?,
    };

    let backlog = render_backlog(state, &disk);
    tx.stage(ctx.paths.backlog_path(), backlog.into_bytes(), "backlog projection");

    let status = render_status(state);
    tx.stage(ctx.paths.status_path(), status.into_bytes(), "status projection");

    let digest = checksum(state);
    tx.stage(
        ctx.paths.state_dir().join(CHECKSUM_FILE),
        format!("{digest}\n").into_bytes(),
        "projection checksum",
    );

    Ok(())
}

/// Render and commit the projections on their own (init, recover flows).
pub fn write_projections(ctx: &EngineCtx, state: &StoreState) -> Result<(), EngineError> {
    let mut tx = Transaction::anonymous();
    stage_projections(ctx, &mut tx, state, None)?;
    tx.commit().map_err(|failure| EngineError::Transaction {
        failed: failure
            .failed
            .iter()
            .map(|(p, e)| format!("{}: {e}", p.display()))
            .collect(),
        restored: failure.restored,
    })?;
    Ok(())
}

/// Read the checksum recorded at the last projection, if any.
pub fn last_projection_checksum(ctx: &EngineCtx) -> Option<String> {
    std::fs::read_to_string(ctx.paths.state_dir().join(CHECKSUM_FILE))
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
