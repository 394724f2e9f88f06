// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gates: the regression checks behind `lf gates`. Read-only; a non-empty
//! problem list is a distinct failure (exit 2 at the CLI).

use crate::context::EngineCtx;
use crate::error::EngineError;
use crate::projection::last_projection_checksum;
use lf_core::WuStatus;
use lf_storage::{check_consistency, checksum, list_wu_files, load_wu, EventStore};
use serde::Serialize;

/// Gate results: problems plus the current store checksum.
#[derive(Debug, Serialize)]
pub struct GateReport {
    pub problems: Vec<String>,
    pub checksum: String,
}

impl GateReport {
    pub fn passed(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Run the gates: every WU file must parse and validate, done WUs must be
/// stamped, the backlog must agree with the store, and the recorded
/// projection checksum must match the store.
pub fn run_gates(ctx: &EngineCtx, store: &EventStore) -> Result<GateReport, EngineError> {
    let mut problems = Vec::new();

    for (id, path) in list_wu_files(&ctx.paths.wu_dir())? {
        match load_wu(&path) {
            Ok(wu) => {
                for problem in wu.validate() {
                    problems.push(format!("{id}: {problem}"));
                }
            }
            Err(e) => problems.push(format!("{id}: {e}")),
        }
    }

    for id in store.by_status(WuStatus::Done) {
        if lf_storage::read_stamp(&ctx.paths.stamp_path(id)).is_err() {
            problems.push(format!("{id}: done without a readable stamp"));
        }
    }

    match std::fs::read_to_string(ctx.paths.backlog_path()) {
        Ok(document) => {
            for issue in check_consistency(&document, store.state()) {
                problems.push(format!(
                    "backlog: {} expected in {:?}, found in {:?}",
                    issue.wu_id, issue.expected_section, issue.found_section
                ));
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if !store.state().is_empty() {
                problems.push("backlog: document missing".to_string());
            }
        }
        Err(e) => return Err(e.into()),
    }

    let current = checksum(store.state());
    match last_projection_checksum(ctx) {
        Some(recorded) if recorded != current => {
            problems.push(format!(
                "projection drift: recorded checksum {recorded} != store {current}"
            ));
        }
        Some(_) => {}
        None => {
            if !store.state().is_empty() {
                problems.push("projection drift: no recorded checksum".to_string());
            }
        }
    }

    Ok(GateReport {
        problems,
        checksum: current,
    })
}

#[cfg(test)]
#[path = "gates_tests.rs"]
mod tests;
