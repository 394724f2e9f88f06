// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status projection: a small per-status overview rendered beside the
//! backlog.

use crate::state::StoreState;
use lf_core::WuStatus;

/// Render the status document.
pub fn render_status(state: &StoreState) -> String {
    let mut out = String::from("# Status\n\n");

    out.push_str("| Status | Count |\n|--------|-------|\n");
    for status in WuStatus::all() {
        let count = state.by_status(status).count();
        out.push_str(&format!("| {status} | {count} |\n"));
    }

    out.push_str("\n## In Progress\n\n");
    let mut any = false;
    for id in state.by_status(WuStatus::InProgress) {
        if let Some(wu) = state.get(id) {
            let mode = wu
                .claimed_mode
                .map(|m| m.to_string())
                .unwrap_or_else(|| "-".to_string());
            out.push_str(&format!("- {id} — {} ({}, {mode})\n", wu.title, wu.lane));
            any = true;
        }
    }
    if !any {
        out.push_str("_Nothing in progress._\n");
    }

    out
}

#[cfg(test)]
#[path = "status_doc_tests.rs"]
mod tests;
