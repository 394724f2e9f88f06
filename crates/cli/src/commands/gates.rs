// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `lf gates`: regression gates over the store and projections.

use crate::context::CliCtx;
use crate::output::print_result;
use lf_engine::run_gates;
use std::process::ExitCode;

pub fn run(cli: CliCtx) -> anyhow::Result<ExitCode> {
    let store = cli.open_store()?;
    let report = run_gates(&cli.ctx, &store)?;

    if report.passed() {
        print_result(
            cli.format,
            &format!("gates passed (checksum {})", report.checksum),
            serde_json::json!({ "passed": true, "checksum": report.checksum, "problems": [] }),
        );
        Ok(ExitCode::SUCCESS)
    } else {
        print_result(
            cli.format,
            &format!(
                "gate regression:\n{}",
                report
                    .problems
                    .iter()
                    .map(|p| format!("  {p}"))
                    .collect::<Vec<_>>()
                    .join("\n")
            ),
            serde_json::json!({
                "passed": false,
                "checksum": report.checksum,
                "problems": report.problems,
            }),
        );
        // distinct exit code for a gate regression
        Ok(ExitCode::from(2))
    }
}
