// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `lf state ...`: engine state inspection.

use crate::context::CliCtx;
use crate::output::print_result;
use clap::Subcommand;
use lf_engine::run_doctor;
use std::process::ExitCode;

#[derive(Subcommand)]
pub enum StateCommand {
    /// Integrity checks across store, files, locks, and markers
    Doctor,
    /// Show the cloud-mode decision for this invocation
    Cloud,
}

pub async fn run(command: StateCommand, cli: CliCtx) -> anyhow::Result<ExitCode> {
    match command {
        StateCommand::Doctor => doctor(cli),
        StateCommand::Cloud => cloud(cli),
    }
}

fn doctor(cli: CliCtx) -> anyhow::Result<ExitCode> {
    let store = cli.open_store()?;
    let locks = cli.lock_manager();
    let report = run_doctor(&cli.ctx, &store, &locks)?;

    if report.is_clean() {
        print_result(
            cli.format,
            "state is healthy",
            serde_json::json!({ "healthy": true, "findings": [] }),
        );
        Ok(ExitCode::SUCCESS)
    } else {
        let text = report
            .findings
            .iter()
            .map(|f| match f.wu_id {
                Some(id) => format!("  [{id}] {}", f.message),
                None => format!("  {}", f.message),
            })
            .collect::<Vec<_>>()
            .join("\n");
        print_result(
            cli.format,
            &format!("{} finding(s):\n{text}", report.findings.len()),
            serde_json::to_value(&report).unwrap_or_default(),
        );
        Ok(ExitCode::from(2))
    }
}

fn cloud(cli: CliCtx) -> anyhow::Result<ExitCode> {
    print_result(
        cli.format,
        &format!(
            "cloud mode {} ({})",
            if cli.cloud.active { "active" } else { "inactive" },
            cli.cloud.reason.code(),
        ),
        serde_json::json!({
            "active": cli.cloud.active,
            "reason": cli.cloud.reason.code(),
        }),
    );
    Ok(ExitCode::SUCCESS)
}
