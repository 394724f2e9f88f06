// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `lf init`: scaffold the engine-owned layout.

use crate::output::{print_result, OutputFormat};
use lf_core::{Config, LfPaths};
use lf_engine::{write_projections, EngineCtx};
use lf_storage::EventStore;
use std::process::ExitCode;

pub fn run(format: OutputFormat) -> anyhow::Result<ExitCode> {
    let root = std::env::current_dir()?;
    let paths = LfPaths::new(&root);

    std::fs::create_dir_all(paths.state_dir())?;
    std::fs::create_dir_all(paths.wu_dir())?;
    std::fs::create_dir_all(paths.tasks_dir())?;

    // Engine state never belongs on a branch.
    std::fs::write(paths.dot_dir().join(".gitignore"), "state/\nworktrees/\n")?;

    let config_path = paths.config_path();
    if !config_path.exists() {
        let config = Config::default();
        std::fs::write(&config_path, toml::to_string_pretty(&config)?)?;
    }

    // Render the (empty) projections so the documents exist from day one.
    let config = Config::load(&config_path)?;
    let ctx = EngineCtx::new(paths.clone(), config);
    let store = EventStore::open(&paths.events_path())?;
    write_projections(&ctx, store.state())?;

    print_result(
        format,
        &format!("initialized LumenFlow at {}", root.display()),
        serde_json::json!({
            "root": root.display().to_string(),
            "backlog": paths.backlog_path().display().to_string(),
        }),
    );
    Ok(ExitCode::SUCCESS)
}
