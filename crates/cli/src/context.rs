// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI-side context assembly: discover the repository, load config, build
//! the engine context, and settle the cloud-mode decision once per run.

use crate::output::OutputFormat;
use anyhow::{anyhow, Context as _};
use lf_adapters::{CliGitAdapter, GitAdapter, TracedGit};
use lf_core::{Config, LfPaths};
use lf_engine::{detect_cloud_mode, CloudDecision, CloudReason, EngineCtx, LockManager};
use lf_storage::{EventStore, SpawnRegistry};
use tracing::info;

/// Everything a command needs.
pub struct CliCtx {
    pub ctx: EngineCtx,
    pub format: OutputFormat,
    pub cloud: CloudDecision,
}

/// Discover the repository and build the context. The cloud decision is
/// computed here and explicit activation on a protected branch aborts.
pub async fn load(format: OutputFormat, cloud_flag: bool) -> anyhow::Result<CliCtx> {
    let cwd = std::env::current_dir().context("cannot resolve the current directory")?;
    let paths = LfPaths::discover(&cwd)
        .ok_or_else(|| anyhow!("no .lumenflow directory here or above; run `lf init` first"))?;
    let config = Config::load(&paths.config_path())?;
    let ctx = EngineCtx::new(paths, config);

    let cloud = settle_cloud(&ctx, cloud_flag).await?;

    Ok(CliCtx { ctx, format, cloud })
}

async fn settle_cloud(ctx: &EngineCtx, flag: bool) -> anyhow::Result<CloudDecision> {
    let env: std::collections::HashMap<String, String> = std::env::vars().collect();

    let branch = match git()
        .raw(
            ctx.paths.root(),
            &["rev-parse".to_string(), "--abbrev-ref".to_string(), "HEAD".to_string()],
        )
        .await
    {
        Ok(branch) => branch,
        Err(_) => String::new(),
    };

    let decision = detect_cloud_mode(
        flag,
        &env,
        &ctx.config.cloud,
        &branch,
        &ctx.config.engine.protected_branches,
    );

    match &decision.reason {
        CloudReason::ExplicitBlockedOnProtectedBranch => Err(anyhow!(
            "cloud mode was requested explicitly but `{branch}` is a protected branch"
        )),
        reason => {
            if decision.active {
                info!(reason = reason.code(), "cloud mode active");
            }
            Ok(decision)
        }
    }
}

impl CliCtx {
    pub fn open_store(&self) -> anyhow::Result<EventStore> {
        Ok(EventStore::open(&self.ctx.paths.events_path())?)
    }

    pub fn open_spawn_registry(&self) -> anyhow::Result<SpawnRegistry> {
        Ok(SpawnRegistry::open(&self.ctx.paths.spawn_registry_path())?)
    }

    pub fn lock_manager(&self) -> LockManager {
        LockManager::new(self.ctx.paths.lock_dir())
    }
}

/// The git capability every command shares.
pub fn git() -> TracedGit<CliGitAdapter> {
    TracedGit::new(CliGitAdapter::new())
}
