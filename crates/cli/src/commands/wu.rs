// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `lf wu ...`: the work unit lifecycle verbs.

use crate::context::{git, CliCtx};
use crate::output::print_result;
use clap::{Args, Subcommand};
use lf_core::{ClaimMode, CivilDate, EventKind, EventRecord, Priority, WorkUnit, WuId, WuType};
use lf_engine::{
    block, checkpoint, claim, complete, edit, recover, release_wu, unblock, ClaimOptions,
    DoneOptions, WuEdit,
};
use lf_storage::{list_wu_files, load_wu, save_wu, CheckpointOpts};
use std::process::ExitCode;

#[derive(Subcommand)]
pub enum WuCommand {
    /// Create a new work unit
    Create(CreateArgs),
    /// Claim a ready work unit
    Claim(ClaimArgs),
    /// Edit work unit spec fields
    Edit(EditArgs),
    /// Complete a work unit (merge pipeline)
    Done(DoneArgs),
    /// Mark a work unit blocked
    Block(BlockArgs),
    /// Unblock a blocked work unit
    Unblock(IdArgs),
    /// Release (abandon) a work unit
    Release(ReleaseArgs),
    /// Roll forward after failed completions
    Recover(RecoverArgs),
    /// Record a progress checkpoint
    Checkpoint(CheckpointArgs),
    /// Validate work unit spec files
    Validate(ValidateArgs),
    /// Record delegated work (parent → target)
    Spawn(SpawnArgs),
}

#[derive(Args)]
pub struct CreateArgs {
    #[arg(long)]
    title: String,
    /// Lane in `<Domain>: <Lane>` form
    #[arg(long)]
    lane: String,
    #[arg(long = "type", value_enum, default_value = "feature")]
    wu_type: WuTypeArg,
    #[arg(long, value_enum, default_value = "p2")]
    priority: PriorityArg,
    /// Explicit id (`WU-<n>`); defaults to the next free number
    #[arg(long)]
    id: Option<WuId>,
}

#[derive(Args)]
pub struct IdArgs {
    #[arg(long)]
    id: WuId,
}

#[derive(Args)]
pub struct ClaimArgs {
    #[arg(long)]
    id: WuId,
    /// Claim into a dedicated lane worktree
    #[arg(long, conflicts_with = "micro")]
    worktree: bool,
    /// Claim into a short-lived micro worktree
    #[arg(long)]
    micro: bool,
    #[arg(long)]
    session: Option<String>,
}

#[derive(Args)]
pub struct EditArgs {
    #[arg(long)]
    id: WuId,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    lane: Option<String>,
    #[arg(long = "type", value_enum)]
    wu_type: Option<WuTypeArg>,
    #[arg(long, value_enum)]
    priority: Option<PriorityArg>,
    #[arg(long)]
    phase: Option<String>,
    /// Initiative name; empty string clears it
    #[arg(long)]
    initiative: Option<String>,
    #[arg(long)]
    notes: Option<String>,
    #[arg(long)]
    plan: Option<String>,
    #[arg(long = "add-acceptance")]
    add_acceptance: Vec<String>,
    #[arg(long = "add-code-path")]
    add_code_paths: Vec<String>,
}

#[derive(Args)]
pub struct DoneArgs {
    #[arg(long)]
    id: WuId,
    /// Skip the merge; requires --pr as completion evidence
    #[arg(long)]
    no_merge: bool,
    /// PR URL recorded as completion evidence
    #[arg(long)]
    pr: Option<String>,
    #[arg(long)]
    dry_run: bool,
    /// Skip done-completeness checks (never transition legality)
    #[arg(long)]
    force: bool,
}

#[derive(Args)]
pub struct BlockArgs {
    #[arg(long)]
    id: WuId,
    #[arg(long)]
    reason: String,
}

#[derive(Args)]
pub struct ReleaseArgs {
    #[arg(long)]
    id: WuId,
    #[arg(long)]
    reason: Option<String>,
}

#[derive(Args)]
pub struct RecoverArgs {
    #[arg(long)]
    id: WuId,
    #[arg(long)]
    force: bool,
}

#[derive(Args)]
pub struct CheckpointArgs {
    #[arg(long)]
    id: WuId,
    #[arg(long)]
    note: String,
    #[arg(long)]
    session: Option<String>,
    #[arg(long)]
    progress: Option<String>,
    #[arg(long)]
    next_steps: Option<String>,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Validate one WU instead of all of them
    #[arg(long)]
    id: Option<WuId>,
}

#[derive(Args)]
pub struct SpawnArgs {
    /// Parent work unit doing the delegating
    #[arg(long)]
    from: WuId,
    /// Target work unit being delegated
    #[arg(long)]
    to: WuId,
    #[arg(long)]
    intent: Option<String>,
}

// clap value_enum wrappers over the core enums
#[derive(Clone, Copy, clap::ValueEnum)]
pub enum WuTypeArg {
    Feature,
    Bug,
    Refactor,
    Documentation,
    Chore,
    Spike,
}

impl From<WuTypeArg> for WuType {
    fn from(value: WuTypeArg) -> Self {
        match value {
            WuTypeArg::Feature => WuType::Feature,
            WuTypeArg::Bug => WuType::Bug,
            WuTypeArg::Refactor => WuType::Refactor,
            WuTypeArg::Documentation => WuType::Documentation,
            WuTypeArg::Chore => WuType::Chore,
            WuTypeArg::Spike => WuType::Spike,
        }
    }
}

#[derive(Clone, Copy, clap::ValueEnum)]
pub enum PriorityArg {
    P0,
    P1,
    P2,
    P3,
}

impl From<PriorityArg> for Priority {
    fn from(value: PriorityArg) -> Self {
        match value {
            PriorityArg::P0 => Priority::P0,
            PriorityArg::P1 => Priority::P1,
            PriorityArg::P2 => Priority::P2,
            PriorityArg::P3 => Priority::P3,
        }
    }
}

pub async fn run(command: WuCommand, cli: CliCtx) -> anyhow::Result<ExitCode> {
    match command {
        WuCommand::Create(args) => create(args, &cli),
        WuCommand::Claim(args) => do_claim(args, &cli).await,
        WuCommand::Edit(args) => do_edit(args, &cli),
        WuCommand::Done(args) => done(args, &cli).await,
        WuCommand::Block(args) => do_block(args, &cli),
        WuCommand::Unblock(args) => do_unblock(args, &cli).await,
        WuCommand::Release(args) => do_release(args, &cli),
        WuCommand::Recover(args) => do_recover(args, &cli),
        WuCommand::Checkpoint(args) => do_checkpoint(args, &cli),
        WuCommand::Validate(args) => validate(args, &cli),
        WuCommand::Spawn(args) => spawn(args, &cli),
    }
}

fn create(args: CreateArgs, cli: &CliCtx) -> anyhow::Result<ExitCode> {
    let ctx = &cli.ctx;
    let mut store = cli.open_store()?;

    let id = match args.id {
        Some(id) => id,
        None => next_free_id(cli)?,
    };
    if ctx.paths.wu_path(id).exists() {
        anyhow::bail!("{id} already exists at {}", ctx.paths.wu_path(id).display());
    }

    let mut wu = WorkUnit::new(id, args.title, args.lane, CivilDate::from_utc(&ctx.now()));
    wu.wu_type = args.wu_type.into();
    wu.priority = args.priority.into();

    let problems = wu.validate();
    if !problems.is_empty() {
        return Err(lf_engine::EngineError::Validation {
            wu_id: Some(id),
            problems,
        }
        .into());
    }

    save_wu(&ctx.paths.wu_path(id), &wu)?;
    store.append(EventRecord::new(
        id,
        EventKind::Created {
            title: wu.title.clone(),
            lane: wu.lane.clone(),
            created: Some(wu.created),
        },
        ctx.now(),
        ctx.actor.clone(),
    ))?;
    lf_engine::write_projections(ctx, store.state())?;

    print_result(
        cli.format,
        &format!("created {id} — {}", wu.title),
        serde_json::json!({
            "wu_id": id.to_string(),
            "file": ctx.paths.wu_path(id).display().to_string(),
        }),
    );
    Ok(ExitCode::SUCCESS)
}

fn next_free_id(cli: &CliCtx) -> anyhow::Result<WuId> {
    let store = cli.open_store()?;
    let mut max = 0;
    for (id, _) in list_wu_files(&cli.ctx.paths.wu_dir())? {
        max = max.max(id.number());
    }
    for id in store.state().ids() {
        max = max.max(id.number());
    }
    WuId::new(max + 1).ok_or_else(|| anyhow::anyhow!("id overflow"))
}

async fn do_claim(args: ClaimArgs, cli: &CliCtx) -> anyhow::Result<ExitCode> {
    let mut store = cli.open_store()?;
    let locks = cli.lock_manager();
    let mut registry = cli.open_spawn_registry()?;

    let mode = if args.worktree {
        ClaimMode::Worktree
    } else if args.micro {
        ClaimMode::MicroWorktree
    } else {
        ClaimMode::Inline
    };
    let git = git();
    let git_ref: Option<&dyn lf_adapters::GitAdapter> = match mode {
        ClaimMode::Inline => None,
        _ => Some(&git),
    };

    let outcome = claim(
        &cli.ctx,
        &mut store,
        &locks,
        git_ref,
        Some(&mut registry),
        args.id,
        ClaimOptions {
            mode,
            session: args.session,
            wait: None,
        },
    )
    .await?;

    print_result(
        cli.format,
        &format!("claimed {} on `{}` ({})", outcome.wu_id, outcome.lane, outcome.mode),
        serde_json::json!({
            "wu_id": outcome.wu_id.to_string(),
            "lane": outcome.lane,
            "mode": outcome.mode.to_string(),
            "worktree": outcome.worktree_path.as_ref().map(|p| p.display().to_string()),
        }),
    );
    Ok(ExitCode::SUCCESS)
}

fn do_edit(args: EditArgs, cli: &CliCtx) -> anyhow::Result<ExitCode> {
    let mut store = cli.open_store()?;

    let changes = WuEdit {
        title: args.title,
        lane: args.lane,
        wu_type: args.wu_type.map(Into::into),
        priority: args.priority.map(Into::into),
        phase: args.phase.map(none_if_empty),
        initiative: args.initiative.map(none_if_empty),
        notes: args.notes.map(none_if_empty),
        plan: args.plan.map(none_if_empty),
        add_acceptance: args.add_acceptance,
        add_code_paths: args.add_code_paths,
    };
    edit(&cli.ctx, &mut store, args.id, changes)?;

    print_result(
        cli.format,
        &format!("edited {}", args.id),
        serde_json::json!({ "wu_id": args.id.to_string() }),
    );
    Ok(ExitCode::SUCCESS)
}

fn none_if_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

async fn done(args: DoneArgs, cli: &CliCtx) -> anyhow::Result<ExitCode> {
    let mut store = cli.open_store()?;
    let locks = cli.lock_manager();
    let git = git();

    let outcome = complete(
        &cli.ctx,
        &mut store,
        &locks,
        &git,
        args.id,
        DoneOptions {
            no_merge: args.no_merge,
            pr_url: args.pr,
            dry_run: args.dry_run,
            force: args.force,
        },
    )
    .await?;

    let text = if outcome.dry_run {
        format!("{} is ready to complete (dry run)", outcome.wu_id)
    } else {
        match &outcome.merge_commit {
            Some(commit) => format!("{} done, merged as {commit}", outcome.wu_id),
            None => format!("{} done (no merge)", outcome.wu_id),
        }
    };
    print_result(
        cli.format,
        &text,
        serde_json::json!({
            "wu_id": outcome.wu_id.to_string(),
            "merge_commit": outcome.merge_commit,
            "pr_url": outcome.pr_url,
            "dry_run": outcome.dry_run,
        }),
    );
    Ok(ExitCode::SUCCESS)
}

fn do_block(args: BlockArgs, cli: &CliCtx) -> anyhow::Result<ExitCode> {
    let mut store = cli.open_store()?;
    let locks = cli.lock_manager();
    block(&cli.ctx, &mut store, &locks, args.id, &args.reason)?;
    print_result(
        cli.format,
        &format!("blocked {}: {}", args.id, args.reason),
        serde_json::json!({ "wu_id": args.id.to_string(), "reason": args.reason }),
    );
    Ok(ExitCode::SUCCESS)
}

async fn do_unblock(args: IdArgs, cli: &CliCtx) -> anyhow::Result<ExitCode> {
    let mut store = cli.open_store()?;
    let locks = cli.lock_manager();
    unblock(&cli.ctx, &mut store, &locks, args.id).await?;
    print_result(
        cli.format,
        &format!("unblocked {}", args.id),
        serde_json::json!({ "wu_id": args.id.to_string() }),
    );
    Ok(ExitCode::SUCCESS)
}

fn do_release(args: ReleaseArgs, cli: &CliCtx) -> anyhow::Result<ExitCode> {
    let mut store = cli.open_store()?;
    let locks = cli.lock_manager();
    release_wu(&cli.ctx, &mut store, &locks, args.id, args.reason)?;
    print_result(
        cli.format,
        &format!("released {}", args.id),
        serde_json::json!({ "wu_id": args.id.to_string() }),
    );
    Ok(ExitCode::SUCCESS)
}

fn do_recover(args: RecoverArgs, cli: &CliCtx) -> anyhow::Result<ExitCode> {
    let mut store = cli.open_store()?;
    let outcome = recover(&cli.ctx, &mut store, args.id, args.force)?;
    print_result(
        cli.format,
        &format!(
            "recovered {} after {} failed attempt(s); refreshed {}",
            outcome.wu_id,
            outcome.attempts,
            outcome.refreshed.join(", "),
        ),
        serde_json::json!({
            "wu_id": outcome.wu_id.to_string(),
            "attempts": outcome.attempts,
            "refreshed": outcome.refreshed,
        }),
    );
    Ok(ExitCode::SUCCESS)
}

fn do_checkpoint(args: CheckpointArgs, cli: &CliCtx) -> anyhow::Result<ExitCode> {
    let mut store = cli.open_store()?;
    checkpoint(
        &cli.ctx,
        &mut store,
        args.id,
        &args.note,
        CheckpointOpts {
            session: args.session,
            progress: args.progress,
            next_steps: args.next_steps,
        },
    )?;
    print_result(
        cli.format,
        &format!("checkpoint recorded for {}", args.id),
        serde_json::json!({ "wu_id": args.id.to_string() }),
    );
    Ok(ExitCode::SUCCESS)
}

fn validate(args: ValidateArgs, cli: &CliCtx) -> anyhow::Result<ExitCode> {
    let ctx = &cli.ctx;
    let targets: Vec<(WuId, std::path::PathBuf)> = match args.id {
        Some(id) => vec![(id, ctx.paths.wu_path(id))],
        None => list_wu_files(&ctx.paths.wu_dir())?,
    };

    let mut problems: Vec<(WuId, String)> = Vec::new();
    for (id, path) in &targets {
        match load_wu(path) {
            Ok(wu) => {
                for problem in wu.validate() {
                    problems.push((*id, problem));
                }
            }
            Err(e) => problems.push((*id, e.to_string())),
        }
    }

    if problems.is_empty() {
        print_result(
            cli.format,
            &format!("{} work unit file(s) valid", targets.len()),
            serde_json::json!({ "checked": targets.len(), "problems": [] }),
        );
        Ok(ExitCode::SUCCESS)
    } else {
        let listed: Vec<serde_json::Value> = problems
            .iter()
            .map(|(id, p)| serde_json::json!({ "wu_id": id.to_string(), "problem": p }))
            .collect();
        print_result(
            cli.format,
            &problems
                .iter()
                .map(|(id, p)| format!("{id}: {p}"))
                .collect::<Vec<_>>()
                .join("\n"),
            serde_json::json!({ "checked": targets.len(), "problems": listed }),
        );
        Ok(ExitCode::from(1))
    }
}

fn spawn(args: SpawnArgs, cli: &CliCtx) -> anyhow::Result<ExitCode> {
    let mut registry = cli.open_spawn_registry()?;
    registry.record_spawn(args.from, args.to, args.intent.clone(), cli.ctx.now())?;
    print_result(
        cli.format,
        &format!("recorded spawn {} → {}", args.from, args.to),
        serde_json::json!({
            "parent": args.from.to_string(),
            "target": args.to.to_string(),
            "intent": args.intent,
        }),
    );
    Ok(ExitCode::SUCCESS)
}
