// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The completion pipeline: metadata transaction, lane-branch commit, and
//! the scratch-worktree merge to the trunk, with bounded retries and
//! state-driven rollback.
//!
//! The trunk checkout is never dirtied: the merge happens in a short-lived
//! scratch worktree created off the remote trunk tip, and the local trunk
//! only fast-forwards at the very end (best effort). The completed event is
//! appended only after the push lands, so a rolled-back run leaves the log
//! exactly as it was and a re-run is legal.

use crate::context::EngineCtx;
use crate::error::EngineError;
use crate::lock::{Acquire, AcquireOpts, LockManager, LockResource};
use crate::projection::stage_projections;
use crate::recovery;
use crate::rollback::{compute_rollback_scope, execute_rollback, RollbackActions};
use crate::transaction::{verify_post_commit, CommitIntent, FsSnapshot, Transaction};
use lf_adapters::GitAdapter;
use lf_core::{EventKind, EventRecord, WuId, WuStatus};
use lf_storage::{load_wu, serialize_stamp, serialize_wu, EventStore, Stamp};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Where in the pipeline a run is (or failed).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Validating,
    Gating,
    Preparing,
    Committing,
    Merging,
    Pushing,
    CleaningUp,
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineState::Validating => write!(f, "validating"),
            PipelineState::Gating => write!(f, "gating"),
            PipelineState::Preparing => write!(f, "preparing"),
            PipelineState::Committing => write!(f, "committing"),
            PipelineState::Merging => write!(f, "merging"),
            PipelineState::Pushing => write!(f, "pushing"),
            PipelineState::CleaningUp => write!(f, "cleaningUp"),
        }
    }
}

/// Options for `wu done`.
#[derive(Debug, Clone, Default)]
pub struct DoneOptions {
    /// Complete the metadata only; requires a PR URL unless forced.
    pub no_merge: bool,
    pub pr_url: Option<String>,
    /// Validate and prepare, then stop before writing anything.
    pub dry_run: bool,
    /// Skip done-completeness (never transition legality).
    pub force: bool,
}

/// Successful completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoneOutcome {
    pub wu_id: WuId,
    pub merge_commit: Option<String>,
    pub pr_url: Option<String>,
    pub dry_run: bool,
}

/// Mutable run bookkeeping; drives the rollback scope on failure.
struct Run {
    failed_at: Option<PipelineState>,
    snapshot: Option<FsSnapshot>,
    pre_commit_sha: Option<String>,
    scratch_path: Option<PathBuf>,
    scratch_branch: Option<String>,
    lane_workdir: PathBuf,
}

/// Complete a WU: the full pipeline, or the metadata-only path under
/// `--no-merge`.
pub async fn complete(
    ctx: &EngineCtx,
    store: &mut EventStore,
    locks: &LockManager,
    git: &dyn GitAdapter,
    wu_id: WuId,
    opts: DoneOptions,
) -> Result<DoneOutcome, EngineError> {
    let mut run = Run {
        failed_at: None,
        snapshot: None,
        pre_commit_sha: None,
        scratch_path: None,
        scratch_branch: None,
        lane_workdir: ctx.paths.root().to_path_buf(),
    };

    let result = run_pipeline(&mut run, ctx, store, locks, git, wu_id, &opts).await;

    match result {
        Ok(outcome) => Ok(outcome),
        Err(e) => {
            let scope = compute_rollback_scope(run.failed_at);
            let notes = execute_rollback(
                scope,
                RollbackActions {
                    snapshot: run.snapshot.as_ref(),
                    git,
                    repo_root: ctx.paths.root(),
                    lane_workdir: &run.lane_workdir,
                    pre_commit_sha: run.pre_commit_sha.as_deref(),
                    scratch_worktree: run.scratch_path.as_deref(),
                },
            )
            .await;
            for note in notes {
                warn!(%wu_id, note, "rollback note");
            }

            // A refused attempt (exhaustion) is not a new failure.
            if !matches!(e, EngineError::RecoveryExhaustion { .. }) {
                if let Err(marker_err) = recovery::record_failure(ctx, wu_id) {
                    warn!(%wu_id, error = %marker_err, "could not record failed attempt");
                }
            }
            Err(e)
        }
    }
}

#[allow(clippy::too_many_lines)]
async fn run_pipeline(
    run: &mut Run,
    ctx: &EngineCtx,
    store: &mut EventStore,
    locks: &LockManager,
    git: &dyn GitAdapter,
    wu_id: WuId,
    opts: &DoneOptions,
) -> Result<DoneOutcome, EngineError> {
    let root = ctx.paths.root().to_path_buf();
    let trunk = ctx.trunk().to_string();

    // ── validating ───────────────────────────────────────────────────────
    run.failed_at = Some(PipelineState::Validating);

    let wu = load_wu(&ctx.paths.wu_path(wu_id))?;
    let state = store
        .get_state(wu_id)
        .ok_or(lf_storage::StoreError::UnknownWu(wu_id))?
        .clone();

    if state.status == WuStatus::Done {
        if let Some(worktree) = state.worktree_path.as_ref().filter(|p| p.is_dir()) {
            return Err(EngineError::Zombie {
                wu_id,
                worktree: worktree.clone(),
            });
        }
    }
    if !state.status.can_transition(WuStatus::Done) {
        return Err(EngineError::StateTransition {
            wu_id,
            from: state.status,
            to: WuStatus::Done,
        });
    }

    recovery::ensure_attempts_remaining(ctx, wu_id)?;

    if !opts.force {
        let problems = wu.done_blockers();
        if !problems.is_empty() {
            return Err(EngineError::Validation {
                wu_id: Some(wu_id),
                problems,
            });
        }
        if opts.no_merge && opts.pr_url.is_none() {
            return Err(EngineError::Validation {
                wu_id: Some(wu_id),
                problems: vec![
                    "--no-merge completion needs --pr <url> as completion evidence".to_string(),
                ],
            });
        }
    }

    run.lane_workdir = state
        .worktree_path
        .clone()
        .filter(|p| p.is_dir())
        .unwrap_or_else(|| root.clone());

    if !opts.no_merge {
        trunk_behind_guard(ctx, git, &root, &trunk).await?;
    }

    // ── gating ───────────────────────────────────────────────────────────
    run.failed_at = Some(PipelineState::Gating);
    debug!(%wu_id, "no gate hooks configured");

    // ── preparing ────────────────────────────────────────────────────────
    run.failed_at = Some(PipelineState::Preparing);

    let mut updated = wu.clone();
    updated.status = WuStatus::Done;

    let stamp = Stamp {
        id: wu_id,
        completed_at: ctx.now(),
        lane: wu.lane.clone(),
        actor: ctx.actor.clone(),
        merge_commit: None,
        pr_url: opts.pr_url.clone(),
    };

    // Tentative event, for rendering the projections the way they will
    // look once the completion lands.
    let tentative = EventRecord::new(
        wu_id,
        EventKind::Completed {
            merge_commit: None,
            pr_url: opts.pr_url.clone(),
        },
        ctx.now(),
        ctx.actor.clone(),
    );
    let mut tentative_state = store.state().clone();
    tentative_state.apply_event(&tentative);

    let wu_path = ctx.paths.wu_path(wu_id);
    let stamp_path = ctx.paths.stamp_path(wu_id);
    let mut tx = Transaction::new(wu_id);
    tx.stage(&wu_path, serialize_wu(&updated)?.into_bytes(), "WU file");
    tx.stage(&stamp_path, serialize_stamp(&stamp)?.into_bytes(), "stamp");
    stage_projections(ctx, &mut tx, &tentative_state, None)?;

    let intent = CommitIntent {
        wu_id,
        status: WuStatus::Done,
        wu_path: wu_path.clone(),
        backlog_path: Some(ctx.paths.backlog_path()),
        stamp_path: Some(stamp_path.clone()),
    };
    let problems = tx.validate(&intent);
    if !problems.is_empty() {
        return Err(EngineError::Validation {
            wu_id: Some(wu_id),
            problems,
        });
    }

    if opts.dry_run {
        return Ok(DoneOutcome {
            wu_id,
            merge_commit: None,
            pr_url: opts.pr_url.clone(),
            dry_run: true,
        });
    }

    // ── committing ───────────────────────────────────────────────────────
    run.failed_at = Some(PipelineState::Committing);

    if !opts.no_merge {
        run.pre_commit_sha = Some(git.get_commit_hash(&run.lane_workdir, "HEAD").await?);
    }

    let receipt = tx.commit().map_err(|failure| EngineError::Transaction {
        failed: failure
            .failed
            .iter()
            .map(|(p, e)| format!("{}: {e}", p.display()))
            .collect(),
        restored: failure.restored,
    })?;
    run.snapshot = Some(receipt.snapshot);

    let problems = verify_post_commit(&intent);
    if !problems.is_empty() {
        return Err(EngineError::Transaction {
            failed: problems,
            restored: false,
        });
    }

    let merge_commit = if opts.no_merge {
        None
    } else {
        commit_metadata(ctx, run, git, wu_id, &wu.title, &trunk).await?;

        // ── merging / pushing ────────────────────────────────────────────
        let lane_ref = match state.worktree_path.as_ref().filter(|p| p.is_dir()) {
            Some(_) => ctx.lane_branch(&wu.lane),
            None => trunk.clone(),
        };
        let merged = merge_and_push(run, ctx, locks, git, wu_id, &lane_ref, &trunk).await;
        // The scratch worktree and branch go away no matter what.
        cleanup_scratch(run, git, &root).await;
        Some(merged?)
    };

    // ── cleaningUp ───────────────────────────────────────────────────────
    run.failed_at = Some(PipelineState::CleaningUp);

    store.append(EventRecord::new(
        wu_id,
        EventKind::Completed {
            merge_commit: merge_commit.clone(),
            pr_url: opts.pr_url.clone(),
        },
        ctx.now(),
        ctx.actor.clone(),
    ))?;

    if let Err(e) = recovery::clear_attempts(ctx, wu_id) {
        warn!(%wu_id, error = %e, "could not clear recovery marker");
    }
    // The claim is over; free the lane for the next WU.
    locks.release_for_wu(&LockResource::lane(wu.lane.clone()), wu_id);
    // Passive lane telemetry; consumers subscribe to the log stream.
    info!(lane = %wu.lane, %wu_id, "lane completion");

    Ok(DoneOutcome {
        wu_id,
        merge_commit,
        pr_url: opts.pr_url.clone(),
        dry_run: false,
    })
}

/// Fail-open probe: is the local trunk behind its remote?
async fn trunk_behind_guard(
    _ctx: &EngineCtx,
    git: &dyn GitAdapter,
    root: &Path,
    trunk: &str,
) -> Result<(), EngineError> {
    match git.fetch(root, "origin", trunk).await {
        Ok(()) => {}
        Err(e) if e.is_network() => {
            warn!(error = %e, "trunk probe could not reach the remote, continuing");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }

    let remote_ref = format!("origin/{trunk}");
    let (local, remote) = match (
        git.get_commit_hash(root, trunk).await,
        git.get_commit_hash(root, &remote_ref).await,
    ) {
        (Ok(l), Ok(r)) => (l, r),
        _ => {
            warn!("trunk probe could not resolve refs, continuing");
            return Ok(());
        }
    };
    if local == remote {
        return Ok(());
    }

    match git.merge_base(root, trunk, &remote_ref).await {
        Ok(base) if base == local => Err(EngineError::Validation {
            wu_id: None,
            problems: vec![format!(
                "local `{trunk}` is behind `{remote_ref}`; fast-forward it first"
            )],
        }),
        _ => Ok(()),
    }
}

/// Stage the metadata files in the lane workdir, squash any previous failed
/// attempt, and create the bounded-length lane commit.
async fn commit_metadata(
    ctx: &EngineCtx,
    run: &Run,
    git: &dyn GitAdapter,
    wu_id: WuId,
    title: &str,
    trunk: &str,
) -> Result<(), EngineError> {
    let workdir = run.lane_workdir.clone();
    let root = ctx.paths.root();

    let rel_paths = [
        PathBuf::from(format!("wu/{wu_id}.yaml")),
        PathBuf::from("tasks/backlog.md"),
        PathBuf::from("tasks/status.md"),
    ];

    // Worktree claims get the freshly written metadata copied in, so the
    // lane branch carries it; inline claims already wrote in place.
    if workdir != root {
        for rel in &rel_paths {
            let src = root.join(rel);
            let dst = workdir.join(rel);
            if let Some(parent) = dst.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(&src, &dst)?;
        }
    }

    git.add(&workdir, &rel_paths).await?;
    squash_previous_attempts(git, &workdir, wu_id, trunk).await;

    let mut subject = format!("wu: complete {wu_id} — {title}");
    if subject.len() > 72 {
        let mut cut = 69;
        while cut > 0 && !subject.is_char_boundary(cut) {
            cut -= 1;
        }
        subject.truncate(cut);
        subject.push_str("...");
    }
    git.commit(&workdir, &subject).await?;
    Ok(())
}

/// One completion attempt is one commit: if an earlier failed attempt left
/// a completion commit on the branch, soft-reset past it first. Best
/// effort; a squash failure never fails the pipeline.
async fn squash_previous_attempts(git: &dyn GitAdapter, workdir: &Path, wu_id: WuId, trunk: &str) {
    let base = match git
        .merge_base(workdir, "HEAD", &format!("origin/{trunk}"))
        .await
    {
        Ok(base) if !base.is_empty() => base,
        _ => return,
    };
    let log = match git
        .raw(
            workdir,
            &[
                "log".to_string(),
                "--format=%H %s".to_string(),
                format!("{base}..HEAD"),
            ],
        )
        .await
    {
        Ok(log) => log,
        Err(_) => return,
    };

    // Oldest matching completion commit (log prints newest first).
    let marker = format!("wu: complete {wu_id}");
    let oldest = log
        .lines()
        .rev()
        .find(|line| line.split_once(' ').is_some_and(|(_, s)| s.starts_with(&marker)))
        .and_then(|line| line.split_once(' ').map(|(hash, _)| hash.to_string()));

    if let Some(hash) = oldest {
        let result = git
            .raw(
                workdir,
                &[
                    "reset".to_string(),
                    "--soft".to_string(),
                    format!("{hash}^"),
                ],
            )
            .await;
        match result {
            Ok(_) => debug!(%wu_id, hash, "squashed previous completion attempt"),
            Err(e) => warn!(%wu_id, error = %e, "squash skipped"),
        }
    }
}

/// The merge+push loop under the global merge lock.
async fn merge_and_push(
    run: &mut Run,
    ctx: &EngineCtx,
    locks: &LockManager,
    git: &dyn GitAdapter,
    wu_id: WuId,
    lane_ref: &str,
    trunk: &str,
) -> Result<String, EngineError> {
    run.failed_at = Some(PipelineState::Merging);

    let root = ctx.paths.root().to_path_buf();
    let merge_opts = AcquireOpts {
        wait: Some(std::time::Duration::from_millis(
            ctx.config.engine.merge_lock_wait_ms,
        )),
        ..Default::default()
    };
    let lock = locks.acquire(&LockResource::Merge, wu_id, &merge_opts).await;
    let lock_id = match &lock {
        Acquire::Acquired { lock_id, .. } => lock_id.clone(),
        Acquire::Busy { held_by, .. } => {
            return Err(EngineError::LockBusy {
                resource: "merge".to_string(),
                held_by: *held_by,
            });
        }
        Acquire::Skipped { .. } => unreachable!("merge lock is never policy-skipped"),
    };

    let result = merge_and_push_locked(run, ctx, git, wu_id, lane_ref, trunk).await;
    locks.release(&LockResource::Merge, &lock_id);

    if result.is_ok() {
        // Bring the local trunk checkout up to the new remote tip; the
        // remote is already updated, so failure is only a warning.
        if let Err(e) = git.fetch(&root, "origin", trunk).await {
            warn!(error = %e, "post-merge fetch failed");
        } else if let Err(e) = git.merge(&root, &format!("origin/{trunk}"), true).await {
            warn!(error = %e, "local trunk fast-forward failed (remote is up to date)");
        }
    }
    result
}

async fn merge_and_push_locked(
    run: &mut Run,
    ctx: &EngineCtx,
    git: &dyn GitAdapter,
    wu_id: WuId,
    lane_ref: &str,
    trunk: &str,
) -> Result<String, EngineError> {
    let root = ctx.paths.root().to_path_buf();
    let remote_ref = format!("origin/{trunk}");
    let scratch_branch = format!("lumenflow/scratch-wu-{}", wu_id.number());
    let scratch_path = ctx
        .paths
        .worktrees_dir()
        .join(format!("scratch-wu-{}", wu_id.number()));

    // Scratch off the remote trunk tip. A stale tip is fine; the retry
    // loop absorbs it.
    if let Err(e) = git.fetch(&root, "origin", trunk).await {
        if e.is_network() {
            warn!(error = %e, "pre-merge fetch failed, using last-known remote tip");
        } else {
            return Err(e.into());
        }
    }
    if git
        .create_branch_no_checkout(&root, &scratch_branch, &remote_ref)
        .await
        .is_err()
    {
        // Leftover from an earlier crashed run; replace it.
        let _ = git
            .raw(
                &root,
                &["branch".to_string(), "-D".to_string(), scratch_branch.clone()],
            )
            .await;
        git.create_branch_no_checkout(&root, &scratch_branch, &remote_ref)
            .await?;
    }
    git.worktree_add_existing(&root, &scratch_path, &scratch_branch)
        .await?;
    run.scratch_branch = Some(scratch_branch.clone());
    run.scratch_path = Some(scratch_path.clone());

    let max_retries = ctx.config.engine.max_merge_retries;
    let mut merged = false;

    for attempt in 1..=max_retries {
        run.failed_at = Some(PipelineState::Merging);

        if !merged {
            match git.merge(&scratch_path, lane_ref, true).await {
                Ok(()) => merged = true,
                Err(e) if e.is_conflict() => {
                    let _ = git
                        .raw(&scratch_path, &["merge".to_string(), "--abort".to_string()])
                        .await;
                    return Err(EngineError::MergeConflict {
                        branch: lane_ref.to_string(),
                        detail: e.to_string(),
                    });
                }
                Err(e) => {
                    // The lane is not a descendant of the trunk tip, so no
                    // amount of refreshing the scratch alone can make this
                    // fast-forward: the scratch has no unique commits to
                    // rebase. Refresh to the latest remote tip, then take
                    // the lane in with a real merge.
                    debug!(attempt, error = %e, "fast-forward merge failed");
                    if attempt == max_retries {
                        return Err(EngineError::RetryExhaustion {
                            branch: lane_ref.to_string(),
                            attempts: max_retries,
                        });
                    }
                    refresh_scratch(git, &root, &scratch_path, trunk).await?;
                    match git.merge(&scratch_path, lane_ref, false).await {
                        Ok(()) => merged = true,
                        Err(e) if e.is_conflict() => {
                            let _ = git
                                .raw(
                                    &scratch_path,
                                    &["merge".to_string(), "--abort".to_string()],
                                )
                                .await;
                            return Err(EngineError::MergeConflict {
                                branch: lane_ref.to_string(),
                                detail: e.to_string(),
                            });
                        }
                        Err(e) => {
                            debug!(attempt, error = %e, "merge attempt failed");
                            continue;
                        }
                    }
                }
            }
        }

        run.failed_at = Some(PipelineState::Pushing);
        match git
            .push(&scratch_path, "origin", &format!("HEAD:refs/heads/{trunk}"))
            .await
        {
            Ok(()) => {
                let merge_commit = git.get_commit_hash(&scratch_path, "HEAD").await?;
                info!(%wu_id, attempt, merge_commit, "pushed to trunk");
                return Ok(merge_commit);
            }
            Err(e) if e.is_network() => {
                return Err(EngineError::Network {
                    operation: format!("push {scratch_branch} to {trunk}"),
                    detail: e.to_string(),
                });
            }
            Err(e) => {
                // A peer advanced the trunk between our fetch and push.
                debug!(attempt, error = %e, "push rejected");
                if attempt == max_retries {
                    return Err(EngineError::RetryExhaustion {
                        branch: lane_ref.to_string(),
                        attempts: max_retries,
                    });
                }
                run.failed_at = Some(PipelineState::Merging);
                refresh_scratch(git, &root, &scratch_path, trunk).await?;
            }
        }
    }

    Err(EngineError::RetryExhaustion {
        branch: lane_ref.to_string(),
        attempts: max_retries,
    })
}

/// Fetch the trunk and rebase the scratch branch onto the updated remote
/// tip. This absorbs peer pushes once the scratch carries the lane's
/// commits; a freshly created scratch has none and simply fast-forwards.
/// A rebase conflict is terminal.
async fn refresh_scratch(
    git: &dyn GitAdapter,
    root: &Path,
    scratch_path: &Path,
    trunk: &str,
) -> Result<(), EngineError> {
    if let Err(e) = git.fetch(root, "origin", trunk).await {
        if !e.is_network() {
            return Err(e.into());
        }
        warn!(error = %e, "between-attempt fetch failed");
    }
    match git.rebase(scratch_path, &format!("origin/{trunk}")).await {
        Ok(()) => Ok(()),
        Err(e) if e.is_conflict() => {
            let _ = git
                .raw(scratch_path, &["rebase".to_string(), "--abort".to_string()])
                .await;
            Err(EngineError::MergeConflict {
                branch: format!("origin/{trunk}"),
                detail: e.to_string(),
            })
        }
        Err(e) => Err(e.into()),
    }
}

/// Delete the scratch worktree and branch, success or failure.
async fn cleanup_scratch(run: &mut Run, git: &dyn GitAdapter, root: &Path) {
    if let Some(path) = run.scratch_path.take() {
        if let Err(e) = git.worktree_remove(root, &path).await {
            warn!(path = %path.display(), error = %e, "scratch worktree removal failed");
        }
    }
    if let Some(branch) = run.scratch_branch.take() {
        if let Err(e) = git
            .raw(root, &["branch".to_string(), "-D".to_string(), branch.clone()])
            .await
        {
            warn!(branch, error = %e, "scratch branch removal failed");
        }
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
