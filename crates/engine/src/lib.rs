// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! LumenFlow coordination engine: locks, transactions, the WU lifecycle,
//! and the atomic merge pipeline.

mod cloud;
mod context;
mod doctor;
mod error;
pub mod env;
mod gates;
mod initiative;
mod lifecycle;
mod lock;
mod pipeline;
mod projection;
mod recovery;
mod rollback;
#[cfg(test)]
mod test_helpers;
mod transaction;

pub use cloud::{detect_cloud_mode, CloudDecision, CloudReason};
pub use context::EngineCtx;
pub use doctor::{run_doctor, DoctorReport, Finding, FindingKind};
pub use error::EngineError;
pub use gates::{run_gates, GateReport};
pub use initiative::{load_initiative, stage_initiative_move, Initiative, InitiativeError};
pub use lifecycle::{
    block, checkpoint, claim, edit, release_wu, unblock, ClaimOptions, ClaimOutcome, WuEdit,
};
pub use lock::{
    Acquire, AcquireOpts, AuditError, BusyReason, LockInfo, LockManager, LockRecord, LockResource,
    ReclaimReason, Release,
};
pub use pipeline::{complete, DoneOptions, DoneOutcome, PipelineState};
pub use projection::{
    disk_work_units, last_projection_checksum, stage_projections, write_projections,
};
pub use recovery::{clear_attempts, read_attempts, record_failure, recover, RecoverOutcome};
pub use rollback::{compute_rollback_scope, execute_rollback, RollbackActions, RollbackScope};
pub use transaction::{
    verify_post_commit, CommitIntent, CommitReceipt, FsSnapshot, StagedWrite, Transaction,
    TransactionFailure,
};
