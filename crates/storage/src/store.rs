// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Event store facade: the log plus its projection.
//!
//! Writes validate the implied status transition against the state machine;
//! replay does not (the log is authoritative).

use crate::event_log::{EventLog, EventLogError};
use crate::state::{StoreState, WuState};
use chrono::{DateTime, Utc};
use lf_core::{ActorId, EventKind, EventRecord, WuId, WuStatus};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur in store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Log(#[from] EventLogError),
    #[error("illegal transition for {wu_id}: {from} → {to}")]
    IllegalTransition {
        wu_id: WuId,
        from: WuStatus,
        to: WuStatus,
    },
    #[error("unknown work unit {0}")]
    UnknownWu(WuId),
    #[error("work unit {0} already exists")]
    AlreadyExists(WuId),
}

/// Optional context for a checkpoint event.
#[derive(Debug, Clone, Default)]
pub struct CheckpointOpts {
    pub session: Option<String>,
    pub progress: Option<String>,
    pub next_steps: Option<String>,
}

/// The event log and its in-memory projection, loaded together.
pub struct EventStore {
    log: EventLog,
    state: StoreState,
}

impl EventStore {
    /// Open a store and replay the log at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let log = EventLog::new(path);
        let mut state = StoreState::default();
        for record in log.read_all()? {
            state.apply_event(&record);
        }
        Ok(Self { log, state })
    }

    pub fn state(&self) -> &StoreState {
        &self.state
    }

    pub fn get_state(&self, id: WuId) -> Option<&WuState> {
        self.state.get(id)
    }

    pub fn by_status(&self, status: WuStatus) -> impl Iterator<Item = WuId> + '_ {
        self.state.by_status(status)
    }

    pub fn by_lane(&self, lane: &str) -> impl Iterator<Item = WuId> + '_ {
        self.state.by_lane(lane)
    }

    /// Validate, append, and project one event.
    pub fn append(&mut self, record: EventRecord) -> Result<(), StoreError> {
        self.check(&record)?;
        self.log.append(&record)?;
        self.state.apply_event(&record);
        Ok(())
    }

    /// Append a checkpoint note for a known WU. Cheap; status is untouched.
    pub fn checkpoint(
        &mut self,
        wu_id: WuId,
        note: impl Into<String>,
        opts: CheckpointOpts,
        timestamp: DateTime<Utc>,
        actor_id: Option<ActorId>,
    ) -> Result<(), StoreError> {
        let record = EventRecord::new(
            wu_id,
            EventKind::Checkpoint {
                note: note.into(),
                session: opts.session,
                progress: opts.progress,
                next_steps: opts.next_steps,
            },
            timestamp,
            actor_id,
        );
        self.append(record)
    }

    fn check(&self, record: &EventRecord) -> Result<(), StoreError> {
        let existing = self.state.get(record.wu_id);

        if matches!(record.kind, EventKind::Created { .. }) {
            return match existing {
                Some(_) => Err(StoreError::AlreadyExists(record.wu_id)),
                None => Ok(()),
            };
        }

        let Some(current) = existing else {
            return Err(StoreError::UnknownWu(record.wu_id));
        };

        if let Some(to) = record.kind.status_after() {
            if !current.status.can_transition(to) {
                return Err(StoreError::IllegalTransition {
                    wu_id: record.wu_id,
                    from: current.status,
                    to,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
