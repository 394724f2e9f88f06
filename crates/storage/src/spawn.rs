// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Delegated-work registry: parent → target spawn intents and their pickup
//! times, event-sourced like the WU log.

use crate::event_log::{append_line, read_jsonl, EventLogError};
use chrono::{DateTime, Utc};
use lf_core::WuId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur in spawn registry operations
#[derive(Debug, Error)]
pub enum SpawnRegistryError {
    #[error(transparent)]
    Log(#[from] EventLogError),
    #[error("no pending spawn for {0}")]
    NoPendingSpawn(WuId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum SpawnEvent {
    Spawned {
        parent: WuId,
        target: WuId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        intent: Option<String>,
        timestamp: DateTime<Utc>,
    },
    PickedUp {
        target: WuId,
        timestamp: DateTime<Utc>,
    },
}

/// Projected spawn relationship.
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnRecord {
    pub parent: WuId,
    pub target: WuId,
    pub intent: Option<String>,
    pub spawned_at: DateTime<Utc>,
    pub picked_up_at: Option<DateTime<Utc>>,
}

/// Append-only registry with O(1) queries by parent and by target.
pub struct SpawnRegistry {
    path: PathBuf,
    records: Vec<SpawnRecord>,
    by_parent: HashMap<WuId, Vec<usize>>,
    by_target: HashMap<WuId, Vec<usize>>,
}

impl SpawnRegistry {
    /// Open and replay the registry at `path`.
    pub fn open(path: &Path) -> Result<Self, SpawnRegistryError> {
        let mut registry = Self {
            path: path.to_path_buf(),
            records: Vec::new(),
            by_parent: HashMap::new(),
            by_target: HashMap::new(),
        };
        for event in read_jsonl::<SpawnEvent>(path)? {
            registry.apply(&event);
        }
        Ok(registry)
    }

    /// Record a parent → target delegation intent.
    pub fn record_spawn(
        &mut self,
        parent: WuId,
        target: WuId,
        intent: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<(), SpawnRegistryError> {
        let event = SpawnEvent::Spawned {
            parent,
            target,
            intent,
            timestamp,
        };
        append_line(&self.path, &event)?;
        self.apply(&event);
        Ok(())
    }

    /// Record that the target of a pending spawn was picked up (claimed).
    pub fn record_pickup(
        &mut self,
        target: WuId,
        timestamp: DateTime<Utc>,
    ) -> Result<(), SpawnRegistryError> {
        let pending = self
            .by_target
            .get(&target)
            .into_iter()
            .flatten()
            .any(|&i| self.records[i].picked_up_at.is_none());
        if !pending {
            return Err(SpawnRegistryError::NoPendingSpawn(target));
        }

        let event = SpawnEvent::PickedUp { target, timestamp };
        append_line(&self.path, &event)?;
        self.apply(&event);
        Ok(())
    }

    /// All spawns issued by a parent, in issue order.
    pub fn spawned_by(&self, parent: WuId) -> Vec<&SpawnRecord> {
        self.by_parent
            .get(&parent)
            .into_iter()
            .flatten()
            .map(|&i| &self.records[i])
            .collect()
    }

    /// The most recent spawn targeting a WU, if any.
    pub fn spawn_for(&self, target: WuId) -> Option<&SpawnRecord> {
        self.by_target
            .get(&target)
            .and_then(|indices| indices.last())
            .map(|&i| &self.records[i])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn apply(&mut self, event: &SpawnEvent) {
        match event {
            SpawnEvent::Spawned {
                parent,
                target,
                intent,
                timestamp,
            } => {
                let index = self.records.len();
                self.records.push(SpawnRecord {
                    parent: *parent,
                    target: *target,
                    intent: intent.clone(),
                    spawned_at: *timestamp,
                    picked_up_at: None,
                });
                self.by_parent.entry(*parent).or_default().push(index);
                self.by_target.entry(*target).or_default().push(index);
            }
            SpawnEvent::PickedUp { target, timestamp } => {
                // Mark the oldest pending spawn for this target
                if let Some(indices) = self.by_target.get(target) {
                    for &i in indices {
                        if self.records[i].picked_up_at.is_none() {
                            self.records[i].picked_up_at = Some(*timestamp);
                            break;
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "spawn_tests.rs"]
mod tests;
