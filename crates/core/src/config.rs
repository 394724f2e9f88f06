// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration, loaded from `.lumenflow/config.toml`.
//!
//! Every knob has a default so a missing file (or an empty one) yields a
//! fully working configuration.

use crate::lane::LockPolicy;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Merge/recovery/locking knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Shared primary branch, protected from direct mutation.
    pub trunk: String,
    /// Branches on which cloud activation is blocked/suppressed.
    pub protected_branches: Vec<String>,
    /// Merge pipeline rebase-and-retry ceiling.
    pub max_merge_retries: u32,
    /// Failed-completion ceiling before manual intervention is required.
    pub max_recovery_attempts: u32,
    /// Lane lock wait budget in milliseconds.
    pub lane_lock_wait_ms: u64,
    /// Merge lock wait budget in milliseconds. Deliberately longer than the
    /// lane budget: peers serialize whole merge pipelines behind it.
    pub merge_lock_wait_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trunk: "main".to_string(),
            protected_branches: vec!["main".to_string(), "master".to_string()],
            max_merge_retries: 5,
            max_recovery_attempts: 5,
            lane_lock_wait_ms: 1_000,
            merge_lock_wait_ms: 60_000,
        }
    }
}

/// Cloud-mode activation knobs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CloudConfig {
    /// When false, env-signal activation never participates.
    pub opt_in: bool,
    /// Environment variables whose presence counts as a cloud signal.
    pub env_signals: Vec<String>,
}

/// Per-lane settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaneConfig {
    pub policy: LockPolicy,
}

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub engine: EngineConfig,
    pub cloud: CloudConfig,
    /// Keyed by the full lane name, e.g. `"Framework: Core"`.
    pub lanes: IndexMap<String, LaneConfig>,
}

impl Config {
    /// Load from a TOML file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        Ok(toml::from_str(&content)?)
    }

    /// Lock policy for a lane, defaulting to [`LockPolicy::All`].
    pub fn lock_policy_for(&self, lane: &str) -> LockPolicy {
        self.lanes.get(lane).map(|l| l.policy).unwrap_or_default()
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
