// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cloud-mode detection: a pure function of flag, environment, config, and
//! the current branch.
//!
//! Explicit activation (flag or `LUMENFLOW_CLOUD=1`) always wins over
//! config-driven env signals; env signals participate only under opt-in.
//! On protected branches explicit activation is blocked and env-signal
//! activation is suppressed, with distinct reason codes.

use crate::env::cloud_env_requested;
use lf_core::CloudConfig;
use std::collections::HashMap;

/// Why cloud mode is (or is not) active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloudReason {
    ExplicitFlag,
    ExplicitEnv,
    EnvSignal { var: String },
    NotRequested,
    ExplicitBlockedOnProtectedBranch,
    SignalSuppressedOnProtectedBranch { var: String },
}

impl CloudReason {
    /// Stable reason code for output.
    pub fn code(&self) -> &'static str {
        match self {
            CloudReason::ExplicitFlag => "explicit_flag",
            CloudReason::ExplicitEnv => "explicit_env",
            CloudReason::EnvSignal { .. } => "env_signal",
            CloudReason::NotRequested => "not_requested",
            CloudReason::ExplicitBlockedOnProtectedBranch => "explicit_blocked_protected_branch",
            CloudReason::SignalSuppressedOnProtectedBranch { .. } => {
                "signal_suppressed_protected_branch"
            }
        }
    }
}

/// The decision plus its reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudDecision {
    pub active: bool,
    pub reason: CloudReason,
}

/// Decide cloud mode. Pure: all inputs are passed in.
pub fn detect_cloud_mode(
    flag: bool,
    env: &HashMap<String, String>,
    config: &CloudConfig,
    branch: &str,
    protected_branches: &[String],
) -> CloudDecision {
    let on_protected = protected_branches.iter().any(|b| b == branch);
    let env_explicit = cloud_env_requested(env);

    if flag || env_explicit {
        if on_protected {
            return CloudDecision {
                active: false,
                reason: CloudReason::ExplicitBlockedOnProtectedBranch,
            };
        }
        return CloudDecision {
            active: true,
            reason: if flag {
                CloudReason::ExplicitFlag
            } else {
                CloudReason::ExplicitEnv
            },
        };
    }

    if config.opt_in {
        if let Some(var) = config.env_signals.iter().find(|v| env.contains_key(v.as_str())) {
            if on_protected {
                return CloudDecision {
                    active: false,
                    reason: CloudReason::SignalSuppressedOnProtectedBranch { var: var.clone() },
                };
            }
            return CloudDecision {
                active: true,
                reason: CloudReason::EnvSignal { var: var.clone() },
            };
        }
    }

    CloudDecision {
        active: false,
        reason: CloudReason::NotRequested,
    }
}

#[cfg(test)]
#[path = "cloud_tests.rs"]
mod tests;
