// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment variables the engine recognizes.

use chrono::Duration;

/// Stale lock threshold override, in hours (positive float).
pub const STALE_LOCK_THRESHOLD_ENV: &str = "STALE_LOCK_THRESHOLD_HOURS";

/// Explicit cloud activation.
pub const CLOUD_ENV: &str = "LUMENFLOW_CLOUD";

/// Default stale lock threshold.
pub const DEFAULT_STALE_LOCK_HOURS: f64 = 2.0;

/// Resolve the stale lock threshold from the environment.
///
/// Unset, unparseable, or non-positive values fall back to the default.
pub fn stale_lock_threshold() -> Duration {
    let hours = std::env::var(STALE_LOCK_THRESHOLD_ENV)
        .ok()
        .and_then(|raw| raw.trim().parse::<f64>().ok())
        .filter(|h| *h > 0.0 && h.is_finite())
        .unwrap_or(DEFAULT_STALE_LOCK_HOURS);
    Duration::milliseconds((hours * 3_600_000.0) as i64)
}

/// Whether `LUMENFLOW_CLOUD=1` is set in the given environment snapshot.
pub fn cloud_env_requested(env: &std::collections::HashMap<String, String>) -> bool {
    env.get(CLOUD_ENV).map(String::as_str) == Some("1")
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
