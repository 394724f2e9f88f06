// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lane names, lane slugs, and the per-lane lock policy.
//!
//! A lane is a `"<Domain>: <Lane>"` string that doubles as the mutual
//! exclusion resource name during claim. Lock files use the kebab-case slug.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Slugify a lane name for use as a lock file name component.
///
/// Lowercases, replaces any run of non-alphanumeric characters with a single
/// hyphen, and trims leading/trailing hyphens. `"Framework: Core"` becomes
/// `"framework-core"`.
pub fn lane_slug(lane: &str) -> String {
    let lower = lane.to_lowercase();
    let mut slug = String::with_capacity(lower.len());
    let mut last_was_hyphen = false;
    for ch in lower.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }
    slug.trim_matches('-').to_string()
}

/// Check that a lane name has the `"<Domain>: <Lane>"` shape.
pub fn is_well_formed(lane: &str) -> bool {
    match lane.split_once(':') {
        Some((domain, rest)) => {
            !domain.trim().is_empty() && rest.starts_with(' ') && !rest.trim().is_empty()
        }
        None => false,
    }
}

/// Per-lane locking policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockPolicy {
    /// Lane lock held for the whole in-progress lifetime.
    #[default]
    All,
    /// Lane lock held only while actively progressing; released on block,
    /// re-acquired on unblock.
    Active,
    /// Lane locks disabled; acquisition is skipped.
    None,
}

impl fmt::Display for LockPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockPolicy::All => write!(f, "all"),
            LockPolicy::Active => write!(f, "active"),
            LockPolicy::None => write!(f, "none"),
        }
    }
}

#[cfg(test)]
#[path = "lane_tests.rs"]
mod tests;
