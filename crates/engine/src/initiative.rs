// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Initiative files and their bidirectional WU membership.
//!
//! Changing a WU's `initiative` field edits two `wus[]` arrays — the old
//! initiative loses the id, the new one gains it — and both edits are
//! staged into the same transaction as the WU file itself, so either all
//! three land or none do.

use crate::transaction::Transaction;
use lf_core::{LfPaths, WuId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors reading or writing initiative files
#[derive(Debug, Error)]
pub enum InitiativeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error in {path}: {message}")]
    Yaml { path: PathBuf, message: String },
}

/// A grouping of WUs, tracked by one YAML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Initiative {
    pub name: String,
    #[serde(default)]
    pub wus: Vec<WuId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl Initiative {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            wus: Vec::new(),
            summary: None,
        }
    }
}

/// Load an initiative file; a missing file is a fresh empty initiative.
pub fn load_initiative(path: &Path, name: &str) -> Result<Initiative, InitiativeError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(Initiative::new(name));
        }
        Err(e) => return Err(e.into()),
    };
    serde_yaml::from_str(&content).map_err(|e| InitiativeError::Yaml {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn serialize(initiative: &Initiative, path: &Path) -> Result<String, InitiativeError> {
    serde_yaml::to_string(initiative).map_err(|e| InitiativeError::Yaml {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Stage the membership edits for moving `wu_id` from `old` to `new`.
///
/// A no-op when old and new agree. Removing from a missing old file stages
/// nothing for it; adding is idempotent.
pub fn stage_initiative_move(
    tx: &mut Transaction,
    paths: &LfPaths,
    wu_id: WuId,
    old: Option<&str>,
    new: Option<&str>,
) -> Result<(), InitiativeError> {
    if old == new {
        return Ok(());
    }

    if let Some(old_name) = old {
        let path = paths.initiative_path(old_name);
        let mut initiative = load_initiative(&path, old_name)?;
        let before = initiative.wus.len();
        initiative.wus.retain(|id| *id != wu_id);
        if initiative.wus.len() != before {
            tx.stage(
                &path,
                serialize(&initiative, &path)?.into_bytes(),
                format!("remove {wu_id} from initiative `{old_name}`"),
            );
        }
    }

    if let Some(new_name) = new {
        let path = paths.initiative_path(new_name);
        let mut initiative = load_initiative(&path, new_name)?;
        if !initiative.wus.contains(&wu_id) {
            initiative.wus.push(wu_id);
            initiative.wus.sort();
        }
        tx.stage(
            &path,
            serialize(&initiative, &path)?.into_bytes(),
            format!("add {wu_id} to initiative `{new_name}`"),
        );
    }

    Ok(())
}

#[cfg(test)]
#[path = "initiative_tests.rs"]
mod tests;
