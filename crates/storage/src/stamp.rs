// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Completion stamps: one small YAML record per done WU.
//!
//! A stamp's presence (and parseability) is a post-mutation invariant of
//! the completion pipeline.

use chrono::{DateTime, Utc};
use lf_core::{ActorId, WuId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur reading or writing stamps
#[derive(Debug, Error)]
pub enum StampError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error in {path}: {message}")]
    Yaml { path: PathBuf, message: String },
    #[error("stamp not found: {0}")]
    Missing(PathBuf),
}

/// Completion metadata for a done WU.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stamp {
    pub id: WuId,
    pub completed_at: DateTime<Utc>,
    pub lane: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<ActorId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_commit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_url: Option<String>,
}

/// Serialize a stamp to its canonical YAML form.
pub fn serialize_stamp(stamp: &Stamp) -> Result<String, StampError> {
    serde_yaml::to_string(stamp).map_err(|e| StampError::Yaml {
        path: PathBuf::from(format!("{}.done", stamp.id)),
        message: e.to_string(),
    })
}

/// Write a stamp file, creating parent directories.
pub fn write_stamp(path: &Path, stamp: &Stamp) -> Result<(), StampError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serialize_stamp(stamp)?)?;
    Ok(())
}

/// Read and parse a stamp file.
pub fn read_stamp(path: &Path) -> Result<Stamp, StampError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StampError::Missing(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    serde_yaml::from_str(&content).map_err(|e| StampError::Yaml {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
#[path = "stamp_tests.rs"]
mod tests;
