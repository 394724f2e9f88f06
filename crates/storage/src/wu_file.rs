// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! WU YAML files: one human-editable file per work unit.
//!
//! Saving always round-trips through [`WorkUnit`], so date fields are
//! re-serialized as bare `YYYY-MM-DD` strings even if an editor or another
//! tool wrote a timestamp.

use lf_core::{WorkUnit, WuId};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur reading or writing WU files
#[derive(Debug, Error)]
pub enum WuFileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error in {path}: {message}")]
    Yaml { path: PathBuf, message: String },
    #[error("work unit file not found: {0}")]
    Missing(PathBuf),
    #[error("{path} declares id {declared}, expected {expected}")]
    IdMismatch {
        path: PathBuf,
        declared: WuId,
        expected: WuId,
    },
}

/// Canonical file name for a WU.
pub fn wu_file_name(id: WuId) -> String {
    format!("{id}.yaml")
}

/// Load and validate one WU file.
pub fn load_wu(path: &Path) -> Result<WorkUnit, WuFileError> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(WuFileError::Missing(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    let wu: WorkUnit = serde_yaml::from_str(&content).map_err(|e| WuFileError::Yaml {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    // The filename is the id the rest of the system sees; disagreement is
    // a hand-edit gone wrong.
    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
        if let Ok(expected) = stem.parse::<WuId>() {
            if expected != wu.id {
                return Err(WuFileError::IdMismatch {
                    path: path.to_path_buf(),
                    declared: wu.id,
                    expected,
                });
            }
        }
    }
    Ok(wu)
}

/// Serialize a WU to its canonical YAML form.
pub fn serialize_wu(wu: &WorkUnit) -> Result<String, WuFileError> {
    serde_yaml::to_string(wu).map_err(|e| WuFileError::Yaml {
        path: PathBuf::from(wu_file_name(wu.id)),
        message: e.to_string(),
    })
}

/// Write a WU file, creating parent directories.
pub fn save_wu(path: &Path, wu: &WorkUnit) -> Result<(), WuFileError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serialize_wu(wu)?)?;
    Ok(())
}

/// List WU files in a directory as `(id, path)`, numeric ascending.
/// A missing directory lists empty.
pub fn list_wu_files(wu_dir: &Path) -> Result<Vec<(WuId, PathBuf)>, WuFileError> {
    let entries = match std::fs::read_dir(wu_dir) {
        Ok(e) => e,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut found = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if let Ok(id) = stem.parse::<WuId>() {
            found.push((id, path));
        }
    }
    found.sort_by_key(|(id, _)| *id);
    Ok(found)
}

#[cfg(test)]
#[path = "wu_file_tests.rs"]
mod tests;
