// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only JSONL event log.
//!
//! One event is one `\n`-terminated JSON line. Appends open the file in
//! append mode, write the whole line in a single call, and close — on POSIX
//! `O_APPEND` keeps concurrent appenders from interleaving within a line.
//!
//! Readers tolerate a corrupt or unterminated trailing line (a crash
//! mid-append) by skipping it; a malformed line anywhere else is an error
//! carrying its 1-based line number.

use lf_core::EventRecord;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Errors that can occur in event log operations
#[derive(Debug, Error)]
pub enum EventLogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("corrupt log entry at line {line}: {message}")]
    Corrupt { line: usize, message: String },
}

/// Handle to a JSONL log file.
#[derive(Debug, Clone)]
pub struct EventLog {
    path: PathBuf,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a single terminated line.
    pub fn append(&self, record: &EventRecord) -> Result<(), EventLogError> {
        append_line(&self.path, record)
    }

    /// Replay every record in log order.
    pub fn read_all(&self) -> Result<Vec<EventRecord>, EventLogError> {
        read_jsonl(&self.path)
    }
}

/// Append a serializable value as one JSONL line.
pub(crate) fn append_line<T: Serialize>(path: &Path, value: &T) -> Result<(), EventLogError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut bytes = serde_json::to_vec(value)?;
    bytes.push(b'\n');

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(&bytes)?;
    Ok(())
}

/// Read a JSONL file with crash-tolerant trailing-line semantics.
pub(crate) fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, EventLogError> {
    let raw = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let content = String::from_utf8_lossy(&raw);

    let segments: Vec<&str> = content.split_inclusive('\n').collect();
    let mut records = Vec::new();

    for (i, segment) in segments.iter().enumerate() {
        let line_no = i + 1;
        let is_last = i == segments.len() - 1;
        let trimmed = segment.trim();
        if trimmed.is_empty() {
            continue;
        }

        if is_last && !segment.ends_with('\n') {
            warn!(
                path = %path.display(),
                line = line_no,
                "unterminated trailing line, skipping",
            );
            continue;
        }

        match serde_json::from_str::<T>(trimmed) {
            Ok(record) => records.push(record),
            Err(e) if is_last => {
                warn!(
                    path = %path.display(),
                    line = line_no,
                    error = %e,
                    "corrupt trailing line, skipping",
                );
            }
            Err(e) => {
                return Err(EventLogError::Corrupt {
                    line: line_no,
                    message: e.to_string(),
                });
            }
        }
    }

    Ok(records)
}

#[cfg(test)]
#[path = "event_log_tests.rs"]
mod tests;
