// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output formatting: text or JSON, EPIPE-safe.

use lf_engine::EngineError;
use std::io::Write;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Print a line to stdout. A closed pipe (`head`, `less` quitting) is a
/// success, not an error.
pub fn print_line(line: &str) {
    let mut stdout = std::io::stdout();
    if let Err(e) = writeln!(stdout, "{line}") {
        if e.kind() == std::io::ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
    }
}

/// Print a pretty JSON value, EPIPE-safe.
pub fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(body) => print_line(&body),
        Err(e) => eprintln!("output serialization failed: {e}"),
    }
}

/// Print a success payload in the requested format.
pub fn print_result(format: OutputFormat, text: &str, json: serde_json::Value) {
    match format {
        OutputFormat::Text => print_line(text),
        OutputFormat::Json => print_json(&json),
    }
}

/// Print an error. Engine errors carry their kind, structured context, and
/// next steps; anything else degrades to a generic kind.
pub fn print_error(error: &anyhow::Error, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let value = match error.downcast_ref::<EngineError>() {
                Some(e) => serde_json::json!({
                    "error_kind": e.error_kind(),
                    "message": e.to_string(),
                    "context": e.context(),
                    "next_steps": e.next_steps(),
                }),
                None => serde_json::json!({
                    "error_kind": "error",
                    "message": error.to_string(),
                    "context": {},
                    "next_steps": [],
                }),
            };
            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "{}",
                serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
            );
        }
        OutputFormat::Text => {
            eprintln!("error: {error}");
            if let Some(e) = error.downcast_ref::<EngineError>() {
                for step in e.next_steps() {
                    eprintln!("  → {step}");
                }
            }
        }
    }
}
