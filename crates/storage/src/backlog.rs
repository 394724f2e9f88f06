// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backlog projection: deterministic markdown rendered from the store.
//!
//! Rendering is a pure function of the projection plus the WU files on
//! disk, so two processes that agree on the store render byte-identical
//! documents. The checksum detects drift without parsing markdown.

use crate::state::StoreState;
use lf_core::{WorkUnit, WuId, WuStatus};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Fixed frontmatter. Declares the section headings for human readers and
/// external tooling; the projector itself never reads it back.
pub const BACKLOG_FRONTMATTER: &str = "---\ndocument: backlog\nsections:\n  - Ready\n  - In Progress\n  - Blocked\n  - Done\n---\n";

const SECTION_ORDER: [WuStatus; 4] = [
    WuStatus::Ready,
    WuStatus::InProgress,
    WuStatus::Blocked,
    WuStatus::Done,
];

fn placeholder(status: WuStatus) -> &'static str {
    match status {
        WuStatus::Ready => "_No ready work units._",
        WuStatus::InProgress => "_Nothing in progress._",
        WuStatus::Blocked => "_Nothing blocked._",
        _ => "_Nothing done yet._",
    }
}

fn entry_line(id: WuId, title: &str, lane: &str, status: WuStatus) -> String {
    if status == WuStatus::Done {
        format!("- [{id} — {title}](wu/{id}.yaml)")
    } else {
        format!("- [{id} — {title}](wu/{id}.yaml) — {lane}")
    }
}

/// Render the backlog document.
///
/// Store WUs come first in each section (numeric ascending); WUs that exist
/// only as files on disk follow, also numeric ascending.
pub fn render_backlog(state: &StoreState, disk: &[(WuId, WorkUnit)]) -> String {
    let mut out = String::from(BACKLOG_FRONTMATTER);
    out.push_str("\n# Backlog\n");

    for status in SECTION_ORDER {
        let heading = match status.backlog_section() {
            Some(h) => h,
            None => continue,
        };
        out.push_str("\n## ");
        out.push_str(heading);
        out.push_str("\n\n");

        let mut lines = Vec::new();
        for id in state.by_status(status) {
            if let Some(wu) = state.get(id) {
                lines.push(entry_line(id, &wu.title, &wu.lane, status));
            }
        }
        for (id, wu) in disk {
            if !state.contains(*id) && wu.status == status {
                lines.push(entry_line(*id, &wu.title, &wu.lane, status));
            }
        }

        if lines.is_empty() {
            out.push_str(placeholder(status));
            out.push('\n');
        } else {
            for line in lines {
                out.push_str(&line);
                out.push('\n');
            }
        }
    }

    out
}

/// A WU listed in the wrong place (or missing, or duplicated).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyIssue {
    pub wu_id: WuId,
    /// `None` when the WU should not appear at all (released).
    pub expected_section: Option<String>,
    /// `None` when the WU is missing from the document.
    pub found_section: Option<String>,
}

/// Check a rendered document against the current store.
///
/// Each store WU must appear in its projected section exactly once; no WU
/// may appear in more than one section. Link text and link target within
/// one line count as a single occurrence.
pub fn check_consistency(document: &str, state: &StoreState) -> Vec<ConsistencyIssue> {
    let occurrences = scan_sections(document);
    let mut issues = Vec::new();

    for id in state.ids() {
        let Some(wu) = state.get(id) else { continue };
        let found = occurrences.get(&id).cloned().unwrap_or_default();

        match wu.status.backlog_section() {
            Some(expected) => {
                if found.is_empty() {
                    issues.push(ConsistencyIssue {
                        wu_id: id,
                        expected_section: Some(expected.to_string()),
                        found_section: None,
                    });
                    continue;
                }
                let mut seen_expected = 0;
                for section in &found {
                    if section == expected {
                        seen_expected += 1;
                        if seen_expected > 1 {
                            issues.push(ConsistencyIssue {
                                wu_id: id,
                                expected_section: Some(expected.to_string()),
                                found_section: Some(section.clone()),
                            });
                        }
                    } else {
                        issues.push(ConsistencyIssue {
                            wu_id: id,
                            expected_section: Some(expected.to_string()),
                            found_section: Some(section.clone()),
                        });
                    }
                }
            }
            None => {
                for section in &found {
                    issues.push(ConsistencyIssue {
                        wu_id: id,
                        expected_section: None,
                        found_section: Some(section.clone()),
                    });
                }
            }
        }
    }

    // Disk-only WUs: unknown to the store, but still must not be duplicated.
    for (id, sections) in &occurrences {
        if state.contains(*id) {
            continue;
        }
        for section in sections.iter().skip(1) {
            issues.push(ConsistencyIssue {
                wu_id: *id,
                expected_section: None,
                found_section: Some(section.clone()),
            });
        }
    }

    issues
}

/// Map of WU id → the sections whose entry lines mention it.
fn scan_sections(document: &str) -> BTreeMap<WuId, Vec<String>> {
    let mut current: Option<String> = None;
    let mut occurrences: BTreeMap<WuId, Vec<String>> = BTreeMap::new();

    for line in document.lines() {
        if let Some(heading) = line.strip_prefix("## ") {
            current = Some(heading.trim().to_string());
            continue;
        }
        let Some(section) = &current else { continue };
        let Some(rest) = line.strip_prefix("- [") else { continue };

        // "- [WU-12 — Title](wu/WU-12.yaml) — Lane": the id ends at the
        // first non-digit after the prefix.
        if let Some(id) = leading_wu_id(rest) {
            occurrences.entry(id).or_default().push(section.clone());
        }
    }

    occurrences
}

fn leading_wu_id(text: &str) -> Option<WuId> {
    let digits: String = text
        .strip_prefix("WU-")?
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    format!("WU-{digits}").parse().ok()
}

/// Deterministic SHA-256 over the sorted `(wu_id, status, title, lane)`
/// tuples. Stable under any event interleaving that yields the same final
/// projection.
pub fn checksum(state: &StoreState) -> String {
    let mut hasher = Sha256::new();
    for id in state.ids() {
        if let Some(wu) = state.get(id) {
            hasher.update(id.to_string().as_bytes());
            hasher.update([0x1f]);
            hasher.update(wu.status.to_string().as_bytes());
            hasher.update([0x1f]);
            hasher.update(wu.title.as_bytes());
            hasher.update([0x1f]);
            hasher.update(wu.lane.as_bytes());
            hasher.update([0x0a]);
        }
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
#[path = "backlog_tests.rs"]
mod tests;
