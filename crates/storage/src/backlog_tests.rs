// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use lf_core::test_support::{
    blocked_event, claimed_event, completed_event, created_event, released_event, sample_wu,
    wu_id,
};
use lf_core::ClaimMode;
use similar_asserts::assert_eq as assert_text_eq;

fn populated_state() -> StoreState {
    let mut state = StoreState::default();
    state.apply_event(&created_event(1, "Lock manager", "Framework: Core"));
    state.apply_event(&created_event(2, "Backlog projector", "Docs: Guides"));
    state.apply_event(&created_event(3, "Merge pipeline", "Framework: Core"));
    state.apply_event(&claimed_event(3, "Framework: Core", ClaimMode::Inline));
    state.apply_event(&created_event(4, "Spawn registry", "Framework: Core"));
    state.apply_event(&claimed_event(4, "Framework: Core", ClaimMode::Inline));
    state.apply_event(&blocked_event(4, "waiting on WU-3"));
    state.apply_event(&created_event(5, "Event store", "Framework: Core"));
    state.apply_event(&claimed_event(5, "Framework: Core", ClaimMode::Inline));
    state.apply_event(&completed_event(5));
    state
}

#[test]
fn renders_all_sections_in_order() {
    let doc = render_backlog(&populated_state(), &[]);

    let ready = doc.find("## Ready").unwrap();
    let in_progress = doc.find("## In Progress").unwrap();
    let blocked = doc.find("## Blocked").unwrap();
    let done = doc.find("## Done").unwrap();
    assert!(ready < in_progress && in_progress < blocked && blocked < done);
    assert!(doc.starts_with(BACKLOG_FRONTMATTER));
}

#[test]
fn entry_lines_have_the_exact_shape() {
    let doc = render_backlog(&populated_state(), &[]);
    assert!(doc.contains("- [WU-1 — Lock manager](wu/WU-1.yaml) — Framework: Core"));
    // Done entries omit the lane
    assert!(doc.contains("- [WU-5 — Event store](wu/WU-5.yaml)\n"));
    assert!(!doc.contains("- [WU-5 — Event store](wu/WU-5.yaml) —"));
}

#[test]
fn empty_sections_render_placeholders() {
    let state = StoreState::default();
    let doc = render_backlog(&state, &[]);
    assert!(doc.contains("_No ready work units._"));
    assert!(doc.contains("_Nothing in progress._"));
    assert!(doc.contains("_Nothing blocked._"));
    assert!(doc.contains("_Nothing done yet._"));
}

#[test]
fn released_wus_are_omitted() {
    let mut state = StoreState::default();
    state.apply_event(&created_event(1, "Abandoned", "Framework: Core"));
    state.apply_event(&released_event(1));
    let doc = render_backlog(&state, &[]);
    assert!(!doc.contains("WU-1"));
}

#[test]
fn disk_only_wus_follow_store_wus() {
    let mut state = StoreState::default();
    state.apply_event(&created_event(20, "In store", "Framework: Core"));

    let disk = vec![
        (wu_id(2), sample_wu(2, "Framework: Core")),
        (wu_id(30), sample_wu(30, "Framework: Core")),
    ];
    let doc = render_backlog(&state, &disk);

    let store_pos = doc.find("WU-20").unwrap();
    let disk_small = doc.find("[WU-2 ").unwrap();
    let disk_large = doc.find("WU-30").unwrap();
    // store entry first, then disk-only in numeric order
    assert!(store_pos < disk_small && disk_small < disk_large);
}

#[test]
fn disk_entry_already_in_store_is_not_duplicated() {
    let mut state = StoreState::default();
    state.apply_event(&created_event(1, "Lock manager", "Framework: Core"));
    let disk = vec![(wu_id(1), sample_wu(1, "Framework: Core"))];
    let doc = render_backlog(&state, &disk);
    assert_eq!(doc.matches("[WU-1 ").count(), 1);
}

#[test]
fn render_is_deterministic() {
    let a = render_backlog(&populated_state(), &[]);
    let b = render_backlog(&populated_state(), &[]);
    assert_text_eq!(a, b);
}

// ── Consistency check ────────────────────────────────────────────────────────

#[test]
fn fresh_render_has_zero_issues() {
    let state = populated_state();
    let doc = render_backlog(&state, &[]);
    assert!(check_consistency(&doc, &state).is_empty());
}

#[test]
fn stale_section_is_reported_as_misplaced() {
    let mut state = populated_state();
    let doc = render_backlog(&state, &[]);
    // WU-1 completes after the render
    state.apply_event(&claimed_event(1, "Framework: Core", ClaimMode::Inline));

    let issues = check_consistency(&doc, &state);
    assert!(issues.contains(&ConsistencyIssue {
        wu_id: wu_id(1),
        expected_section: Some("In Progress".to_string()),
        found_section: Some("Ready".to_string()),
    }));
}

#[test]
fn missing_wu_is_reported() {
    let state = populated_state();
    let doc = render_backlog(&state, &[]).replace(
        "- [WU-1 — Lock manager](wu/WU-1.yaml) — Framework: Core\n",
        "",
    );

    let issues = check_consistency(&doc, &state);
    assert!(issues.contains(&ConsistencyIssue {
        wu_id: wu_id(1),
        expected_section: Some("Ready".to_string()),
        found_section: None,
    }));
}

#[test]
fn duplicate_listing_is_reported() {
    let state = populated_state();
    let line = "- [WU-1 — Lock manager](wu/WU-1.yaml) — Framework: Core\n";
    let doc = render_backlog(&state, &[]).replace(line, &format!("{line}{line}"));

    let issues = check_consistency(&doc, &state);
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].wu_id, wu_id(1));
    assert_eq!(issues[0].found_section.as_deref(), Some("Ready"));
}

#[test]
fn released_wu_in_document_is_reported() {
    let mut state = populated_state();
    let doc = render_backlog(&state, &[]);
    state.apply_event(&released_event(1));

    let issues = check_consistency(&doc, &state);
    assert!(issues.contains(&ConsistencyIssue {
        wu_id: wu_id(1),
        expected_section: None,
        found_section: Some("Ready".to_string()),
    }));
}

#[test]
fn link_text_and_target_count_once() {
    let state = populated_state();
    let doc = render_backlog(&state, &[]);
    // every line mentions the id twice (text + target); no duplicates reported
    assert!(check_consistency(&doc, &state).is_empty());
}

// ── Checksum ─────────────────────────────────────────────────────────────────

#[test]
fn checksum_is_stable_across_interleavings() {
    let mut a = StoreState::default();
    a.apply_event(&created_event(1, "One", "Framework: Core"));
    a.apply_event(&created_event(2, "Two", "Docs: Guides"));
    a.apply_event(&claimed_event(1, "Framework: Core", ClaimMode::Inline));

    let mut b = StoreState::default();
    b.apply_event(&created_event(2, "Two", "Docs: Guides"));
    b.apply_event(&created_event(1, "One", "Framework: Core"));
    b.apply_event(&claimed_event(1, "Framework: Core", ClaimMode::Inline));

    assert_eq!(checksum(&a), checksum(&b));
}

#[test]
fn checksum_changes_when_status_changes() {
    let mut state = StoreState::default();
    state.apply_event(&created_event(1, "One", "Framework: Core"));
    let before = checksum(&state);
    state.apply_event(&claimed_event(1, "Framework: Core", ClaimMode::Inline));
    assert_ne!(before, checksum(&state));
}

#[test]
fn checksum_of_empty_store_is_stable() {
    assert_eq!(checksum(&StoreState::default()), checksum(&StoreState::default()));
}
