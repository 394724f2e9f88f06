// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn sample() -> WorkUnit {
    let mut wu = WorkUnit::new(
        WuId::new(12).unwrap(),
        "Wire up the merge lock",
        "Framework: Core",
        "2025-02-10".parse().unwrap(),
    );
    wu.acceptance = vec!["merge lock serializes pipelines".to_string()];
    wu.tests.unit = vec!["lock_tests::merge_lock_exclusive".to_string()];
    wu
}

#[test]
fn valid_wu_has_no_problems() {
    assert!(sample().validate().is_empty());
    assert!(sample().claim_blockers().is_empty());
    assert!(sample().done_blockers().is_empty());
}

#[test]
fn empty_title_is_invalid() {
    let mut wu = sample();
    wu.title = "  ".to_string();
    assert_eq!(wu.validate().len(), 1);
}

#[test]
fn malformed_lane_is_invalid() {
    let mut wu = sample();
    wu.lane = "no-colon-here".to_string();
    assert!(wu.validate().iter().any(|p| p.contains("lane")));
}

#[test]
fn self_references_are_invalid() {
    let mut wu = sample();
    wu.blocked_by = vec![wu.id];
    wu.dependencies = vec![wu.id];
    assert_eq!(wu.validate().len(), 2);
}

#[test]
fn claim_requires_acceptance() {
    let mut wu = sample();
    wu.acceptance.clear();
    assert!(wu
        .claim_blockers()
        .iter()
        .any(|p| p.contains("acceptance")));
}

#[test]
fn done_requires_tests() {
    let mut wu = sample();
    wu.tests = TestsSpec::default();
    assert!(wu.done_blockers().iter().any(|p| p.contains("test")));
}

#[test]
fn json_round_trip_preserves_fields() {
    let wu = sample();
    let json = serde_json::to_string(&wu).unwrap();
    let back: WorkUnit = serde_json::from_str(&json).unwrap();
    assert_eq!(back, wu);
}

#[test]
fn created_serializes_as_bare_date_string() {
    let wu = sample();
    let value = serde_json::to_value(&wu).unwrap();
    assert_eq!(value["created"], "2025-02-10");
    assert_eq!(value["type"], "feature");
    assert_eq!(value["priority"], "P2");
    assert_eq!(value["status"], "ready");
}

#[test]
fn missing_optional_fields_default() {
    let json = r#"{
        "id": "WU-3",
        "title": "Trim the projector",
        "lane": "Docs: Guides",
        "created": "2025-01-01"
    }"#;
    let wu: WorkUnit = serde_json::from_str(json).unwrap();
    assert_eq!(wu.status, WuStatus::Ready);
    assert_eq!(wu.priority, Priority::P2);
    assert!(wu.acceptance.is_empty());
}
