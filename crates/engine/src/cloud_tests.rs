// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use lf_core::CloudConfig;

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn protected() -> Vec<String> {
    vec!["main".to_string(), "master".to_string()]
}

fn opted_in() -> CloudConfig {
    CloudConfig {
        opt_in: true,
        env_signals: vec!["CI".to_string()],
    }
}

#[test]
fn flag_wins_on_a_feature_branch() {
    let decision = detect_cloud_mode(true, &env(&[]), &CloudConfig::default(), "lane/core", &protected());
    assert!(decision.active);
    assert_eq!(decision.reason, CloudReason::ExplicitFlag);
}

#[test]
fn env_one_activates_explicitly() {
    let decision = detect_cloud_mode(
        false,
        &env(&[("LUMENFLOW_CLOUD", "1")]),
        &CloudConfig::default(),
        "lane/core",
        &protected(),
    );
    assert!(decision.active);
    assert_eq!(decision.reason, CloudReason::ExplicitEnv);
}

#[test]
fn explicit_is_blocked_on_protected_branch() {
    for branch in ["main", "master"] {
        let decision = detect_cloud_mode(true, &env(&[]), &CloudConfig::default(), branch, &protected());
        assert!(!decision.active);
        assert_eq!(decision.reason, CloudReason::ExplicitBlockedOnProtectedBranch);
    }
}

#[test]
fn env_signal_needs_opt_in() {
    let ci_env = env(&[("CI", "true")]);

    let without = detect_cloud_mode(false, &ci_env, &CloudConfig::default(), "lane/core", &protected());
    assert!(!without.active);
    assert_eq!(without.reason, CloudReason::NotRequested);

    let with = detect_cloud_mode(false, &ci_env, &opted_in(), "lane/core", &protected());
    assert!(with.active);
    assert_eq!(with.reason, CloudReason::EnvSignal { var: "CI".to_string() });
}

#[test]
fn env_signal_is_suppressed_on_protected_branch() {
    let decision = detect_cloud_mode(false, &env(&[("CI", "true")]), &opted_in(), "main", &protected());
    assert!(!decision.active);
    assert_eq!(
        decision.reason,
        CloudReason::SignalSuppressedOnProtectedBranch { var: "CI".to_string() }
    );
}

#[test]
fn blocked_and_suppressed_have_distinct_codes() {
    let blocked = detect_cloud_mode(true, &env(&[]), &opted_in(), "main", &protected());
    let suppressed = detect_cloud_mode(false, &env(&[("CI", "1")]), &opted_in(), "main", &protected());
    assert_ne!(blocked.reason.code(), suppressed.reason.code());
}

#[test]
fn explicit_beats_env_signal() {
    let decision = detect_cloud_mode(true, &env(&[("CI", "1")]), &opted_in(), "lane/core", &protected());
    assert_eq!(decision.reason, CloudReason::ExplicitFlag);
}

#[test]
fn nothing_requested_is_inactive() {
    let decision = detect_cloud_mode(false, &env(&[]), &CloudConfig::default(), "lane/core", &protected());
    assert!(!decision.active);
    assert_eq!(decision.reason, CloudReason::NotRequested);
}
