// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use lf_core::test_support::wu_id;
use lf_core::WuStatus;

#[test]
fn kinds_are_stable_wire_names() {
    let cases: Vec<(EngineError, &str)> = vec![
        (
            EngineError::Validation {
                wu_id: Some(wu_id(1)),
                problems: vec!["title must not be empty".to_string()],
            },
            "validation_error",
        ),
        (
            EngineError::StateTransition {
                wu_id: wu_id(1),
                from: WuStatus::Done,
                to: WuStatus::InProgress,
            },
            "state_transition",
        ),
        (
            EngineError::LockBusy {
                resource: "framework-core".to_string(),
                held_by: Some(wu_id(2)),
            },
            "lock_busy",
        ),
        (
            EngineError::RetryExhaustion {
                branch: "lane/core".to_string(),
                attempts: 5,
            },
            "retry_exhaustion",
        ),
        (
            EngineError::RecoveryExhaustion {
                wu_id: wu_id(9),
                attempts: 5,
                max: 5,
            },
            "recovery_exhaustion",
        ),
    ];

    for (err, kind) in cases {
        assert_eq!(err.error_kind(), kind);
    }
}

#[test]
fn illegal_store_transition_maps_to_state_transition() {
    let err = EngineError::Store(lf_storage::StoreError::IllegalTransition {
        wu_id: wu_id(1),
        from: WuStatus::Ready,
        to: WuStatus::Done,
    });
    assert_eq!(err.error_kind(), "state_transition");
}

#[test]
fn network_git_errors_map_to_network() {
    let err = EngineError::Git(lf_adapters::GitError::Failed {
        args: "push origin x:main".to_string(),
        status: 128,
        stderr: "Could not resolve host: example.com".to_string(),
    });
    assert_eq!(err.error_kind(), "network");
}

#[test]
fn every_error_has_next_steps() {
    let err = EngineError::RecoveryExhaustion {
        wu_id: wu_id(999),
        attempts: 5,
        max: 5,
    };
    let steps = err.next_steps();
    assert!(!steps.is_empty());
    assert!(steps.iter().any(|s| s.contains("manual intervention")));
    assert!(steps.iter().any(|s| s.contains("WU-999")));
}

#[test]
fn retry_exhaustion_is_not_confused_with_conflict() {
    let retry = EngineError::RetryExhaustion {
        branch: "lane/core".to_string(),
        attempts: 5,
    };
    let conflict = EngineError::MergeConflict {
        branch: "lane/core".to_string(),
        detail: "CONFLICT in src/lib.rs".to_string(),
    };
    assert_ne!(retry.error_kind(), conflict.error_kind());
}

#[test]
fn context_carries_structured_fields() {
    let err = EngineError::LockBusy {
        resource: "merge".to_string(),
        held_by: Some(wu_id(4)),
    };
    let ctx = err.context();
    assert_eq!(ctx["resource"], "merge");
    assert_eq!(ctx["held_by"], "WU-4");
}
