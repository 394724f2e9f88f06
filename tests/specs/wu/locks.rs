//! Lane lock behavior through the binary.

use crate::prelude::*;

#[test]
fn two_claims_on_one_lane_leave_one_winner() {
    let repo = Repo::new();
    let first = repo.create_wu("Winner", "Framework: Core");
    let second = repo.create_wu("Loser", "Framework: Core");

    repo.lf(&["wu", "claim", "--id", &first]).assert().success();

    let assert = repo
        .lf(&["--json", "wu", "claim", "--id", &second])
        .assert()
        .failure()
        .code(1);
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    let value: serde_json::Value = serde_json::from_str(&stderr).unwrap();
    assert_eq!(value["error_kind"], "lock_busy");
    assert_eq!(value["context"]["held_by"], first);

    assert_eq!(repo.wu_status(&second), "ready");
}

#[test]
fn reclaiming_the_same_wu_is_idempotent() {
    let repo = Repo::new();
    let id = repo.create_wu("Mine", "Framework: Core");
    repo.lf(&["wu", "claim", "--id", &id]).assert().success();

    // in_progress → in_progress is not a legal transition, so a literal
    // re-claim fails at the state machine, not at the lock
    let assert = repo
        .lf(&["--json", "wu", "claim", "--id", &id])
        .assert()
        .failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).to_string();
    let value: serde_json::Value = serde_json::from_str(&stderr).unwrap();
    assert_eq!(value["error_kind"], "state_transition");
}

#[test]
fn different_lanes_claim_concurrently() {
    let repo = Repo::new();
    let a = repo.create_wu("Lane A", "Framework: Core");
    let b = repo.create_wu("Lane B", "Docs: Guides");

    repo.lf(&["wu", "claim", "--id", &a]).assert().success();
    repo.lf(&["wu", "claim", "--id", &b]).assert().success();
}

#[test]
fn zombie_lock_files_are_reclaimed() {
    let repo = Repo::new();
    let id = repo.create_wu("Reclaimer", "Framework: Core");

    // a lease left behind by a dead process
    let lock_dir = repo.path().join("locks");
    std::fs::create_dir_all(&lock_dir).unwrap();
    std::fs::write(
        lock_dir.join("framework-core.lock"),
        r#"{"wu_id":"WU-50","lock_id":"zlock","pid":999999999,"created_at":"2025-01-01T00:00:00Z"}"#,
    )
    .unwrap();

    repo.lf(&["wu", "claim", "--id", &id]).assert().success();
}

#[test]
fn release_frees_the_lane_for_the_next_claim() {
    let repo = Repo::new();
    let first = repo.create_wu("First pass", "Framework: Core");
    let second = repo.create_wu("Second pass", "Framework: Core");

    repo.lf(&["wu", "claim", "--id", &first]).assert().success();
    repo.lf(&["wu", "release", "--id", &first]).assert().success();
    repo.lf(&["wu", "claim", "--id", &second]).assert().success();
}

#[test]
fn completion_frees_the_lane_lock() {
    let repo = Repo::new();
    let id = repo.create_wu("Holder", "Framework: Core");
    let next = repo.create_wu("Next up", "Framework: Core");
    repo.lf(&["wu", "claim", "--id", &id]).assert().success();
    repo.lf(&["wu", "done", "--id", &id, "--no-merge", "--pr", "https://x/1"])
        .assert()
        .success();

    assert!(!repo.path().join("locks/framework-core.lock").exists());
    repo.lf(&["wu", "claim", "--id", &next]).assert().success();
}
