//! Error surfaces: exit codes and the JSON error envelope.

use crate::prelude::*;

fn stderr_of(assert: &assert_cmd::assert::Assert) -> String {
    String::from_utf8_lossy(&assert.get_output().stderr).to_string()
}

#[test]
fn commands_outside_a_repo_fail_with_guidance() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = assert_cmd::Command::new(crate::prelude::lf_bin_path());
    let assert = cmd
        .current_dir(dir.path())
        .args(["wu", "validate"])
        .assert()
        .failure()
        .code(1);
    assert!(stderr_of(&assert).contains("lf init"));
}

#[test]
fn unknown_wu_error_is_typed_in_json() {
    let repo = Repo::new();
    let assert = repo
        .lf(&["--json", "wu", "claim", "--id", "WU-404"])
        .assert()
        .failure()
        .code(1);

    let value: serde_json::Value = serde_json::from_str(&stderr_of(&assert)).unwrap();
    assert!(value["error_kind"].is_string());
    assert!(value["message"].as_str().unwrap().contains("WU-404"));
    assert!(value["next_steps"].is_array());
}

#[test]
fn illegal_transition_reports_its_kind() {
    let repo = Repo::new();
    let id = repo.create_wu("Done too soon", "Framework: Core");

    // done without a claim is an illegal transition
    let assert = repo
        .lf(&["--json", "wu", "done", "--id", &id, "--no-merge", "--pr", "https://x/1"])
        .assert()
        .failure()
        .code(1);

    let value: serde_json::Value = serde_json::from_str(&stderr_of(&assert)).unwrap();
    assert_eq!(value["error_kind"], "state_transition");
}

#[test]
fn text_errors_carry_next_steps() {
    let repo = Repo::new();
    let assert = repo
        .lf(&["wu", "claim", "--id", "WU-404"])
        .assert()
        .failure();
    let stderr = stderr_of(&assert);
    assert!(stderr.contains("error:"));
    assert!(stderr.contains("→"));
}

#[test]
fn malformed_id_is_a_usage_error() {
    let repo = Repo::new();
    repo.lf(&["wu", "claim", "--id", "banana"]).assert().failure();
}
