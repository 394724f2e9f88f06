//! gates, doctor, validate, recover, and cloud detection through the binary.

use crate::prelude::*;

#[test]
fn gates_pass_on_a_fresh_repo() {
    let repo = Repo::new();
    repo.create_wu("Healthy", "Framework: Core");
    repo.lf(&["gates"]).assert().success();
}

#[test]
fn gates_exit_two_on_regression() {
    let repo = Repo::new();
    repo.create_wu("Healthy", "Framework: Core");
    std::fs::remove_file(repo.path().join("tasks/backlog.md")).unwrap();

    let value = stdout_json(repo.lf(&["--json", "gates"]).assert().code(2));
    assert_eq!(value["passed"], false);
    assert!(!value["problems"].as_array().unwrap().is_empty());
}

#[test]
fn doctor_is_clean_after_a_full_lifecycle() {
    let repo = Repo::new();
    let id = repo.create_wu("Routine", "Framework: Core");
    repo.lf(&["wu", "claim", "--id", &id]).assert().success();
    repo.lf(&["wu", "done", "--id", &id, "--no-merge", "--pr", "https://x/1"])
        .assert()
        .success();
    repo.lf(&["state", "doctor"]).assert().success();
}

#[test]
fn doctor_flags_zombie_locks_with_exit_two() {
    let repo = Repo::new();
    repo.create_wu("Backdrop", "Framework: Core");

    let lock_dir = repo.path().join("locks");
    std::fs::create_dir_all(&lock_dir).unwrap();
    std::fs::write(
        lock_dir.join("stray.lock"),
        r#"{"wu_id":"WU-50","lock_id":"z","pid":999999999,"created_at":"2099-01-01T00:00:00Z"}"#,
    )
    .unwrap();

    let value = stdout_json(repo.lf(&["--json", "state", "doctor"]).assert().code(2));
    assert_eq!(value["healthy"], false);
}

#[test]
fn doctor_tolerates_a_corrupt_trailing_event() {
    let repo = Repo::new();
    repo.create_wu("Sound", "Framework: Core");

    let log = repo.path().join(".lumenflow/state/wu-events.jsonl");
    let mut content = std::fs::read_to_string(&log).unwrap();
    content.push_str("{\"wu_id\":\"WU-9\",\"kind\":\"crea");
    std::fs::write(&log, content).unwrap();

    repo.lf(&["state", "doctor"]).assert().success();
}

#[test]
fn validate_reports_spec_problems() {
    let repo = Repo::new();
    repo.create_wu("Fine", "Framework: Core");
    std::fs::write(
        repo.path().join("wu/WU-7.yaml"),
        "id: WU-7\ntitle: ''\nlane: broken\ncreated: '2025-01-01'\n",
    )
    .unwrap();

    let value = stdout_json(repo.lf(&["--json", "wu", "validate"]).assert().code(1));
    let problems = value["problems"].as_array().unwrap();
    assert!(problems.iter().any(|p| p["wu_id"] == "WU-7"));
}

#[test]
fn recover_requires_recorded_failures() {
    let repo = Repo::new();
    let id = repo.create_wu("Steady", "Framework: Core");
    repo.lf(&["wu", "claim", "--id", &id]).assert().success();

    repo.lf(&["wu", "recover", "--id", &id]).assert().failure().code(1);
}

#[test]
fn recover_heals_a_drifted_wu_file() {
    let repo = Repo::new();
    let id = repo.create_wu("Driftable", "Framework: Core");
    repo.lf(&["wu", "claim", "--id", &id]).assert().success();

    // simulate a half-landed completion and one recorded failure
    let wu_path = repo.wu_file(&id);
    let content = std::fs::read_to_string(&wu_path)
        .unwrap()
        .replace("status: in_progress", "status: done");
    std::fs::write(&wu_path, content).unwrap();
    let marker_dir = repo.path().join(".lumenflow/state/recovery");
    std::fs::create_dir_all(&marker_dir).unwrap();
    std::fs::write(marker_dir.join(format!("{id}.recovery")), "1\n").unwrap();

    repo.lf(&["wu", "recover", "--id", &id]).assert().success();
    assert_eq!(repo.wu_status(&id), "in_progress");
    assert!(repo.events().contains("\"recovered\""));
    assert!(!marker_dir.join(format!("{id}.recovery")).exists());
}

#[test]
fn cloud_defaults_to_inactive() {
    let repo = Repo::new();
    let value = stdout_json(repo.lf(&["--json", "state", "cloud"]).assert().success());
    assert_eq!(value["active"], false);
    assert_eq!(value["reason"], "not_requested");
}

#[test]
fn cloud_env_activates_off_protected_branches() {
    let repo = Repo::new();
    // no git in the scratch repo, so the branch is unknown (not protected)
    let mut cmd = repo.lf(&["--json", "state", "cloud"]);
    cmd.env("LUMENFLOW_CLOUD", "1");
    let value = stdout_json(cmd.assert().success());
    assert_eq!(value["active"], true);
    assert_eq!(value["reason"], "explicit_env");
}
