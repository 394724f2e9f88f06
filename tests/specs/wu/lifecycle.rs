//! Create → claim → block → unblock → done, through the binary.

use crate::prelude::*;

#[test]
fn create_writes_file_event_and_backlog_entry() {
    let repo = Repo::new();
    let id = repo.create_wu("Wire the projector", "Framework: Core");

    assert_eq!(id, "WU-1");
    assert!(repo.wu_file(&id).exists());
    assert_eq!(repo.wu_status(&id), "ready");
    assert!(repo.events().contains("\"created\""));
    assert!(repo.backlog().contains("Wire the projector"));
}

#[test]
fn ids_count_up_from_the_highest_seen() {
    let repo = Repo::new();
    assert_eq!(repo.create_wu("First", "Framework: Core"), "WU-1");
    assert_eq!(repo.create_wu("Second", "Framework: Core"), "WU-2");

    repo.lf(&["wu", "create", "--title", "Pinned", "--lane", "Docs: Guides", "--id", "WU-10"])
        .assert()
        .success();
    assert_eq!(repo.create_wu("After the gap", "Docs: Guides"), "WU-11");
}

#[test]
fn duplicate_explicit_id_is_rejected() {
    let repo = Repo::new();
    let id = repo.create_wu("First", "Framework: Core");
    repo.lf(&["wu", "create", "--title", "Again", "--lane", "Framework: Core", "--id", &id])
        .assert()
        .failure();
}

#[test]
fn claim_flips_status_and_mode() {
    let repo = Repo::new();
    let id = repo.create_wu("Claim me", "Framework: Core");

    let value = stdout_json(
        repo.lf(&["--json", "wu", "claim", "--id", &id])
            .assert()
            .success(),
    );
    assert_eq!(value["mode"], "inline");
    assert_eq!(repo.wu_status(&id), "in_progress");
    assert!(repo.events().contains("\"claimed\""));
}

#[test]
fn claim_without_acceptance_is_refused() {
    let repo = Repo::new();
    repo.lf(&["wu", "create", "--title", "Bare", "--lane", "Framework: Core"])
        .assert()
        .success();

    repo.lf(&["wu", "claim", "--id", "WU-1"]).assert().failure().code(1);
    assert_eq!(repo.wu_status("WU-1"), "ready");
}

#[test]
fn block_and_unblock_round_trip() {
    let repo = Repo::new();
    let id = repo.create_wu("Pausable", "Framework: Core");
    repo.lf(&["wu", "claim", "--id", &id]).assert().success();

    repo.lf(&["wu", "block", "--id", &id, "--reason", "waiting on design"])
        .assert()
        .success();
    assert_eq!(repo.wu_status(&id), "blocked");
    let backlog = repo.backlog();
    assert!(backlog.find("## Blocked").unwrap() < backlog.find(&format!("{id} ")).unwrap());

    repo.lf(&["wu", "unblock", "--id", &id]).assert().success();
    assert_eq!(repo.wu_status(&id), "in_progress");
}

#[test]
fn blocked_wus_cannot_complete() {
    let repo = Repo::new();
    let id = repo.create_wu("Stuck", "Framework: Core");
    repo.lf(&["wu", "claim", "--id", &id]).assert().success();
    repo.lf(&["wu", "block", "--id", &id, "--reason", "stuck"])
        .assert()
        .success();

    repo.lf(&["wu", "done", "--id", &id, "--no-merge", "--pr", "https://x/1"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn no_merge_done_stamps_and_moves_to_done() {
    let repo = Repo::new();
    let id = repo.create_wu("Ship it", "Framework: Core");
    repo.lf(&["wu", "claim", "--id", &id]).assert().success();

    let value = stdout_json(
        repo.lf(&[
            "--json", "wu", "done", "--id", &id, "--no-merge", "--pr",
            "https://example.com/pr/12",
        ])
        .assert()
        .success(),
    );
    assert_eq!(value["pr_url"], "https://example.com/pr/12");

    assert_eq!(repo.wu_status(&id), "done");
    assert!(repo
        .path()
        .join(format!(".lumenflow/state/stamps/{id}.done"))
        .exists());
    assert!(repo.events().contains("\"completed\""));
}

#[test]
fn done_requires_a_pr_when_not_merging() {
    let repo = Repo::new();
    let id = repo.create_wu("Evidence required", "Framework: Core");
    repo.lf(&["wu", "claim", "--id", &id]).assert().success();

    repo.lf(&["wu", "done", "--id", &id, "--no-merge"])
        .assert()
        .failure()
        .code(1);
}

#[test]
fn dry_run_changes_nothing() {
    let repo = Repo::new();
    let id = repo.create_wu("Rehearsal", "Framework: Core");
    repo.lf(&["wu", "claim", "--id", &id]).assert().success();
    let events_before = repo.events();

    repo.lf(&["wu", "done", "--id", &id, "--no-merge", "--pr", "https://x/1", "--dry-run"])
        .assert()
        .success();

    assert_eq!(repo.wu_status(&id), "in_progress");
    assert_eq!(repo.events(), events_before);
}

#[test]
fn release_abandons_a_claim() {
    let repo = Repo::new();
    let id = repo.create_wu("Descoped", "Framework: Core");
    repo.lf(&["wu", "claim", "--id", &id]).assert().success();

    repo.lf(&["wu", "release", "--id", &id, "--reason", "descoped"])
        .assert()
        .success();
    assert_eq!(repo.wu_status(&id), "released");
    assert!(!repo.backlog().contains(&format!("{id} ")));
}

#[test]
fn done_wus_cannot_be_released() {
    let repo = Repo::new();
    let id = repo.create_wu("Final", "Framework: Core");
    repo.lf(&["wu", "claim", "--id", &id]).assert().success();
    repo.lf(&["wu", "done", "--id", &id, "--no-merge", "--pr", "https://x/1"])
        .assert()
        .success();

    repo.lf(&["wu", "release", "--id", &id]).assert().failure().code(1);
}

#[test]
fn checkpoint_appends_a_note() {
    let repo = Repo::new();
    let id = repo.create_wu("Long haul", "Framework: Core");
    repo.lf(&["wu", "claim", "--id", &id]).assert().success();

    repo.lf(&["wu", "checkpoint", "--id", &id, "--note", "halfway", "--progress", "2/4"])
        .assert()
        .success();

    assert!(repo.events().contains("\"checkpoint\""));
    assert!(repo.events().contains("halfway"));
    assert_eq!(repo.wu_status(&id), "in_progress");
}

#[test]
fn spawn_then_claim_records_pickup() {
    let repo = Repo::new();
    let parent = repo.create_wu("Parent", "Framework: Core");
    let child = repo.create_wu("Child", "Docs: Guides");

    repo.lf(&["wu", "spawn", "--from", &parent, "--to", &child, "--intent", "split docs"])
        .assert()
        .success();
    repo.lf(&["wu", "claim", "--id", &child]).assert().success();

    let registry = std::fs::read_to_string(
        repo.path().join(".lumenflow/state/spawn-registry.jsonl"),
    )
    .unwrap();
    assert!(registry.contains("\"spawned\""));
    assert!(registry.contains("\"picked_up\""));
}

#[test]
fn edit_updates_the_backlog_line() {
    let repo = Repo::new();
    let id = repo.create_wu("Old name", "Framework: Core");

    repo.lf(&["wu", "edit", "--id", &id, "--title", "New name"])
        .assert()
        .success();

    assert!(repo.backlog().contains("New name"));
    assert!(!repo.backlog().contains("Old name"));
    assert!(repo.events().contains("\"edited\""));
}
