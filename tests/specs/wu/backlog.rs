//! Backlog projection through the binary.

use crate::prelude::*;
use similar_asserts::assert_eq as assert_text_eq;

#[test]
fn sections_stay_in_order_as_wus_move() {
    let repo = Repo::new();
    let ready = repo.create_wu("Still ready", "Framework: Core");
    let claimed = repo.create_wu("Being worked", "Docs: Guides");
    repo.lf(&["wu", "claim", "--id", &claimed]).assert().success();

    let backlog = repo.backlog();
    let ready_heading = backlog.find("## Ready").unwrap();
    let in_progress_heading = backlog.find("## In Progress").unwrap();
    let ready_pos = backlog.find(&format!("{ready} ")).unwrap();
    let claimed_pos = backlog.find(&format!("{claimed} ")).unwrap();

    assert!(ready_heading < ready_pos && ready_pos < in_progress_heading);
    assert!(in_progress_heading < claimed_pos);
}

#[test]
fn done_entries_omit_the_lane() {
    let repo = Repo::new();
    let id = repo.create_wu("Finished", "Framework: Core");
    repo.lf(&["wu", "claim", "--id", &id]).assert().success();
    repo.lf(&["wu", "done", "--id", &id, "--no-merge", "--pr", "https://x/1"])
        .assert()
        .success();

    let backlog = repo.backlog();
    assert!(backlog.contains(&format!("- [{id} — Finished](wu/{id}.yaml)\n")));
    assert!(!backlog.contains(&format!("- [{id} — Finished](wu/{id}.yaml) —")));
}

#[test]
fn hand_authored_wu_files_appear_after_store_entries() {
    let repo = Repo::new();
    repo.create_wu("In the store", "Framework: Core");

    // a WU file dropped in by hand, never announced to the store
    std::fs::write(
        repo.path().join("wu/WU-50.yaml"),
        "id: WU-50\ntitle: Hand authored\nlane: 'Docs: Guides'\ncreated: '2025-01-01'\n",
    )
    .unwrap();
    // any lifecycle operation re-renders
    repo.create_wu("Another", "Framework: Core");

    let backlog = repo.backlog();
    let store_pos = backlog.find("WU-1 ").unwrap();
    let disk_pos = backlog.find("WU-50 ").unwrap();
    assert!(store_pos < disk_pos);
    assert!(backlog.contains("Hand authored"));
}

#[test]
fn rendering_is_deterministic_across_invocations() {
    let repo = Repo::new();
    let id = repo.create_wu("Stable", "Framework: Core");
    let first = repo.backlog();

    // a no-op-ish operation that re-renders the projections
    repo.lf(&["wu", "edit", "--id", &id, "--title", "Stable"])
        .assert()
        .success();
    let second = repo.backlog();
    assert_text_eq!(first, second);
}

#[test]
fn status_doc_tracks_counts() {
    let repo = Repo::new();
    let id = repo.create_wu("Counted", "Framework: Core");
    repo.lf(&["wu", "claim", "--id", &id]).assert().success();

    let status = std::fs::read_to_string(repo.path().join("tasks/status.md")).unwrap();
    assert!(status.contains("| in_progress | 1 |"));
    assert!(status.contains(&format!("- {id} — Counted (Framework: Core, inline)")));
}
