//! init scaffolding and idempotency.

use crate::prelude::*;

#[test]
fn init_scaffolds_the_layout() {
    let repo = Repo::new();

    assert!(repo.path().join(".lumenflow/config.toml").exists());
    assert!(repo.path().join(".lumenflow/state").is_dir());
    assert!(repo.path().join("wu").is_dir());
    assert!(repo.path().join("tasks/backlog.md").exists());
    assert!(repo.path().join("tasks/status.md").exists());

    let backlog = repo.backlog();
    assert!(backlog.contains("## Ready"));
    assert!(backlog.contains("_No ready work units._"));
}

#[test]
fn init_twice_is_idempotent() {
    let repo = Repo::new();
    repo.lf(&["init"]).assert().success();
    assert!(repo.path().join("tasks/backlog.md").exists());
}

#[test]
fn init_does_not_clobber_an_edited_config() {
    let repo = Repo::new();
    let config = repo.path().join(".lumenflow/config.toml");
    std::fs::write(&config, "[engine]\ntrunk = \"trunk\"\n").unwrap();

    repo.lf(&["init"]).assert().success();
    let content = std::fs::read_to_string(&config).unwrap();
    assert!(content.contains("trunk = \"trunk\""));
}
