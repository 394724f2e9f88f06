//! Test helpers for behavioral specifications.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Locate the `lf` binary built alongside this integration test.
///
/// `CARGO_BIN_EXE_lf` is only set by Cargo for tests that live in the `lf`
/// package itself; these specs live in the workspace-root `lf-specs`
/// package, so the binary is found relative to this test executable instead.
pub fn lf_bin_path() -> PathBuf {
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // deps/
    path.pop(); // debug/ or release/
    path.push(if cfg!(windows) { "lf.exe" } else { "lf" });
    path
}

/// A scratch repository with `lf init` already run.
pub struct Repo {
    dir: TempDir,
    lock_dir: PathBuf,
}

impl Repo {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        // per-repo lock dir so parallel tests never share leases
        let lock_dir = dir.path().join("locks");
        let repo = Self { dir, lock_dir };
        repo.lf(&["init"]).assert().success();
        repo
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// A command rooted at this repo.
    pub fn lf(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(lf_bin_path());
        cmd.current_dir(self.dir.path())
            .env("LUMENFLOW_LOCK_DIR", &self.lock_dir)
            .env_remove("LUMENFLOW_CLOUD")
            .env_remove("STALE_LOCK_THRESHOLD_HOURS")
            .args(args);
        cmd
    }

    /// Create a WU with acceptance and a test reference, ready to claim.
    pub fn create_wu(&self, title: &str, lane: &str) -> String {
        let output = self
            .lf(&["--json", "wu", "create", "--title", title, "--lane", lane])
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        let value: serde_json::Value = serde_json::from_slice(&output).unwrap();
        let id = value["wu_id"].as_str().unwrap().to_string();

        // flesh the spec out enough to claim and complete
        self.lf(&[
            "wu",
            "edit",
            "--id",
            &id,
            "--add-acceptance",
            "does the thing",
        ])
        .assert()
        .success();
        self.append_unit_test(&id, "sample_tests::does_the_thing");
        id
    }

    /// Add a unit test reference directly to the WU file (the edit verb
    /// deliberately has no test-editing flag).
    pub fn append_unit_test(&self, id: &str, test: &str) {
        let path = self.wu_file(id);
        let mut content = std::fs::read_to_string(&path).unwrap();
        content.push_str(&format!("tests:\n  unit:\n    - {test}\n"));
        std::fs::write(&path, content).unwrap();
    }

    pub fn wu_file(&self, id: &str) -> PathBuf {
        self.dir.path().join("wu").join(format!("{id}.yaml"))
    }

    pub fn backlog(&self) -> String {
        std::fs::read_to_string(self.dir.path().join("tasks/backlog.md")).unwrap()
    }

    pub fn events(&self) -> String {
        std::fs::read_to_string(self.dir.path().join(".lumenflow/state/wu-events.jsonl"))
            .unwrap_or_default()
    }

    pub fn wu_status(&self, id: &str) -> String {
        let content = std::fs::read_to_string(self.wu_file(id)).unwrap();
        content
            .lines()
            .find_map(|line| line.strip_prefix("status: "))
            .unwrap_or("")
            .trim()
            .to_string()
    }
}

/// Parse a command's stdout as JSON.
pub fn stdout_json(assert: assert_cmd::assert::Assert) -> serde_json::Value {
    let output = assert.get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}
