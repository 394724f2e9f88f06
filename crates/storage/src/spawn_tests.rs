// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use lf_core::test_support::{fixed_ts, wu_id};

fn open_in(dir: &tempfile::TempDir) -> SpawnRegistry {
    SpawnRegistry::open(&dir.path().join("spawn-registry.jsonl")).unwrap()
}

#[test]
fn spawn_then_query_by_parent_and_target() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = open_in(&dir);

    registry
        .record_spawn(wu_id(1), wu_id(2), Some("split out docs".to_string()), fixed_ts())
        .unwrap();
    registry.record_spawn(wu_id(1), wu_id(3), None, fixed_ts()).unwrap();

    let children = registry.spawned_by(wu_id(1));
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].target, wu_id(2));
    assert_eq!(children[1].target, wu_id(3));

    let spawn = registry.spawn_for(wu_id(2)).unwrap();
    assert_eq!(spawn.parent, wu_id(1));
    assert_eq!(spawn.intent.as_deref(), Some("split out docs"));
    assert!(spawn.picked_up_at.is_none());
}

#[test]
fn pickup_stamps_the_pending_spawn() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = open_in(&dir);
    registry.record_spawn(wu_id(1), wu_id(2), None, fixed_ts()).unwrap();

    registry.record_pickup(wu_id(2), fixed_ts()).unwrap();
    assert!(registry.spawn_for(wu_id(2)).unwrap().picked_up_at.is_some());
}

#[test]
fn pickup_without_spawn_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = open_in(&dir);
    assert!(matches!(
        registry.record_pickup(wu_id(9), fixed_ts()),
        Err(SpawnRegistryError::NoPendingSpawn(_))
    ));
}

#[test]
fn double_pickup_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut registry = open_in(&dir);
    registry.record_spawn(wu_id(1), wu_id(2), None, fixed_ts()).unwrap();
    registry.record_pickup(wu_id(2), fixed_ts()).unwrap();
    assert!(matches!(
        registry.record_pickup(wu_id(2), fixed_ts()),
        Err(SpawnRegistryError::NoPendingSpawn(_))
    ));
}

#[test]
fn reload_projects_the_same() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spawn-registry.jsonl");
    {
        let mut registry = SpawnRegistry::open(&path).unwrap();
        registry.record_spawn(wu_id(1), wu_id(2), None, fixed_ts()).unwrap();
        registry.record_pickup(wu_id(2), fixed_ts()).unwrap();
    }

    let reloaded = SpawnRegistry::open(&path).unwrap();
    assert_eq!(reloaded.len(), 1);
    assert!(reloaded.spawn_for(wu_id(2)).unwrap().picked_up_at.is_some());
}

#[test]
fn corrupt_trailing_line_is_tolerated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("spawn-registry.jsonl");
    {
        let mut registry = SpawnRegistry::open(&path).unwrap();
        registry.record_spawn(wu_id(1), wu_id(2), None, fixed_ts()).unwrap();
    }
    let mut content = std::fs::read_to_string(&path).unwrap();
    content.push_str("{\"kind\":\"spawn");
    std::fs::write(&path, content).unwrap();

    assert_eq!(SpawnRegistry::open(&path).unwrap().len(), 1);
}
