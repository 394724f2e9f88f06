// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use lf_core::test_support::{sample_wu, wu_id};
use lf_core::WuStatus;

#[test]
fn save_then_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let wu = sample_wu(12, "Framework: Core");
    let path = dir.path().join("wu").join(wu_file_name(wu.id));

    save_wu(&path, &wu).unwrap();
    let back = load_wu(&path).unwrap();
    assert_eq!(back, wu);
}

#[test]
fn dates_are_normalized_on_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("WU-5.yaml");
    // a timestamp that drifted in from another tool
    std::fs::write(
        &path,
        "id: WU-5\ntitle: Drifted\nlane: 'Framework: Core'\ncreated: 2025-02-01T00:00:00Z\n",
    )
    .unwrap();

    let wu = load_wu(&path).unwrap();
    save_wu(&path, &wu).unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert!(content.contains("created: '2025-02-01'") || content.contains("created: 2025-02-01"));
    assert!(!content.contains("T00:00:00"));
}

#[test]
fn missing_file_is_a_distinct_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        load_wu(&dir.path().join("WU-404.yaml")),
        Err(WuFileError::Missing(_))
    ));
}

#[test]
fn filename_id_disagreement_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let wu = sample_wu(7, "Framework: Core");
    let path = dir.path().join("WU-8.yaml");
    std::fs::write(&path, serialize_wu(&wu).unwrap()).unwrap();

    match load_wu(&path) {
        Err(WuFileError::IdMismatch {
            declared, expected, ..
        }) => {
            assert_eq!(declared, wu_id(7));
            assert_eq!(expected, wu_id(8));
        }
        other => panic!("expected id mismatch, got {other:?}"),
    }
}

#[test]
fn invalid_yaml_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("WU-3.yaml");
    std::fs::write(&path, "id: [unclosed").unwrap();
    assert!(matches!(load_wu(&path), Err(WuFileError::Yaml { .. })));
}

#[test]
fn list_sorts_numerically_and_skips_strays() {
    let dir = tempfile::tempdir().unwrap();
    for n in [10u64, 2, 1] {
        let wu = sample_wu(n, "Framework: Core");
        save_wu(&dir.path().join(wu_file_name(wu.id)), &wu).unwrap();
    }
    std::fs::write(dir.path().join("README.md"), "not a wu").unwrap();
    std::fs::write(dir.path().join("notes.yaml"), "also not a wu").unwrap();

    let listed = list_wu_files(dir.path()).unwrap();
    let ids: Vec<u64> = listed.iter().map(|(id, _)| id.number()).collect();
    assert_eq!(ids, vec![1, 2, 10]);
}

#[test]
fn list_of_missing_dir_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    assert!(list_wu_files(&dir.path().join("nope")).unwrap().is_empty());
}

#[test]
fn status_survives_yaml_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let mut wu = sample_wu(9, "Framework: Core");
    wu.status = WuStatus::InProgress;
    let path = dir.path().join(wu_file_name(wu.id));
    save_wu(&path, &wu).unwrap();
    assert_eq!(load_wu(&path).unwrap().status, WuStatus::InProgress);
}
