// tests/purge_and_results.rs

mod common;
use crate::common::init_tracing;

use std::fs;

use serde_json::json;
use simherd::collect::{purge, read_result};
use simherd::errors::SimherdError;

#[test]
fn purge_deletes_only_matching_suffixes() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    fs::write(dir.path().join("run.log"), "log").unwrap();
    fs::write(dir.path().join("job.lck"), "lock").unwrap();
    fs::write(dir.path().join("results.json"), "{}").unwrap();
    fs::write(dir.path().join("mesh.inp"), "mesh").unwrap();

    let removed = purge(dir.path(), &[".log"]).unwrap();
    assert_eq!(removed, 1);

    assert!(!dir.path().join("run.log").exists());
    assert!(dir.path().join("job.lck").exists());
    assert!(dir.path().join("results.json").exists());
    assert!(dir.path().join("mesh.inp").exists());
}

#[test]
fn purge_twice_is_a_noop() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("run.log"), "log").unwrap();

    assert_eq!(purge(dir.path(), &[".log"]).unwrap(), 1);
    assert_eq!(purge(dir.path(), &[".log"]).unwrap(), 0);
}

#[test]
fn purge_with_no_matches_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("keep.txt"), "data").unwrap();

    assert_eq!(purge(dir.path(), &[".log", ".lck"]).unwrap(), 0);
    assert!(dir.path().join("keep.txt").exists());
}

#[test]
fn purge_is_not_recursive() {
    let dir = tempfile::tempdir().unwrap();
    let sub = dir.path().join("archive");
    fs::create_dir(&sub).unwrap();
    fs::write(sub.join("old.log"), "log").unwrap();

    assert_eq!(purge(dir.path(), &[".log"]).unwrap(), 0);
    assert!(sub.join("old.log").exists());
}

#[test]
fn purge_handles_several_suffixes_at_once() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["a.log", "b.lck", "c.rec", "keep.odb"] {
        fs::write(dir.path().join(name), "x").unwrap();
    }

    assert_eq!(purge(dir.path(), &[".log", ".lck", ".rec"]).unwrap(), 3);
    assert!(dir.path().join("keep.odb").exists());
}

#[test]
fn missing_result_artifact_is_a_hard_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("results.json");

    match read_result(&missing) {
        Err(SimherdError::ResultUnavailable(path)) => assert_eq!(path, missing),
        other => panic!("expected ResultUnavailable, got {other:?}"),
    }
}

#[test]
fn result_artifact_round_trips_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.json");

    let written = json!({
        "stress": [1.0, 2.5, 3.75],
        "strain": {"xx": 0.01, "yy": 0.02},
        "converged": true,
        "case": "case_3"
    });
    fs::write(&path, serde_json::to_string_pretty(&written).unwrap()).unwrap();

    let read = read_result(&path).unwrap();
    assert_eq!(serde_json::Value::Object(read), written);
}

#[test]
fn non_mapping_result_artifact_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("results.json");
    fs::write(&path, "[1, 2, 3]").unwrap();

    assert!(read_result(&path).is_err());
}
