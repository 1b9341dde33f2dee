// tests/workspace_paths.rs

mod common;
use crate::common::init_tracing;

use std::fs;
use std::path::PathBuf;

use proptest::prelude::*;
use simherd::errors::SimherdError;
use simherd::workspace::JobDescriptor;

#[test]
fn default_descriptor_resolves_to_case_0() {
    init_tracing();
    let d = JobDescriptor::default();
    assert_eq!(d.relative_dir().unwrap(), PathBuf::from("case_0"));
}

#[test]
fn label_only_descriptor_uses_the_label() {
    let d = JobDescriptor::for_case("case_7");
    assert_eq!(d.relative_dir().unwrap(), PathBuf::from("case_7"));
}

#[test]
fn point_without_label_resolves_to_point_dir() {
    let d = JobDescriptor::new(None, Some(3), None);
    assert_eq!(d.relative_dir().unwrap(), PathBuf::from("point_3"));
}

#[test]
fn point_with_label_nests_the_label() {
    let d = JobDescriptor::new(None, Some(3), Some("tension".to_string()));
    assert_eq!(
        d.relative_dir().unwrap(),
        PathBuf::from("point_3").join("tension")
    );
}

#[test]
fn full_triple_resolves_to_nested_hierarchy() {
    let d = JobDescriptor::new(Some(2), Some(5), Some("shear".to_string()));
    assert_eq!(
        d.relative_dir().unwrap(),
        PathBuf::from("gen_2").join("point_5").join("shear")
    );
}

#[test]
fn generation_without_point_is_a_missing_index() {
    let d = JobDescriptor::new(Some(1), None, Some("shear".to_string()));
    match d.relative_dir() {
        Err(SimherdError::MissingIndex(msg)) => assert!(msg.contains("point index")),
        other => panic!("expected MissingIndex, got {other:?}"),
    }
}

#[test]
fn generation_without_label_is_a_missing_index() {
    let d = JobDescriptor::new(Some(1), Some(2), None);
    match d.relative_dir() {
        Err(SimherdError::MissingIndex(msg)) => assert!(msg.contains("case label")),
        other => panic!("expected MissingIndex, got {other:?}"),
    }
}

#[test]
fn resolving_twice_is_idempotent_and_keeps_contents() {
    init_tracing();
    let root = tempfile::tempdir().unwrap();
    let d = JobDescriptor::new(Some(1), Some(2), Some("case_a".to_string()));

    let first = d.resolve_under(root.path()).unwrap();
    fs::write(first.join("existing.txt"), "keep me").unwrap();

    let second = d.resolve_under(root.path()).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        fs::read_to_string(second.join("existing.txt")).unwrap(),
        "keep me"
    );
}

/// Valid descriptor forms as produced by the job loop: the case label is
/// always of the `case_<n>` shape, and a generation index implies a point
/// index.
fn descriptor_strategy() -> impl Strategy<Value = JobDescriptor> {
    let label = (0u64..4).prop_map(|i| format!("case_{i}"));

    prop_oneof![
        label.clone().prop_map(JobDescriptor::for_case),
        ((0u64..4), label.clone())
            .prop_map(|(p, l)| JobDescriptor::new(None, Some(p), Some(l))),
        ((0u64..4), (0u64..4), label)
            .prop_map(|(g, p, l)| JobDescriptor::new(Some(g), Some(p), Some(l))),
    ]
}

proptest! {
    #[test]
    fn distinct_descriptors_resolve_to_distinct_paths(
        d1 in descriptor_strategy(),
        d2 in descriptor_strategy(),
    ) {
        prop_assume!(d1 != d2);
        prop_assert_ne!(d1.relative_dir().unwrap(), d2.relative_dir().unwrap());
    }

    #[test]
    fn resolution_is_deterministic(d in descriptor_strategy()) {
        prop_assert_eq!(d.relative_dir().unwrap(), d.relative_dir().unwrap());
    }
}
