// tests/driver_scripts.rs

mod common;
use crate::common::init_tracing;

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde_json::{Map, json};
use simherd::errors::SimherdError;
use simherd::materialize::{
    DriverSpec, PARAMETER_FILE, ScriptMode, render_driver_script, write_driver_script,
    write_parameter_file,
};

fn spec<'a>(script_dir: &'a Path) -> DriverSpec<'a> {
    DriverSpec {
        script_dir,
        entry_module: "benchmarks.von_mises",
        entry_symbol: "run_simulation",
        job_name: "Job-1",
    }
}

#[test]
fn simulation_script_carries_the_entry_point_contract() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    let source = render_driver_script(&spec(dir.path()), ScriptMode::Simulation).unwrap();

    // The imported symbol names and the call signature are load-bearing
    // contracts with the external entry point.
    assert!(source.contains("from benchmarks.von_mises import run_simulation"));
    assert!(source.contains(&format!("with open(\"{PARAMETER_FILE}\", \"r\") as fh:")));
    assert!(source.contains("params = json.load(fh)"));
    assert!(source.trim_end().ends_with("run_simulation(params)"));
    assert!(source.contains(&format!("sys.path.append(r\"{}\")", dir.path().display())));
}

#[test]
fn post_process_script_passes_the_job_name_not_the_parameters() {
    let dir = tempfile::tempdir().unwrap();

    let source = render_driver_script(&spec(dir.path()), ScriptMode::PostProcess).unwrap();

    assert!(source.contains("from benchmarks.von_mises import run_simulation"));
    assert!(source.trim_end().ends_with("run_simulation(\"Job-1\")"));
    assert!(!source.contains("json.load"));
}

#[test]
fn invalid_entry_module_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let bad = DriverSpec {
        entry_module: "benchmarks.von mises",
        ..spec(dir.path())
    };

    match render_driver_script(&bad, ScriptMode::Simulation) {
        Err(SimherdError::ConfigError(msg)) => assert!(msg.contains("module")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn invalid_entry_symbol_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let bad = DriverSpec {
        entry_symbol: "run-simulation",
        ..spec(dir.path())
    };

    assert!(render_driver_script(&bad, ScriptMode::Simulation).is_err());
}

#[test]
fn unknown_script_mode_string_is_a_config_error() {
    match ScriptMode::from_str("cleanup") {
        Err(SimherdError::ConfigError(msg)) => assert!(msg.contains("cleanup")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
    assert_eq!(ScriptMode::from_str("simulation").unwrap(), ScriptMode::Simulation);
    assert_eq!(
        ScriptMode::from_str("post_process").unwrap(),
        ScriptMode::PostProcess
    );
}

#[test]
fn parameter_file_is_utf8_json_of_the_mapping() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(PARAMETER_FILE);

    let mut params = Map::new();
    params.insert("youngs_modulus".to_string(), json!(100.0));
    params.insert("loads".to_string(), json!({"path": [0.1, 0.2]}));

    write_parameter_file(&path, &params).unwrap();

    let read: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(read, serde_json::Value::Object(params));
}

#[test]
fn driver_script_lands_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("sim_driver.py");

    write_driver_script(&target, &spec(dir.path()), ScriptMode::Simulation).unwrap();

    let on_disk = fs::read_to_string(&target).unwrap();
    assert!(on_disk.contains("import json"));
}
