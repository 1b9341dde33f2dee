// tests/supervisor_behaviour.rs

mod common;
use crate::common::fake_solver::FakeSolverBackend;
use crate::common::{init_tracing, with_timeout};

use std::time::Duration;

use simherd::errors::SimherdError;
use simherd::supervisor::{
    ProcessSupervisor, SolverInvocation, SupervisionMode, WatchSpec,
};
use simherd::types::RunStatus;

fn watch_invocation(workdir: &std::path::Path, spec: WatchSpec) -> SolverInvocation {
    SolverInvocation {
        tool: "fakesolver".to_string(),
        args: vec!["cae".to_string(), "noGUI=sim_driver.py".to_string(), "-mesa".to_string()],
        workdir: workdir.to_path_buf(),
        log_file: workdir.join("log.fakesolver"),
        mode: SupervisionMode::Watch(spec),
    }
}

fn fast_watch_spec(status_file: std::path::PathBuf) -> WatchSpec {
    WatchSpec {
        startup_grace: Duration::from_millis(20),
        poll_interval: Duration::from_millis(100),
        max_time: None,
        kill_processes: Vec::new(),
        ..WatchSpec::new(status_file, "THE ANALYSIS HAS BEEN COMPLETED")
    }
}

#[tokio::test]
async fn sentinel_within_one_poll_interval_finishes() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let status_file = dir.path().join("Job-1.msg");

    let backend = FakeSolverBackend::new().write_on_launch(
        &status_file,
        "step 12 ok\nTHE ANALYSIS HAS BEEN COMPLETED\n",
        Duration::from_millis(30),
    );
    let record = backend.record();
    let mut supervisor = ProcessSupervisor::new(backend);

    let mut spec = fast_watch_spec(status_file);
    // A generous ceiling must never fire when the sentinel shows up first.
    spec.max_time = Some(Duration::from_secs(5));
    let invocation = watch_invocation(dir.path(), spec);

    let outcome = with_timeout(supervisor.run(&invocation)).await.unwrap();

    assert_eq!(outcome.status, RunStatus::Finished);
    assert!(outcome.elapsed < Duration::from_secs(2));
    assert_eq!(*record.child_kills.lock().unwrap(), 1);
    assert_eq!(record.launched_tools(), vec!["fakesolver".to_string()]);
}

#[tokio::test]
async fn missing_sentinel_kills_at_the_ceiling() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    // The status file exists but never contains the sentinel.
    let status_file = dir.path().join("Job-1.msg");
    std::fs::write(&status_file, "iterating forever\n").unwrap();

    let backend = FakeSolverBackend::new();
    let record = backend.record();
    let mut supervisor = ProcessSupervisor::new(backend);

    let mut spec = fast_watch_spec(status_file);
    spec.max_time = Some(Duration::from_millis(400));
    let invocation = watch_invocation(dir.path(), spec);

    let outcome = with_timeout(supervisor.run(&invocation)).await.unwrap();

    assert_eq!(outcome.status, RunStatus::Killed);
    // Killed at approximately start + ceiling: the first poll boundary past
    // the ceiling, with scheduling slack.
    assert!(outcome.elapsed >= Duration::from_millis(400));
    assert!(outcome.elapsed < Duration::from_millis(1500));
    assert_eq!(*record.child_kills.lock().unwrap(), 1);
}

#[tokio::test]
async fn unreadable_status_file_is_transient_not_fatal() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let status_file = dir.path().join("Job-1.msg");

    // The file only appears after a few polls have already failed to read
    // it, as with a stalled license checkout.
    let backend = FakeSolverBackend::new().write_on_launch(
        &status_file,
        "THE ANALYSIS HAS BEEN COMPLETED\n",
        Duration::from_millis(350),
    );
    let mut supervisor = ProcessSupervisor::new(backend);

    let invocation = watch_invocation(dir.path(), fast_watch_spec(status_file));
    let outcome = with_timeout(supervisor.run(&invocation)).await.unwrap();

    assert_eq!(outcome.status, RunStatus::Finished);
    assert!(outcome.elapsed >= Duration::from_millis(350));
}

#[tokio::test]
async fn sentinel_hit_kills_configured_helper_processes() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let status_file = dir.path().join("Job-1.msg");

    let backend = FakeSolverBackend::new().write_on_launch(
        &status_file,
        "THE ANALYSIS HAS BEEN COMPLETED\n",
        Duration::from_millis(30),
    );
    let record = backend.record();
    let mut supervisor = ProcessSupervisor::new(backend);

    let mut spec = fast_watch_spec(status_file);
    spec.kill_processes = vec!["standard".to_string(), "ABQcaeK".to_string()];
    let invocation = watch_invocation(dir.path(), spec);

    let outcome = with_timeout(supervisor.run(&invocation)).await.unwrap();

    assert_eq!(outcome.status, RunStatus::Finished);
    assert_eq!(
        *record.pkilled.lock().unwrap(),
        vec!["standard".to_string(), "ABQcaeK".to_string()]
    );
}

#[tokio::test]
async fn block_mode_finishes_on_exit_zero() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    let backend = FakeSolverBackend::new();
    let record = backend.record();
    let mut supervisor = ProcessSupervisor::new(backend);

    let invocation = SolverInvocation {
        tool: "blockMesh".to_string(),
        args: vec!["-case".to_string(), dir.path().display().to_string()],
        workdir: dir.path().to_path_buf(),
        log_file: dir.path().join("log.blockMesh"),
        mode: SupervisionMode::Block,
    };

    let outcome = with_timeout(supervisor.run(&invocation)).await.unwrap();

    assert_eq!(outcome.status, RunStatus::Finished);
    assert_eq!(record.blocking_tools(), vec!["blockMesh".to_string()]);
    assert!(record.launched.lock().unwrap().is_empty());
}

#[tokio::test]
async fn block_mode_nonzero_exit_is_a_tool_failure_naming_the_log() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();

    let backend = FakeSolverBackend::new();
    backend.push_exit_code(1);
    let mut supervisor = ProcessSupervisor::new(backend);

    let log_file = dir.path().join("log.blockMesh");
    let invocation = SolverInvocation {
        tool: "blockMesh".to_string(),
        args: vec!["-case".to_string(), dir.path().display().to_string()],
        workdir: dir.path().to_path_buf(),
        log_file: log_file.clone(),
        mode: SupervisionMode::Block,
    };

    match with_timeout(supervisor.run(&invocation)).await {
        Err(SimherdError::ToolFailure { tool, log }) => {
            assert_eq!(tool, "blockMesh");
            assert_eq!(log, log_file);
        }
        other => panic!("expected ToolFailure, got {other:?}"),
    }
}
