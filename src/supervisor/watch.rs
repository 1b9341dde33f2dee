// src/supervisor/watch.rs

//! Sentinel-polling loop for detached solver processes.
//!
//! Poll times are aligned to the invocation start (`start + k * interval`),
//! not to the previous poll, so cadence never drifts no matter how long a
//! status-file read takes. An unreadable status file is a transient
//! condition: either the solver has not started writing yet or the license
//! server is stalling the run; both recover by continuing to poll.

use std::fs;
use std::time::Duration;

use tokio::time::{Instant, sleep};
use tracing::{info, warn};

use crate::errors::Result;
use crate::types::{RunOutcome, RunStatus};

use super::backend::{SolverBackend, SolverChild};
use super::{SolverInvocation, WatchSpec};

/// Launch the invocation detached and poll its status file until a terminal
/// state is reached.
pub(crate) async fn supervise<B: SolverBackend + ?Sized>(
    backend: &mut B,
    invocation: &SolverInvocation,
    spec: &WatchSpec,
) -> Result<RunOutcome> {
    let mut child = backend.launch(invocation)?;
    let started = Instant::now();

    sleep(spec.startup_grace).await;

    loop {
        sleep(time_to_next_poll(started, spec.poll_interval)).await;

        match fs::read_to_string(&spec.status_file) {
            Ok(contents) if contents.contains(&spec.sentinel) => {
                let elapsed = started.elapsed();
                info!(
                    tool = %invocation.tool,
                    elapsed_s = elapsed.as_secs_f64(),
                    "completion sentinel found; stopping solver"
                );
                shut_down(backend, &mut *child, spec).await?;
                return Ok(RunOutcome {
                    status: RunStatus::Finished,
                    elapsed,
                });
            }
            Ok(_) => {
                // Solver is writing but not done yet.
            }
            Err(err) => {
                info!(
                    status_file = %spec.status_file.display(),
                    error = %err,
                    "status file not readable; waiting for solver startup or license authorization"
                );
            }
        }

        if let Some(max_time) = spec.max_time {
            let elapsed = started.elapsed();
            if elapsed > max_time {
                warn!(
                    tool = %invocation.tool,
                    elapsed_s = elapsed.as_secs_f64(),
                    ceiling_s = max_time.as_secs_f64(),
                    "wall-clock ceiling exceeded; killing solver"
                );
                shut_down(backend, &mut *child, spec).await?;
                return Ok(RunOutcome {
                    status: RunStatus::Killed,
                    elapsed,
                });
            }
        }
    }
}

/// Sleep amount that lands the next wake-up on a `start + k * interval`
/// boundary.
fn time_to_next_poll(started: Instant, interval: Duration) -> Duration {
    let interval_s = interval.as_secs_f64().max(1e-3);
    let elapsed_s = started.elapsed().as_secs_f64();
    Duration::from_secs_f64(interval_s - (elapsed_s % interval_s))
}

/// Kill the supervised child and any same-named helper processes it spawned.
async fn shut_down<B: SolverBackend + ?Sized>(
    backend: &mut B,
    child: &mut dyn SolverChild,
    spec: &WatchSpec,
) -> Result<()> {
    child.kill().await?;

    for process in &spec.kill_processes {
        backend.kill_by_name(process).await?;
    }

    Ok(())
}
