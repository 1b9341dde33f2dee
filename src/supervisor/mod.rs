// src/supervisor/mod.rs

//! External-process supervision.
//!
//! A supervised invocation walks a small state machine:
//!
//! ```text
//! Launched --grace sleep--> Polling --sentinel--> Finished
//!     |                        |  ^
//!     |                        |  | status file unreadable
//!     |                        v  | (license stall / startup)
//!     |                     LicenseWait
//!     |                        |
//!     |                        +--ceiling exceeded--> Killed
//!     |
//!     +--block mode--> (synchronous wait) --exit 0--> Finished
//!                                         --nonzero--> Error
//! ```
//!
//! Watch mode exists because these solvers give no usable exit status: the
//! launcher process returns long before the analysis ends, and completion is
//! only observable as a sentinel string in a solver-written status file. The
//! supervisor owns kill semantics, including killing same-named helper
//! processes that re-parent away from the launched child.
//!
//! Exactly one terminal state is reached per invocation; the supervisor
//! never returns control while still polling.
//!
//! - [`backend`] provides the [`SolverBackend`] / [`SolverChild`] traits and
//!   the production `tokio::process` implementation, so tests never spawn a
//!   real solver.
//! - [`watch`] implements the polling loop.

pub mod backend;
pub mod watch;

pub use backend::{RealSolverBackend, SolverBackend, SolverChild};

use std::path::PathBuf;
use std::time::Duration;

use tokio::time::Instant;
use tracing::info;

use crate::errors::{Result, SimherdError};
use crate::types::{RunOutcome, RunStatus};

/// Delay before the first poll; solvers need startup time before any status
/// file exists.
pub const DEFAULT_STARTUP_GRACE: Duration = Duration::from_secs(20);

/// Default poll cadence.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// How a supervised invocation decides it is done.
#[derive(Debug, Clone)]
pub enum SupervisionMode {
    /// Detached launch + fixed-cadence polling of a status file.
    Watch(WatchSpec),
    /// Synchronous wait on the command; the exit status is authoritative.
    Block,
}

/// Parameters for sentinel polling.
#[derive(Debug, Clone)]
pub struct WatchSpec {
    /// Solver-written file polled for the completion sentinel.
    pub status_file: PathBuf,
    /// Fixed string whose presence means the analysis completed.
    pub sentinel: String,
    /// Sleep before the first poll.
    pub startup_grace: Duration,
    /// Poll cadence; polls land on `start + k * poll_interval`.
    pub poll_interval: Duration,
    /// Hard wall-clock ceiling; exceeding it kills the run.
    pub max_time: Option<Duration>,
    /// Helper process names killed together with the child.
    pub kill_processes: Vec<String>,
}

impl WatchSpec {
    pub fn new(status_file: impl Into<PathBuf>, sentinel: impl Into<String>) -> Self {
        Self {
            status_file: status_file.into(),
            sentinel: sentinel.into(),
            startup_grace: DEFAULT_STARTUP_GRACE,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_time: None,
            kill_processes: Vec::new(),
        }
    }
}

/// One concrete external command under supervision.
///
/// Immutable once launched; a new invocation is created per pipeline stage.
#[derive(Debug, Clone)]
pub struct SolverInvocation {
    /// Executable name.
    pub tool: String,
    /// Arguments in exact order; external tools are picky about it.
    pub args: Vec<String>,
    /// Working directory the process runs in.
    pub workdir: PathBuf,
    /// Where block-mode output is teed; named in failure errors.
    pub log_file: PathBuf,
    pub mode: SupervisionMode,
}

/// Drives [`SolverInvocation`]s to a terminal state through a
/// [`SolverBackend`].
#[derive(Debug)]
pub struct ProcessSupervisor<B: SolverBackend> {
    backend: B,
}

impl<B: SolverBackend> ProcessSupervisor<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Direct backend access, for paths that bypass the generic runner.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Supervise one invocation to its terminal state.
    pub async fn run(&mut self, invocation: &SolverInvocation) -> Result<RunOutcome> {
        match &invocation.mode {
            SupervisionMode::Watch(spec) => {
                watch::supervise(&mut self.backend, invocation, spec).await
            }
            SupervisionMode::Block => self.run_blocking(invocation).await,
        }
    }

    async fn run_blocking(&mut self, invocation: &SolverInvocation) -> Result<RunOutcome> {
        info!(
            tool = %invocation.tool,
            workdir = %invocation.workdir.display(),
            "running tool to completion"
        );

        let started = Instant::now();
        let exit_code = self.backend.run_blocking(invocation).await?;
        let elapsed = started.elapsed();

        if exit_code != 0 {
            return Err(SimherdError::ToolFailure {
                tool: invocation.tool.clone(),
                log: invocation.log_file.clone(),
            });
        }

        info!(
            tool = %invocation.tool,
            elapsed_s = elapsed.as_secs_f64(),
            "tool run finished"
        );

        Ok(RunOutcome {
            status: RunStatus::Finished,
            elapsed,
        })
    }
}
