// src/supervisor/backend.rs

//! Pluggable solver-process backend abstraction.
//!
//! The supervisor talks to a `SolverBackend` instead of `tokio::process`
//! directly. This makes it easy to swap in a fake backend in tests while
//! keeping the production implementation here.
//!
//! - `RealSolverBackend` is the default implementation: it spawns real OS
//!   processes and shells out to `pkill` for name-based kills.
//! - Tests can provide their own `SolverBackend` that records launches and
//!   fabricates exit codes without touching the OS.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::Context;
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use crate::errors::{Result, SimherdError};

use super::SolverInvocation;

/// Handle to a launched, detached solver process.
pub trait SolverChild: Send {
    /// Kill the process. Idempotent; killing an already-dead child is not an
    /// error.
    fn kill(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Trait abstracting how solver commands reach the operating system.
///
/// Production code uses [`RealSolverBackend`]; tests provide an
/// implementation that doesn't spawn real processes.
pub trait SolverBackend: Send {
    /// Launch the invocation detached and return a handle to it.
    fn launch(&mut self, invocation: &SolverInvocation) -> Result<Box<dyn SolverChild>>;

    /// Run the invocation to completion, teeing its output into the
    /// invocation's log file, and return the exit code.
    fn run_blocking<'a>(
        &'a mut self,
        invocation: &'a SolverInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + 'a>>;

    /// Kill every process with the given name.
    ///
    /// Matching no process at all is fine; helpers may already be gone.
    fn kill_by_name<'a>(
        &'a mut self,
        process: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

/// Real backend used in production.
#[derive(Debug, Default)]
pub struct RealSolverBackend;

impl RealSolverBackend {
    pub fn new() -> Self {
        Self
    }
}

struct RealChild {
    child: Child,
    tool: String,
}

impl SolverChild for RealChild {
    fn kill(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            if let Err(err) = self.child.kill().await {
                // The child routinely exits on its own before we get here.
                debug!(tool = %self.tool, error = %err, "kill on solver child returned an error");
            }
            Ok(())
        })
    }
}

impl SolverBackend for RealSolverBackend {
    fn launch(&mut self, invocation: &SolverInvocation) -> Result<Box<dyn SolverChild>> {
        info!(
            tool = %invocation.tool,
            args = ?invocation.args,
            workdir = %invocation.workdir.display(),
            "launching solver process"
        );

        let child = Command::new(&invocation.tool)
            .args(&invocation.args)
            .current_dir(&invocation.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("spawning solver process '{}'", invocation.tool))?;

        Ok(Box::new(RealChild {
            child,
            tool: invocation.tool.clone(),
        }))
    }

    fn run_blocking<'a>(
        &'a mut self,
        invocation: &'a SolverInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + 'a>> {
        Box::pin(async move {
            // Both output streams land in the stage log file, which failure
            // errors point the user at.
            let log = std::fs::File::create(&invocation.log_file).with_context(|| {
                format!("creating log file {:?}", invocation.log_file)
            })?;
            let log_err = log
                .try_clone()
                .with_context(|| format!("cloning log handle {:?}", invocation.log_file))?;

            let mut child = Command::new(&invocation.tool)
                .args(&invocation.args)
                .current_dir(&invocation.workdir)
                .stdin(Stdio::null())
                .stdout(Stdio::from(log))
                .stderr(Stdio::from(log_err))
                .kill_on_drop(true)
                .spawn()
                .with_context(|| format!("spawning tool '{}'", invocation.tool))?;

            let status = child
                .wait()
                .await
                .with_context(|| format!("waiting for tool '{}'", invocation.tool))?;

            let code = status.code().unwrap_or(-1);
            debug!(
                tool = %invocation.tool,
                exit_code = code,
                success = status.success(),
                "tool process exited"
            );

            Ok(code)
        })
    }

    fn kill_by_name<'a>(
        &'a mut self,
        process: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            if process.trim().is_empty() {
                return Err(SimherdError::ConfigError(
                    "refusing to pkill an empty process name".to_string(),
                ));
            }

            // pkill exits 1 when nothing matched, which is the common case
            // once the solver wound down cleanly.
            let status = Command::new("pkill")
                .arg(process)
                .status()
                .await
                .with_context(|| format!("running pkill for '{process}'"))?;

            match status.code() {
                Some(0) => info!(process, "killed orphaned solver helper processes"),
                Some(1) => debug!(process, "no helper processes left to kill"),
                other => warn!(process, exit = ?other, "pkill reported an unexpected status"),
            }

            Ok(())
        })
    }
}
