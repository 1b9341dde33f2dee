// src/types.rs

use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::errors::SimherdError;

/// Which pipeline variant a config drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulatorKind {
    Abaqus,
    Openfoam,
}

impl Default for SimulatorKind {
    fn default() -> Self {
        SimulatorKind::Abaqus
    }
}

impl FromStr for SimulatorKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abaqus" => Ok(SimulatorKind::Abaqus),
            "openfoam" => Ok(SimulatorKind::Openfoam),
            other => Err(format!(
                "invalid simulator: {other} (expected \"abaqus\" or \"openfoam\")"
            )),
        }
    }
}

/// Execution platform for the solver process.
///
/// - `Interactive` (config value `"ubuntu"`): the solver is launched detached
///   and supervised by polling its status file for a completion sentinel.
/// - `Batch` (config value `"cluster"`): the scheduler owns the process; the
///   call blocks on the command and the exit status is authoritative.
///
/// An unknown platform string is fatal and never retried; it surfaces at the
/// point a stage executes, not at config load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Interactive,
    Batch,
}

impl FromStr for Platform {
    type Err = SimherdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ubuntu" => Ok(Platform::Interactive),
            "cluster" => Ok(Platform::Batch),
            other => Err(SimherdError::PlatformNotImplemented(other.to_string())),
        }
    }
}

/// Terminal state of one supervised solver invocation.
///
/// Fatal errors travel on the `Err` channel of [`crate::errors::Result`], so a
/// supervised run ends in exactly one of `Finished`, `Killed`, or `Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Completion sentinel observed (watch mode) or exit status 0 (block mode).
    Finished,
    /// Wall-clock ceiling exceeded while still polling; process was killed.
    Killed,
}

/// Outcome of one supervised solver invocation. Never mutated after creation.
#[derive(Debug, Clone, Copy)]
pub struct RunOutcome {
    pub status: RunStatus,
    pub elapsed: Duration,
}

impl RunOutcome {
    pub fn finished(&self) -> bool {
        self.status == RunStatus::Finished
    }
}
