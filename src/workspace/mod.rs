// src/workspace/mod.rs

//! Per-job workspace resolution and scoped working-directory changes.
//!
//! Every job owns exactly one directory, resolved deterministically from its
//! [`JobDescriptor`]. Parallelism across jobs relies on these paths never
//! colliding; the pipeline performs no locking inside a workspace.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error};

use crate::errors::{Result, SimherdError};

/// Identity tuple for one simulation run.
///
/// The resolved directory is unique per descriptor and stable across calls:
///
/// - no generation, no point: `<case_label>` (default `case_0`)
/// - point only: `point_<p>` or `point_<p>/<case_label>`
/// - generation present: point and case label become mandatory;
///   `gen_<g>/point_<p>/<case_label>`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobDescriptor {
    pub generation: Option<u64>,
    pub point: Option<u64>,
    pub case_label: Option<String>,
}

impl JobDescriptor {
    pub fn new(generation: Option<u64>, point: Option<u64>, case_label: Option<String>) -> Self {
        Self {
            generation,
            point,
            case_label,
        }
    }

    /// Descriptor for a flat, label-only workspace (`case_<n>` style).
    pub fn for_case(label: impl Into<String>) -> Self {
        Self {
            generation: None,
            point: None,
            case_label: Some(label.into()),
        }
    }

    /// Workspace directory relative to the work root.
    pub fn relative_dir(&self) -> Result<PathBuf> {
        let label = self.case_label.as_deref();

        match (self.generation, self.point) {
            (None, None) => Ok(PathBuf::from(label.unwrap_or("case_0"))),
            (None, Some(point)) => {
                let mut dir = PathBuf::from(format!("point_{point}"));
                if let Some(label) = label {
                    dir.push(label);
                }
                Ok(dir)
            }
            (Some(generation), point) => {
                let point = point.ok_or_else(|| {
                    SimherdError::MissingIndex(
                        "a generation index requires a point index".to_string(),
                    )
                })?;
                let label = label.ok_or_else(|| {
                    SimherdError::MissingIndex(
                        "a generation index requires a case label".to_string(),
                    )
                })?;
                Ok(PathBuf::from(format!("gen_{generation}"))
                    .join(format!("point_{point}"))
                    .join(label))
            }
        }
    }

    /// Resolve (and create) the workspace directory under `root`.
    ///
    /// Creation is idempotent: resolving an existing workspace again returns
    /// the same path and leaves its contents untouched.
    pub fn resolve_under(&self, root: &Path) -> Result<PathBuf> {
        let path = root.join(self.relative_dir()?);
        fs::create_dir_all(&path)?;
        debug!(workspace = %path.display(), "resolved job workspace");
        Ok(path)
    }
}

/// Scoped change of the process working directory.
///
/// The previous directory is restored when the guard drops, on every exit
/// path: normal return, `?` propagation, and unwinding. The working
/// directory is process-wide mutable state, so a stage must never outlive
/// its guard.
#[derive(Debug)]
pub struct WorkspaceGuard {
    previous: PathBuf,
    entered: PathBuf,
}

impl WorkspaceGuard {
    /// Save the current directory and change into `target`.
    pub fn enter(target: &Path) -> Result<Self> {
        let previous = env::current_dir()?;
        env::set_current_dir(target)?;
        debug!(from = %previous.display(), to = %target.display(), "entered workspace");
        Ok(Self {
            previous,
            entered: target.to_path_buf(),
        })
    }

    /// The directory this guard entered.
    pub fn entered(&self) -> &Path {
        &self.entered
    }
}

impl Drop for WorkspaceGuard {
    fn drop(&mut self) {
        if let Err(err) = env::set_current_dir(&self.previous) {
            // Nothing to propagate from a destructor; sibling stages in this
            // process will see the stale directory.
            error!(
                previous = %self.previous.display(),
                error = %err,
                "failed to restore working directory"
            );
        }
    }
}
