// src/collect/mod.rs

//! Read back solver results and purge transient solver byproducts.

use std::fs;
use std::path::Path;

use anyhow::anyhow;
use globset::{Glob, GlobSetBuilder};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::errors::{Result, SimherdError};

/// Opaque, arbitrarily nested result mapping produced by the external
/// post-processing step. Ownership transfers to the pipeline caller.
pub type ResultPayload = Map<String, Value>;

/// Fixed result-artifact name the pipelines read back.
pub const RESULT_FILE: &str = "results.json";

/// Abaqus scratch/lock byproducts that corrupt the next run of the same
/// workspace if left in place.
pub const ABAQUS_SCRATCH_SUFFIXES: &[&str] = &[
    ".log",
    ".lck",
    ".SMABulk",
    ".rec",
    ".SMAFocus",
    ".exception",
    ".simlog",
    ".023",
];

/// Deserialize the result artifact at `path`.
///
/// A missing artifact means the solver did not produce output; that is
/// always a hard error, never an empty-but-valid result.
pub fn read_result(path: &Path) -> Result<ResultPayload> {
    if !path.is_file() {
        return Err(SimherdError::ResultUnavailable(path.to_path_buf()));
    }

    let contents = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&contents)?;

    match value {
        Value::Object(map) => {
            debug!(file = %path.display(), keys = map.len(), "read result artifact");
            Ok(map)
        }
        other => Err(SimherdError::Other(anyhow!(
            "result artifact {path:?} is not a mapping (got {})",
            value_kind(&other)
        ))),
    }
}

/// Delete files in `dir` (non-recursive) whose names end with one of
/// `suffixes`. Returns the number of files removed; a directory with no
/// matches is a no-op, not an error.
pub fn purge(dir: &Path, suffixes: &[&str]) -> Result<usize> {
    let mut builder = GlobSetBuilder::new();
    for suffix in suffixes {
        let glob = Glob::new(&format!("*{suffix}")).map_err(|err| {
            SimherdError::ConfigError(format!("invalid purge suffix {suffix:?}: {err}"))
        })?;
        builder.add(glob);
    }
    let matcher = builder.build().map_err(|err| {
        SimherdError::ConfigError(format!("invalid purge suffix set {suffixes:?}: {err}"))
    })?;

    let mut removed = 0;
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(name) = path.file_name() else {
            continue;
        };
        if matcher.is_match(name) {
            fs::remove_file(&path)?;
            removed += 1;
        }
    }

    if removed > 0 {
        info!(dir = %dir.display(), removed, ?suffixes, "purged solver byproducts");
    }

    Ok(removed)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
