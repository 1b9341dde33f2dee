// src/materialize/mod.rs

//! Turn a merged configuration mapping into the artifacts a solver consumes:
//! a JSON parameter file and a generated driver script that imports the
//! external simulation entry point and feeds it the parameters.
//!
//! The script templates use named placeholders; the imported symbol names
//! and call signatures are load-bearing contracts with the external entry
//! points, so identifiers are validated before rendering and the rendered
//! source is checked for leftover placeholders before it is written. The
//! parameter file is always written before the script that consumes it.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use crate::errors::{Result, SimherdError};

/// Fixed parameter-file name the generated driver script loads.
pub const PARAMETER_FILE: &str = "sim_params.json";

/// Generated simulation driver script name.
pub const SIM_DRIVER_SCRIPT: &str = "sim_driver.py";

/// Generated post-processing driver script name.
pub const POST_DRIVER_SCRIPT: &str = "post_driver.py";

const SIMULATION_TEMPLATE: &str = r#"import os
import sys
import json

sys.path.append(r"@script_dir@")
from @module@ import @symbol@

with open("@parameter_file@", "r") as fh:
    params = json.load(fh)

@symbol@(params)
"#;

const POST_PROCESS_TEMPLATE: &str = r#"import os
import sys

sys.path.append(r"@script_dir@")
from @module@ import @symbol@

@symbol@("@job_name@")
"#;

/// Which driver-script template to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptMode {
    /// Import the simulation entry point and call it with the parameter
    /// mapping loaded from [`PARAMETER_FILE`].
    Simulation,
    /// Import the post-processing entry point and call it with the job name.
    PostProcess,
}

impl FromStr for ScriptMode {
    type Err = SimherdError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "simulation" => Ok(ScriptMode::Simulation),
            "post_process" => Ok(ScriptMode::PostProcess),
            other => Err(SimherdError::ConfigError(format!(
                "unknown script mode: {other} (expected \"simulation\" or \"post_process\")"
            ))),
        }
    }
}

/// Everything a driver-script template needs filled in.
#[derive(Debug, Clone)]
pub struct DriverSpec<'a> {
    /// Directory appended to the script's module search path.
    pub script_dir: &'a Path,
    /// Module the entry point is imported from (dotted path).
    pub entry_module: &'a str,
    /// Entry symbol called by the script.
    pub entry_symbol: &'a str,
    /// Job/case identifier handed to the post-processing entry point.
    pub job_name: &'a str,
}

/// Write the merged configuration mapping as UTF-8 pretty JSON.
///
/// Must run before the driver script consuming it is ever executed; the
/// pipeline guarantees the ordering by writing the parameter file first.
pub fn write_parameter_file(path: &Path, parameters: &Map<String, Value>) -> Result<()> {
    let json = serde_json::to_string_pretty(&Value::Object(parameters.clone()))?;
    fs::write(path, json)?;
    debug!(file = %path.display(), keys = parameters.len(), "wrote parameter file");
    Ok(())
}

/// Render and write a driver script for the given mode.
///
/// Fails with a configuration error before writing anything if the entry
/// module/symbol are not well-formed identifiers, the script directory is
/// not representable in generated source, or the rendered script still
/// contains an unfilled placeholder.
pub fn write_driver_script(target: &Path, spec: &DriverSpec<'_>, mode: ScriptMode) -> Result<()> {
    let source = render_driver_script(spec, mode)?;
    fs::write(target, source)?;
    debug!(script = %target.display(), ?mode, "wrote driver script");
    Ok(())
}

/// Render a driver script without writing it.
pub fn render_driver_script(spec: &DriverSpec<'_>, mode: ScriptMode) -> Result<String> {
    let script_dir = embeddable_script_dir(spec.script_dir)?;
    validate_module(spec.entry_module)?;
    validate_symbol(spec.entry_symbol)?;

    let rendered = match mode {
        ScriptMode::Simulation => SIMULATION_TEMPLATE
            .replace("@script_dir@", &script_dir)
            .replace("@module@", spec.entry_module)
            .replace("@symbol@", spec.entry_symbol)
            .replace("@parameter_file@", PARAMETER_FILE),
        ScriptMode::PostProcess => {
            if spec.job_name.contains(['"', '\n', '\\']) {
                return Err(SimherdError::ConfigError(format!(
                    "job name {:?} cannot be embedded in a driver script",
                    spec.job_name
                )));
            }
            POST_PROCESS_TEMPLATE
                .replace("@script_dir@", &script_dir)
                .replace("@module@", spec.entry_module)
                .replace("@symbol@", spec.entry_symbol)
                .replace("@job_name@", spec.job_name)
        }
    };

    // A malformed script fails silently inside the external tool, so catch
    // unfilled placeholders here instead.
    if rendered.contains('@') {
        return Err(SimherdError::ConfigError(format!(
            "driver script for {mode:?} rendered with an unfilled placeholder"
        )));
    }

    Ok(rendered)
}

fn embeddable_script_dir(dir: &Path) -> Result<String> {
    let dir = dir.to_str().ok_or_else(|| {
        SimherdError::ConfigError(format!(
            "script path {dir:?} is not valid UTF-8 and cannot be embedded in a driver script"
        ))
    })?;

    // The template embeds the path in a raw string literal; a quote or
    // newline would terminate it early.
    if dir.contains('"') || dir.contains('\n') || dir.contains('@') {
        return Err(SimherdError::ConfigError(format!(
            "script path {dir:?} cannot be embedded in a driver script"
        )));
    }

    Ok(dir.to_string())
}

fn validate_module(module: &str) -> Result<()> {
    let re = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
        .map_err(anyhow::Error::from)?;
    if !re.is_match(module) {
        return Err(SimherdError::ConfigError(format!(
            "entry module {module:?} is not a valid dotted module path"
        )));
    }
    Ok(())
}

fn validate_symbol(symbol: &str) -> Result<()> {
    let re = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").map_err(anyhow::Error::from)?;
    if !re.is_match(symbol) {
        return Err(SimherdError::ConfigError(format!(
            "entry symbol {symbol:?} is not a valid identifier"
        )));
    }
    Ok(())
}
