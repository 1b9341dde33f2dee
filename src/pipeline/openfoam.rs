// src/pipeline/openfoam.rs

//! Multi-stage OpenFOAM-style pipeline.
//!
//! A job clones a template case into its own directory, then walks three
//! ordered stage lists — preprocess, solve, postprocess. Each stage wraps an
//! external tool invocation (`<tool> -case <dir> [options...]`) between
//! optional user hooks, and fails fast with an error naming the stage's log
//! file when the tool does not succeed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::config::model::ConfigFile;
use crate::errors::{Result, SimherdError};
use crate::pipeline::stage::{AUTO_TOOL, CASE_PREPARE_TOOL, StageRole, StageSpec};
use crate::supervisor::{ProcessSupervisor, SolverBackend, SolverInvocation, SupervisionMode};

/// Case parameter file consumed by the case-preparation utility. Written
/// without a PyFoam-style header; the utility fails to parse one.
pub const CASE_PARAMETER_FILE: &str = "caseParameters";

/// Executable the `prepareCase` stage shells out to.
const CASE_PREPARE_UTILITY: &str = "pyFoamPrepareCase.py";

/// Multi-stage pipeline over one cloned case directory.
#[derive(Debug)]
pub struct OpenFoamPipeline<B: SolverBackend> {
    case_source: PathBuf,
    case_name: String,
    output_dir: PathBuf,
    job_id: u64,
    preprocess: Vec<StageSpec>,
    solve: Vec<StageSpec>,
    postprocess: Vec<StageSpec>,
    parameters: Map<String, Value>,
    supervisor: ProcessSupervisor<B>,
    case_dir: Option<PathBuf>,
}

impl<B: SolverBackend> OpenFoamPipeline<B> {
    /// Build a pipeline from a validated config and merged parameters.
    pub fn from_config(
        cfg: &ConfigFile,
        parameters: Map<String, Value>,
        job_id: u64,
        backend: B,
    ) -> Result<Self> {
        let case = cfg.case.as_ref().ok_or_else(|| {
            SimherdError::ConfigError("[case] section is required".to_string())
        })?;

        Ok(Self {
            case_source: case.source.clone(),
            case_name: case.effective_name(),
            output_dir: case.output.clone(),
            job_id,
            preprocess: cfg.preprocess.iter().map(StageSpec::from_config).collect(),
            solve: cfg.solve.iter().map(StageSpec::from_config).collect(),
            postprocess: cfg.postprocess.iter().map(StageSpec::from_config).collect(),
            parameters,
            supervisor: ProcessSupervisor::new(backend),
            case_dir: None,
        })
    }

    /// Mutable access to a stage list, e.g. for attaching hooks.
    pub fn stages_mut(&mut self, role: StageRole) -> &mut Vec<StageSpec> {
        match role {
            StageRole::Preprocess => &mut self.preprocess,
            StageRole::Solve => &mut self.solve,
            StageRole::Postprocess => &mut self.postprocess,
        }
    }

    /// Case directory of this job, once `pre_process` has cloned it.
    pub fn case_dir(&self) -> Result<&Path> {
        self.case_dir.as_deref().ok_or_else(|| {
            SimherdError::ConfigError(
                "pipeline stage ran before pre_process cloned the case".to_string(),
            )
        })
    }

    /// Run the whole pipeline: clone the case, then walk all three stage
    /// lists in order.
    pub async fn run(&mut self) -> Result<()> {
        self.pre_process().await?;
        self.run_stage_list(StageRole::Preprocess).await?;
        self.run_stage_list(StageRole::Solve).await?;
        self.run_stage_list(StageRole::Postprocess).await?;
        info!(case = %self.case_name, job = self.job_id, "case pipeline finished");
        Ok(())
    }

    /// Clone the template case into `<output>/<case>_<job>` and reset it.
    pub async fn pre_process(&mut self) -> Result<()> {
        let case_dir = self
            .output_dir
            .join(format!("{}_{}", self.case_name, self.job_id));

        copy_dir_all(&self.case_source, &case_dir)?;
        info!(
            source = %self.case_source.display(),
            case = %case_dir.display(),
            "cloned template case"
        );

        // A template case usually ships its own cleanup script; running it
        // resets generated meshes and time directories from earlier runs.
        let allclean = case_dir.join("Allclean");
        if allclean.is_file() {
            info!(script = %allclean.display(), "running case cleanup script");
            let invocation = SolverInvocation {
                tool: "sh".to_string(),
                args: vec!["Allclean".to_string()],
                workdir: case_dir.clone(),
                log_file: case_dir.join("log.Allclean"),
                mode: SupervisionMode::Block,
            };
            self.supervisor.run(&invocation).await?;
        }

        self.case_dir = Some(case_dir);
        Ok(())
    }

    /// Run every stage of one list in order, failing fast on the first
    /// stage error.
    pub async fn run_stage_list(&mut self, role: StageRole) -> Result<()> {
        let stages = std::mem::take(self.stages_mut(role));

        let mut result = Ok(());
        for (idx, spec) in stages.iter().enumerate() {
            debug!(%role, idx, tool = %spec.tool, "starting stage");
            result = self.run_stage(spec, role).await;
            if result.is_err() {
                break;
            }
        }

        *self.stages_mut(role) = stages;
        result
    }

    async fn run_stage(&mut self, spec: &StageSpec, role: StageRole) -> Result<()> {
        let case_dir = self.case_dir()?.to_path_buf();

        if let Some(pre) = &spec.pre_func {
            pre(&case_dir)?;
        }

        let tool = self.effective_tool(spec, role, &case_dir)?;

        if role == StageRole::Preprocess && tool == CASE_PREPARE_TOOL {
            self.prepare_case(&case_dir, spec).await?;
        } else {
            let log_file = case_dir.join(format!("log.{tool}"));
            let mut args = vec!["-case".to_string(), case_dir.display().to_string()];
            args.extend(spec.options.iter().cloned());

            let invocation = SolverInvocation {
                tool: tool.clone(),
                args,
                workdir: case_dir.clone(),
                log_file,
                mode: SupervisionMode::Block,
            };

            self.supervisor.run(&invocation).await?;
        }

        if let Some(post) = &spec.post_func {
            post(&case_dir)?;
        }

        Ok(())
    }

    fn effective_tool(&self, spec: &StageSpec, role: StageRole, case_dir: &Path) -> Result<String> {
        let tool = spec.tool.trim();

        if tool.is_empty() {
            return Err(SimherdError::ConfigError(format!(
                "{role} stage has an empty tool identifier"
            )));
        }

        if role == StageRole::Solve && tool == AUTO_TOOL {
            return detect_application(case_dir);
        }

        Ok(tool.to_string())
    }

    /// Dedicated path for the case-preparation utility: write the case
    /// parameter file, then shell out directly. The utility misbehaves when
    /// driven through the generic runner's in-process binding.
    async fn prepare_case(&mut self, case_dir: &Path, spec: &StageSpec) -> Result<()> {
        let parameter_file = case_dir.join(CASE_PARAMETER_FILE);
        fs::write(&parameter_file, render_foam_dict(&self.parameters))?;
        info!(
            file = %parameter_file.display(),
            keys = self.parameters.len(),
            "wrote case parameter file"
        );

        let log_file = case_dir.join(format!("log.{CASE_PREPARE_TOOL}"));
        let mut args = vec![
            case_dir.display().to_string(),
            format!("--parameter-file={CASE_PARAMETER_FILE}"),
        ];
        args.extend(spec.options.iter().cloned());

        let invocation = SolverInvocation {
            tool: CASE_PREPARE_UTILITY.to_string(),
            args,
            workdir: case_dir.to_path_buf(),
            log_file: log_file.clone(),
            mode: SupervisionMode::Block,
        };

        let exit_code = self.supervisor.backend_mut().run_blocking(&invocation).await?;
        if exit_code != 0 {
            return Err(SimherdError::ToolFailure {
                tool: CASE_PREPARE_TOOL.to_string(),
                log: log_file,
            });
        }

        Ok(())
    }
}

/// Resolve the `"auto"` solve tool from the case's controlDict.
fn detect_application(case_dir: &Path) -> Result<String> {
    let control_dict = case_dir.join("system").join("controlDict");
    let contents = fs::read_to_string(&control_dict).map_err(|err| {
        SimherdError::ConfigError(format!(
            "cannot auto-detect the solver: reading {control_dict:?}: {err}"
        ))
    })?;

    let re = Regex::new(r"(?m)^\s*application\s+([A-Za-z0-9_.]+)\s*;").map_err(anyhow::Error::from)?;
    let tool = re
        .captures(&contents)
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| {
            SimherdError::ConfigError(format!(
                "no application entry in {control_dict:?} to auto-detect the solver from"
            ))
        })?;

    info!(tool = %tool, "auto-detected solver from controlDict");
    Ok(tool)
}

/// Render a merged parameter mapping as an OpenFOAM dictionary, header-less.
fn render_foam_dict(parameters: &Map<String, Value>) -> String {
    let mut out = String::new();
    render_entries(&mut out, parameters, 0);
    out
}

fn render_entries(out: &mut String, map: &Map<String, Value>, depth: usize) {
    let pad = "    ".repeat(depth);
    for (key, value) in map {
        match value {
            Value::Object(nested) => {
                out.push_str(&format!("{pad}{key}\n{pad}{{\n"));
                render_entries(out, nested, depth + 1);
                out.push_str(&format!("{pad}}}\n"));
            }
            other => {
                out.push_str(&format!("{pad}{key} {};\n", foam_value(other)));
            }
        }
    }
}

fn foam_value(value: &Value) -> String {
    match value {
        Value::Null => "none".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => {
            if s.chars().all(|c| c.is_ascii_alphanumeric() || "._-/".contains(c)) && !s.is_empty() {
                s.clone()
            } else {
                format!("{s:?}")
            }
        }
        Value::Array(items) => {
            let rendered: Vec<String> = items.iter().map(foam_value).collect();
            format!("( {} )", rendered.join(" "))
        }
        Value::Object(_) => String::new(),
    }
}

fn copy_dir_all(src: &Path, dst: &Path) -> io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_all(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
