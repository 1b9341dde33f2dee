// src/pipeline/abaqus.rs

//! Single-stage Abaqus-style pipeline.
//!
//! Fixed order: `pre_process` resolves and creates the workspace, `execute`
//! materializes the parameter file and driver script and supervises the
//! solver, `post_process` optionally runs a second GUI-less tool pass and
//! always purges transient byproducts, and `read_back_results` is a final
//! explicit call — result collection is not part of `execute`.
//!
//! Every stage runs inside the workspace resolved from the job descriptor,
//! entered through a [`WorkspaceGuard`] so the caller's working directory
//! survives all exit paths.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::collect::{self, ABAQUS_SCRATCH_SUFFIXES, RESULT_FILE, ResultPayload};
use crate::config::model::ConfigFile;
use crate::errors::{Result, SimherdError};
use crate::materialize::{
    self, DriverSpec, PARAMETER_FILE, POST_DRIVER_SCRIPT, SIM_DRIVER_SCRIPT, ScriptMode,
};
use crate::supervisor::{
    ProcessSupervisor, SolverBackend, SolverInvocation, SupervisionMode, WatchSpec,
};
use crate::types::{Platform, RunOutcome, RunStatus};
use crate::workspace::{JobDescriptor, WorkspaceGuard};

/// External solver executable.
const ABAQUS_TOOL: &str = "abaqus";

/// Solver-facing settings for one pipeline instance.
#[derive(Debug, Clone)]
pub struct AbaqusSettings {
    pub platform: String,
    pub job_name: String,
    pub sentinel: String,
    pub max_time: Option<Duration>,
    pub startup_grace: Duration,
    pub poll_interval: Duration,
    pub kill_processes: Vec<String>,
    pub delete_result_db: bool,
}

/// Driver-script entry points and directory layout.
#[derive(Debug, Clone)]
pub struct FolderLayout {
    pub main_work_directory: PathBuf,
    pub script_path: PathBuf,
    pub sim_module: String,
    pub sim_symbol: String,
    pub post_module: String,
    pub post_symbol: String,
}

/// Single-stage pipeline around one supervised Abaqus run.
#[derive(Debug)]
pub struct AbaqusPipeline<B: SolverBackend> {
    settings: AbaqusSettings,
    folders: FolderLayout,
    parameters: Map<String, Value>,
    supervisor: ProcessSupervisor<B>,
    workspace: Option<PathBuf>,
}

impl<B: SolverBackend> AbaqusPipeline<B> {
    pub fn new(
        settings: AbaqusSettings,
        folders: FolderLayout,
        parameters: Map<String, Value>,
        backend: B,
    ) -> Self {
        Self {
            settings,
            folders,
            parameters,
            supervisor: ProcessSupervisor::new(backend),
            workspace: None,
        }
    }

    /// Build a pipeline from a validated config and merged parameters.
    pub fn from_config(cfg: &ConfigFile, parameters: Map<String, Value>, backend: B) -> Result<Self> {
        let folders = FolderLayout {
            main_work_directory: cfg.folders.main_work_directory.clone(),
            script_path: cfg.folders.script_path.clone().ok_or_else(|| {
                SimherdError::ConfigError("[folders].script_path is required".to_string())
            })?,
            sim_module: cfg.folders.sim_module.clone().ok_or_else(|| {
                SimherdError::ConfigError("[folders].sim_module is required".to_string())
            })?,
            sim_symbol: cfg.folders.sim_symbol.clone().ok_or_else(|| {
                SimherdError::ConfigError("[folders].sim_symbol is required".to_string())
            })?,
            post_module: cfg.folders.post_module.clone(),
            post_symbol: cfg.folders.post_symbol.clone(),
        };

        let settings = AbaqusSettings {
            platform: cfg.settings.platform.clone(),
            job_name: cfg.job.name.clone(),
            sentinel: cfg.job.sentinel.clone(),
            max_time: cfg.settings.max_time.map(Duration::from_secs_f64),
            startup_grace: Duration::from_secs_f64(cfg.settings.startup_grace),
            poll_interval: Duration::from_secs_f64(cfg.settings.poll_interval),
            kill_processes: cfg.job.kill_processes.clone(),
            delete_result_db: cfg.job.delete_result_db,
        };

        Ok(Self::new(settings, folders, parameters, backend))
    }

    /// Run the full fixed-order pipeline for one job.
    pub async fn run(&mut self, descriptor: &JobDescriptor) -> Result<ResultPayload> {
        self.pre_process(descriptor)?;

        let outcome = self.execute().await?;
        if outcome.status == RunStatus::Killed {
            warn!(
                job = %self.settings.job_name,
                elapsed_s = outcome.elapsed.as_secs_f64(),
                "solver run was killed at the wall-clock ceiling; results may be missing"
            );
        }

        self.post_process().await?;
        self.read_back_results()
    }

    /// Resolve and create the job workspace.
    pub fn pre_process(&mut self, descriptor: &JobDescriptor) -> Result<()> {
        let workspace = descriptor.resolve_under(&self.folders.main_work_directory)?;
        info!(workspace = %workspace.display(), "prepared job workspace");
        self.workspace = Some(workspace);
        Ok(())
    }

    /// Materialize the case and supervise the solver run.
    ///
    /// The parameter file is written before the driver script, and both
    /// before the solver is launched.
    pub async fn execute(&mut self) -> Result<RunOutcome> {
        let workspace = self.workspace()?.to_path_buf();
        let _guard = WorkspaceGuard::enter(&workspace)?;

        materialize::write_parameter_file(&workspace.join(PARAMETER_FILE), &self.parameters)?;
        materialize::write_driver_script(
            &workspace.join(SIM_DRIVER_SCRIPT),
            &self.driver_spec(&self.folders.sim_module, &self.folders.sim_symbol),
            ScriptMode::Simulation,
        )?;

        let platform = Platform::from_str(&self.settings.platform)?;
        let mode = match platform {
            Platform::Interactive => SupervisionMode::Watch(WatchSpec {
                status_file: workspace.join(format!("{}.msg", self.settings.job_name)),
                sentinel: self.settings.sentinel.clone(),
                startup_grace: self.settings.startup_grace,
                poll_interval: self.settings.poll_interval,
                max_time: self.settings.max_time,
                kill_processes: self.settings.kill_processes.clone(),
            }),
            Platform::Batch => SupervisionMode::Block,
        };

        let invocation = SolverInvocation {
            tool: ABAQUS_TOOL.to_string(),
            args: vec![
                "cae".to_string(),
                format!("noGUI={SIM_DRIVER_SCRIPT}"),
                "-mesa".to_string(),
            ],
            workdir: workspace.clone(),
            log_file: workspace.join(format!("log.{ABAQUS_TOOL}")),
            mode,
        };

        let outcome = self.supervisor.run(&invocation).await?;
        info!(
            job = %self.settings.job_name,
            status = ?outcome.status,
            elapsed_s = outcome.elapsed.as_secs_f64(),
            "simulation run ended"
        );

        // Scratch files from the run corrupt a re-entry into this workspace.
        if platform == Platform::Interactive {
            collect::purge(&workspace, ABAQUS_SCRATCH_SUFFIXES)?;
        }

        Ok(outcome)
    }

    /// Optionally run the GUI-less post-processing pass, then clean the
    /// workspace.
    pub async fn post_process(&mut self) -> Result<()> {
        let workspace = self.workspace()?.to_path_buf();
        let _guard = WorkspaceGuard::enter(&workspace)?;

        let platform = Platform::from_str(&self.settings.platform)?;
        if platform == Platform::Interactive {
            materialize::write_driver_script(
                &workspace.join(POST_DRIVER_SCRIPT),
                &self.driver_spec(&self.folders.post_module, &self.folders.post_symbol),
                ScriptMode::PostProcess,
            )?;

            let invocation = SolverInvocation {
                tool: ABAQUS_TOOL.to_string(),
                args: vec![
                    "cae".to_string(),
                    format!("noGUI={POST_DRIVER_SCRIPT}"),
                    "-mesa".to_string(),
                ],
                workdir: workspace.clone(),
                log_file: workspace.join(format!("log.{ABAQUS_TOOL}-post")),
                mode: SupervisionMode::Block,
            };

            self.supervisor.run(&invocation).await?;
        }

        collect::purge(&workspace, ABAQUS_SCRATCH_SUFFIXES)?;

        if self.settings.delete_result_db {
            collect::purge(&workspace, &[".odb"])?;
        }

        Ok(())
    }

    /// Read the result artifact the post-processing step produced.
    pub fn read_back_results(&self) -> Result<ResultPayload> {
        let workspace = self.workspace()?;
        collect::read_result(&workspace.join(RESULT_FILE))
    }

    /// Workspace resolved by `pre_process`.
    pub fn workspace(&self) -> Result<&Path> {
        self.workspace.as_deref().ok_or_else(|| {
            SimherdError::ConfigError(
                "pipeline stage ran before pre_process resolved a workspace".to_string(),
            )
        })
    }

    fn driver_spec<'a>(&'a self, module: &'a str, symbol: &'a str) -> DriverSpec<'a> {
        DriverSpec {
            script_dir: &self.folders.script_path,
            entry_module: module,
            entry_symbol: symbol,
            job_name: &self.settings.job_name,
        }
    }
}
