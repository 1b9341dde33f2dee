// src/config/model.rs

use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::types::SimulatorKind;

/// Top-level configuration as read from a TOML file.
///
/// An Abaqus-style job reads roughly:
///
/// ```toml
/// [settings]
/// simulator = "abaqus"
/// platform = "ubuntu"
/// max_time = 3600.0
///
/// [folders]
/// script_path = "/opt/sim/scripts"
/// sim_module = "benchmarks.von_mises"
/// sim_symbol = "run_simulation"
///
/// [parameters]
/// youngs_modulus = 100.0
/// mesh_partition = 50
/// ```
///
/// An OpenFOAM-style job instead carries a `[case]` section plus ordered
/// stage lists:
///
/// ```toml
/// [settings]
/// simulator = "openfoam"
///
/// [case]
/// source = "cases/cavity"
///
/// [[preprocess]]
/// tool = "blockMesh"
///
/// [[solve]]
/// tool = "auto"
///
/// [[postprocess]]
/// tool = "postProcess"
/// options = ["-func", "streamFunction"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub settings: SettingsSection,

    #[serde(default)]
    pub folders: FoldersSection,

    #[serde(default)]
    pub job: JobSection,

    /// OpenFOAM case layout; required when `simulator = "openfoam"`.
    #[serde(default)]
    pub case: Option<CaseSection>,

    /// Ordered preprocessor stages (`[[preprocess]]`).
    #[serde(default)]
    pub preprocess: Vec<StageConfig>,

    /// Ordered solver stages (`[[solve]]`).
    #[serde(default)]
    pub solve: Vec<StageConfig>,

    /// Ordered postprocessor stages (`[[postprocess]]`).
    #[serde(default)]
    pub postprocess: Vec<StageConfig>,

    /// Template parameters handed to the solver entry point, an arbitrarily
    /// nested mapping. Per-design overrides are overlaid onto this via
    /// [`crate::config::merge`].
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

/// Validated configuration.
///
/// Constructed via `TryFrom<RawConfigFile>` (see `validate.rs`); holding a
/// `ConfigFile` means the semantic checks have passed.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub settings: SettingsSection,
    pub folders: FoldersSection,
    pub job: JobSection,
    pub case: Option<CaseSection>,
    pub preprocess: Vec<StageConfig>,
    pub solve: Vec<StageConfig>,
    pub postprocess: Vec<StageConfig>,
    pub parameters: Map<String, Value>,
}

impl ConfigFile {
    /// Construct without re-running validation. Only `validate.rs` should
    /// call this.
    pub fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            settings: raw.settings,
            folders: raw.folders,
            job: raw.job,
            case: raw.case,
            preprocess: raw.preprocess,
            solve: raw.solve,
            postprocess: raw.postprocess,
            parameters: raw.parameters,
        }
    }
}

/// `[settings]` section: which pipeline runs and how it is supervised.
#[derive(Debug, Clone, Deserialize)]
pub struct SettingsSection {
    #[serde(default)]
    pub simulator: SimulatorKind,

    /// `"ubuntu"` (interactive polling) or `"cluster"` (batch/blocking).
    ///
    /// Parsed when a stage executes; unknown values are fatal there.
    #[serde(default = "default_platform")]
    pub platform: String,

    /// Hard wall-clock ceiling for one solver run, in seconds. `None` means
    /// the solver may run indefinitely.
    #[serde(default)]
    pub max_time: Option<f64>,

    /// Delay before the first status-file poll, in seconds. Solvers need
    /// startup time before any status file exists.
    #[serde(default = "default_startup_grace")]
    pub startup_grace: f64,

    /// Poll cadence, in seconds. Polls are aligned to the invocation start,
    /// not to the previous poll.
    #[serde(default = "default_poll_interval")]
    pub poll_interval: f64,

    /// Number of jobs the local sequential queue hands out.
    #[serde(default = "default_jobs")]
    pub jobs: u64,
}

fn default_platform() -> String {
    "ubuntu".to_string()
}

fn default_startup_grace() -> f64 {
    20.0
}

fn default_poll_interval() -> f64 {
    5.0
}

fn default_jobs() -> u64 {
    1
}

impl Default for SettingsSection {
    fn default() -> Self {
        Self {
            simulator: SimulatorKind::default(),
            platform: default_platform(),
            max_time: None,
            startup_grace: default_startup_grace(),
            poll_interval: default_poll_interval(),
            jobs: default_jobs(),
        }
    }
}

/// `[folders]` section: where jobs live and which external entry points the
/// generated driver scripts import.
#[derive(Debug, Clone, Deserialize)]
pub struct FoldersSection {
    /// Root under which job workspaces are resolved.
    #[serde(default = "default_main_work_directory")]
    pub main_work_directory: PathBuf,

    /// Directory appended to the driver script's module search path.
    #[serde(default)]
    pub script_path: Option<PathBuf>,

    /// Module the simulation entry point is imported from.
    #[serde(default)]
    pub sim_module: Option<String>,

    /// Simulation entry symbol; called with the loaded parameter mapping.
    #[serde(default)]
    pub sim_symbol: Option<String>,

    /// Module the post-processing entry point is imported from.
    #[serde(default = "default_post_module")]
    pub post_module: String,

    /// Post-processing entry symbol; called with the job name string.
    #[serde(default = "default_post_symbol")]
    pub post_symbol: String,
}

fn default_main_work_directory() -> PathBuf {
    PathBuf::from("Data")
}

fn default_post_module() -> String {
    "post_process".to_string()
}

fn default_post_symbol() -> String {
    "collect_results".to_string()
}

impl Default for FoldersSection {
    fn default() -> Self {
        Self {
            main_work_directory: default_main_work_directory(),
            script_path: None,
            sim_module: None,
            sim_symbol: None,
            post_module: default_post_module(),
            post_symbol: default_post_symbol(),
        }
    }
}

/// `[job]` section: solver-facing identity and cleanup policy.
#[derive(Debug, Clone, Deserialize)]
pub struct JobSection {
    /// Solver job name; the status file polled in watch mode is
    /// `<name>.msg`.
    #[serde(default = "default_job_name")]
    pub name: String,

    /// Completion sentinel searched for in the status file.
    #[serde(default = "default_sentinel")]
    pub sentinel: String,

    /// Helper process names killed alongside the supervised solver. These
    /// re-parent away from the launched child and cannot be reached through
    /// its handle.
    #[serde(default = "default_kill_processes")]
    pub kill_processes: Vec<String>,

    /// Whether to delete the solver's result database (`.odb`) after
    /// post-processing.
    #[serde(default = "default_delete_result_db")]
    pub delete_result_db: bool,
}

fn default_job_name() -> String {
    "Job-1".to_string()
}

fn default_sentinel() -> String {
    "THE ANALYSIS HAS BEEN COMPLETED".to_string()
}

fn default_kill_processes() -> Vec<String> {
    vec![
        "standard".to_string(),
        "ABQcaeK".to_string(),
        "SMAPython".to_string(),
    ]
}

fn default_delete_result_db() -> bool {
    true
}

impl Default for JobSection {
    fn default() -> Self {
        Self {
            name: default_job_name(),
            sentinel: default_sentinel(),
            kill_processes: default_kill_processes(),
            delete_result_db: default_delete_result_db(),
        }
    }
}

/// `[case]` section (OpenFOAM): template case location and clone target.
#[derive(Debug, Clone, Deserialize)]
pub struct CaseSection {
    /// Template case directory cloned per job.
    pub source: PathBuf,

    /// Case name; defaults to the final component of `source`.
    #[serde(default)]
    pub name: Option<String>,

    /// Directory cloned cases are placed under.
    #[serde(default = "default_case_output")]
    pub output: PathBuf,
}

fn default_case_output() -> PathBuf {
    PathBuf::from("jobs")
}

impl CaseSection {
    /// Effective case name.
    pub fn effective_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self
                .source
                .file_name()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "case".to_string()),
        }
    }
}

/// One `[[preprocess]]` / `[[solve]]` / `[[postprocess]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct StageConfig {
    /// External tool identifier. Must be non-empty; the solve list also
    /// accepts the literal `"auto"` to detect the tool from the case's
    /// controlDict.
    pub tool: String,

    /// CLI options appended after `-case <dir>`, in order.
    #[serde(default)]
    pub options: Vec<String>,
}
