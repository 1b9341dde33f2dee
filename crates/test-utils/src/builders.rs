#![allow(dead_code)]

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use simherd::config::{
    CaseSection, ConfigFile, FoldersSection, JobSection, RawConfigFile, SettingsSection,
    StageConfig,
};
use simherd::types::SimulatorKind;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    raw: RawConfigFile,
}

impl ConfigFileBuilder {
    /// Minimal valid Abaqus config rooted at the given directories.
    pub fn abaqus(work_root: &Path, script_path: &Path) -> Self {
        let mut raw = Self::empty_raw();
        raw.settings.simulator = SimulatorKind::Abaqus;
        raw.folders.main_work_directory = work_root.to_path_buf();
        raw.folders.script_path = Some(script_path.to_path_buf());
        raw.folders.sim_module = Some("benchmarks.von_mises".to_string());
        raw.folders.sim_symbol = Some("run_simulation".to_string());
        Self { raw }
    }

    /// Minimal valid OpenFOAM config with a single `icoFoam` solve stage.
    pub fn openfoam(case_source: &Path, output: &Path) -> Self {
        let mut raw = Self::empty_raw();
        raw.settings.simulator = SimulatorKind::Openfoam;
        raw.case = Some(CaseSection {
            source: case_source.to_path_buf(),
            name: None,
            output: output.to_path_buf(),
        });
        raw.solve = vec![StageConfig {
            tool: "icoFoam".to_string(),
            options: vec![],
        }];
        Self { raw }
    }

    fn empty_raw() -> RawConfigFile {
        // Tests never want a stray pkill; names must be opted back in via
        // `with_kill_processes`.
        let mut job = JobSection::default();
        job.kill_processes.clear();

        RawConfigFile {
            settings: SettingsSection::default(),
            folders: FoldersSection::default(),
            job,
            case: None,
            preprocess: Vec::new(),
            solve: Vec::new(),
            postprocess: Vec::new(),
            parameters: Map::new(),
        }
    }

    pub fn with_platform(mut self, platform: &str) -> Self {
        self.raw.settings.platform = platform.to_string();
        self
    }

    pub fn with_supervision(mut self, grace: f64, interval: f64, max_time: Option<f64>) -> Self {
        self.raw.settings.startup_grace = grace;
        self.raw.settings.poll_interval = interval;
        self.raw.settings.max_time = max_time;
        self
    }

    /// Helper kill list is emptied by default in tests so nothing pkills a
    /// real process by accident; this puts names back.
    pub fn with_kill_processes(mut self, names: &[&str]) -> Self {
        self.raw.job.kill_processes = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_job_name(mut self, name: &str) -> Self {
        self.raw.job.name = name.to_string();
        self
    }

    pub fn with_parameter(mut self, key: &str, value: Value) -> Self {
        self.raw.parameters.insert(key.to_string(), value);
        self
    }

    pub fn with_preprocess(mut self, tool: &str, options: &[&str]) -> Self {
        self.raw.preprocess.push(stage(tool, options));
        self
    }

    pub fn with_solve(mut self, tool: &str, options: &[&str]) -> Self {
        self.raw.solve.push(stage(tool, options));
        self
    }

    pub fn with_solve_only(mut self, tool: &str, options: &[&str]) -> Self {
        self.raw.solve = vec![stage(tool, options)];
        self
    }

    pub fn with_postprocess(mut self, tool: &str, options: &[&str]) -> Self {
        self.raw.postprocess.push(stage(tool, options));
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.raw).expect("Failed to build valid config from builder")
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.raw
    }
}

fn stage(tool: &str, options: &[&str]) -> StageConfig {
    StageConfig {
        tool: tool.to_string(),
        options: options.iter().map(|s| s.to_string()).collect(),
    }
}

/// Write a minimal OpenFOAM case skeleton (system/controlDict with the given
/// application) under `dir`.
pub fn write_case_fixture(dir: &Path, application: &str) {
    let system = dir.join("system");
    fs::create_dir_all(&system).expect("creating case system dir");
    fs::write(
        system.join("controlDict"),
        format!(
            "FoamFile\n{{\n    version     2.0;\n    format      ascii;\n    object      controlDict;\n}}\n\napplication     {application};\n\nstartTime       0;\nendTime         0.5;\n"
        ),
    )
    .expect("writing controlDict fixture");
}
