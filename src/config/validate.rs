// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile, StageConfig};
use crate::errors::{Result, SimherdError};
use crate::pipeline::stage::AUTO_TOOL;
use crate::types::SimulatorKind;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::SimherdError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_supervision_settings(cfg)?;
    match cfg.settings.simulator {
        SimulatorKind::Abaqus => validate_abaqus(cfg)?,
        SimulatorKind::Openfoam => validate_openfoam(cfg)?,
    }
    Ok(())
}

fn validate_supervision_settings(cfg: &RawConfigFile) -> Result<()> {
    if cfg.settings.poll_interval <= 0.0 {
        return Err(SimherdError::ConfigError(format!(
            "[settings].poll_interval must be > 0 (got {})",
            cfg.settings.poll_interval
        )));
    }

    if cfg.settings.startup_grace < 0.0 {
        return Err(SimherdError::ConfigError(format!(
            "[settings].startup_grace must be >= 0 (got {})",
            cfg.settings.startup_grace
        )));
    }

    if let Some(max_time) = cfg.settings.max_time {
        if max_time <= 0.0 {
            return Err(SimherdError::ConfigError(format!(
                "[settings].max_time must be > 0 when set (got {max_time})"
            )));
        }
    }

    if cfg.settings.jobs == 0 {
        return Err(SimherdError::ConfigError(
            "[settings].jobs must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_abaqus(cfg: &RawConfigFile) -> Result<()> {
    let folders = &cfg.folders;

    if folders.script_path.as_ref().is_none_or(|p| p.as_os_str().is_empty()) {
        return Err(SimherdError::ConfigError(
            "[folders].script_path is required for the abaqus simulator".to_string(),
        ));
    }

    for (field, value) in [
        ("sim_module", &folders.sim_module),
        ("sim_symbol", &folders.sim_symbol),
    ] {
        if value.as_ref().is_none_or(|s| s.trim().is_empty()) {
            return Err(SimherdError::ConfigError(format!(
                "[folders].{field} is required for the abaqus simulator"
            )));
        }
    }

    if cfg.job.name.trim().is_empty() {
        return Err(SimherdError::ConfigError(
            "[job].name must not be empty".to_string(),
        ));
    }

    if cfg.job.sentinel.is_empty() {
        return Err(SimherdError::ConfigError(
            "[job].sentinel must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_openfoam(cfg: &RawConfigFile) -> Result<()> {
    let case = cfg.case.as_ref().ok_or_else(|| {
        SimherdError::ConfigError(
            "[case] section is required for the openfoam simulator".to_string(),
        )
    })?;

    if case.source.as_os_str().is_empty() {
        return Err(SimherdError::ConfigError(
            "[case].source must not be empty".to_string(),
        ));
    }

    if cfg.solve.is_empty() {
        return Err(SimherdError::ConfigError(
            "at least one [[solve]] stage is required for the openfoam simulator".to_string(),
        ));
    }

    validate_stage_list("preprocess", &cfg.preprocess, false)?;
    validate_stage_list("solve", &cfg.solve, true)?;
    validate_stage_list("postprocess", &cfg.postprocess, false)?;

    Ok(())
}

fn validate_stage_list(list: &str, stages: &[StageConfig], allow_auto: bool) -> Result<()> {
    for (idx, stage) in stages.iter().enumerate() {
        if stage.tool.trim().is_empty() {
            return Err(SimherdError::ConfigError(format!(
                "[[{list}]] stage {idx} has an empty tool identifier"
            )));
        }
        if !allow_auto && stage.tool == AUTO_TOOL {
            return Err(SimherdError::ConfigError(format!(
                "[[{list}]] stage {idx}: \"{AUTO_TOOL}\" is only valid in the solve list"
            )));
        }
    }
    Ok(())
}
