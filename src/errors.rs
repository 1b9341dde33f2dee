// src/errors.rs

//! Crate-wide error types and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimherdError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Missing index: {0}")]
    MissingIndex(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("platform not implemented: {0}")]
    PlatformNotImplemented(String),

    #[error("external tool '{tool}' failed; see log file {log:?}")]
    ToolFailure { tool: String, log: PathBuf },

    #[error("result artifact not found: {0:?}")]
    ResultUnavailable(PathBuf),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SimherdError>;
