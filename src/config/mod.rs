// src/config/mod.rs

//! Declarative job configuration: TOML model, loader, semantic validation,
//! and parameter-overlay merging.

pub mod loader;
pub mod merge;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use merge::merge;
pub use model::{
    CaseSection, ConfigFile, FoldersSection, JobSection, RawConfigFile, SettingsSection,
    StageConfig,
};
