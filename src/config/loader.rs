// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw
/// `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (stage lists, required folders, etc.). Use
/// [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run semantic validation.
///
/// This is the recommended entry point for the rest of the application:
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks for:
///   - empty stage tool identifiers,
///   - `"auto"` outside the solve list,
///   - missing Abaqus driver-script fields,
///   - basic supervision-cadence sanity.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Helper to resolve a default config path.
///
/// Currently this just returns `Simherd.toml` in the current working
/// directory, but this function exists so you can later:
///
/// - Respect an env var (e.g. `SIMHERD_CONFIG`).
/// - Look for multiple default locations.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Simherd.toml")
}
