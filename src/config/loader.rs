// src/config/loader.rs

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{GamedError, Result};

/// Read the daemon config without validating it.
///
/// A missing file is a [`GamedError::ConfigError`] naming the path; other
/// read failures stay IO errors.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => {
            GamedError::ConfigError(format!("config file {} not found", path.display()))
        }
        _ => GamedError::IoError(e),
    })?;

    let raw: RawConfigFile = toml::from_str(&contents)?;
    debug!(path = %path.display(), servers = raw.server.len(), "config file read");
    Ok(raw)
}

/// Read and validate the daemon config: durations parsed, server ids
/// checked, `work_path` and `api.host` required.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    ConfigFile::try_from(load_from_path(path)?)
}

/// Validate config text that is already in memory.
pub fn parse_config(contents: &str) -> Result<ConfigFile> {
    let raw: RawConfigFile = toml::from_str(contents)?;
    ConfigFile::try_from(raw)
}
