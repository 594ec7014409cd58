// src/config/mod.rs

//! Configuration loading and validation for gamed.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate and convert raw values into typed settings (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, parse_config};
pub use model::{
    ApiSection, ConfigFile, DaemonSettings, RawConfigFile, RawDaemonSection, ScriptsSection,
    ServerConfig,
};
pub use validate::parse_duration;
