// src/config/model.rs

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Deserialize;

use crate::types::{Concurrency, TargetId};

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [daemon]
/// work_path = "/srv/gameap"
/// cache_ttl = "300s"
///
/// [api]
/// host = "https://panel.example.com"
///
/// [scripts]
/// start = "{command}"
///
/// [server.7]
/// dir = "servers/cs"
/// start_command = "./start.sh"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub daemon: RawDaemonSection,

    #[serde(default)]
    pub api: ApiSection,

    #[serde(default)]
    pub scripts: ScriptsSection,

    /// Managed servers from `[server.<id>]`.
    ///
    /// Keys are the target ids as strings; they are parsed during validation.
    #[serde(default)]
    pub server: BTreeMap<String, ServerConfig>,
}

/// `[daemon]` section with durations still in their `"<n><unit>"` form.
#[derive(Debug, Clone, Deserialize)]
pub struct RawDaemonSection {
    #[serde(default)]
    pub work_path: String,

    #[serde(default = "default_tick_interval")]
    pub tick_interval: String,

    /// How long a target's pulled task list is considered fresh.
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl: String,

    /// Upper bound on a single task's execution.
    #[serde(default = "default_command_timeout")]
    pub command_timeout: String,

    /// How long `stop` waits for the target to report stopped.
    #[serde(default = "default_stop_grace")]
    pub stop_grace: String,

    #[serde(default)]
    pub concurrency: Concurrency,
}

fn default_tick_interval() -> String {
    "5s".to_string()
}

fn default_cache_ttl() -> String {
    "300s".to_string()
}

fn default_command_timeout() -> String {
    "10m".to_string()
}

fn default_stop_grace() -> String {
    "10s".to_string()
}

impl Default for RawDaemonSection {
    fn default() -> Self {
        Self {
            work_path: String::new(),
            tick_interval: default_tick_interval(),
            cache_ttl: default_cache_ttl(),
            command_timeout: default_command_timeout(),
            stop_grace: default_stop_grace(),
            concurrency: Concurrency::default(),
        }
    }
}

/// `[api]` section: where the control plane lives.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiSection {
    #[serde(default)]
    pub host: String,

    /// Optional bearer token sent with every request.
    #[serde(default)]
    pub key: Option<String>,
}

/// `[scripts]` section: command templates per verb.
///
/// `{command}` is replaced with the server's own command for the verb
/// (e.g. `start_command`), then shortcodes like `{dir}` are substituted.
/// An empty template means "not configured".
#[derive(Debug, Clone, Deserialize)]
pub struct ScriptsSection {
    #[serde(default = "default_passthrough")]
    pub start: String,
    #[serde(default = "default_passthrough")]
    pub stop: String,
    #[serde(default)]
    pub restart: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub update: String,
    #[serde(default)]
    pub delete: String,
}

fn default_passthrough() -> String {
    "{command}".to_string()
}

impl Default for ScriptsSection {
    fn default() -> Self {
        Self {
            start: default_passthrough(),
            stop: default_passthrough(),
            restart: String::new(),
            status: String::new(),
            update: String::new(),
            delete: String::new(),
        }
    }
}

/// `[server.<id>]` section: one managed game server.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerConfig {
    /// Install directory, relative to `daemon.work_path`.
    pub dir: String,

    /// Unprivileged account the server's commands run as.
    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub uuid: String,
    #[serde(default)]
    pub uuid_short: Option<String>,
    #[serde(default)]
    pub game: String,

    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub port: u16,
    #[serde(default)]
    pub query_port: u16,
    #[serde(default)]
    pub rcon_port: u16,
    #[serde(default)]
    pub rcon_password: String,

    #[serde(default)]
    pub start_command: String,
    #[serde(default)]
    pub stop_command: String,
    #[serde(default)]
    pub force_stop_command: String,
    #[serde(default)]
    pub restart_command: String,

    /// Extra `{name}` shortcodes.
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
}

/// Typed `[daemon]` settings.
#[derive(Debug, Clone)]
pub struct DaemonSettings {
    pub work_path: String,
    pub tick_interval: Duration,
    pub cache_ttl: Duration,
    pub command_timeout: Duration,
    pub stop_grace: Duration,
    pub concurrency: Concurrency,
}

/// Validated configuration. Build one with `ConfigFile::try_from(raw)`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub daemon: DaemonSettings,
    pub api: ApiSection,
    pub scripts: ScriptsSection,
    pub servers: BTreeMap<TargetId, ServerConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        daemon: DaemonSettings,
        api: ApiSection,
        scripts: ScriptsSection,
        servers: BTreeMap<TargetId, ServerConfig>,
    ) -> Self {
        Self {
            daemon,
            api,
            scripts,
            servers,
        }
    }
}
