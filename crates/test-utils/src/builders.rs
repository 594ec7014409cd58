#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use gamed::config::{
    ApiSection, ConfigFile, RawConfigFile, RawDaemonSection, ScriptsSection, ServerConfig,
};
use gamed::errors::Result;
use gamed::exec::ExecutorSettings;
use gamed::registry::Server;
use gamed::task::{TaskRecord, TaskStatus};
use gamed::types::{Concurrency, TargetId, TaskCommand, TaskId};

/// Builder for `TaskRecord`. Defaults to a `start` task that is due now.
pub struct TaskBuilder {
    task: TaskRecord,
}

impl TaskBuilder {
    pub fn new(id: TaskId, target_id: TargetId) -> Self {
        Self {
            task: TaskRecord::new(id, target_id, TaskCommand::Start, Utc::now()),
        }
    }

    pub fn command(mut self, command: TaskCommand) -> Self {
        self.task.command = command;
        self
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.task.status = status;
        self
    }

    pub fn execute_date(mut self, date: DateTime<Utc>) -> Self {
        self.task.execute_date = date;
        self
    }

    /// `execute_date` relative to `base`, in seconds (negative = past).
    pub fn due_at(mut self, base: DateTime<Utc>, offset_secs: i64) -> Self {
        self.task.execute_date = base + TimeDelta::seconds(offset_secs);
        self
    }

    pub fn build(self) -> TaskRecord {
        self.task
    }
}

/// Builder for a registry `Server`.
pub struct ServerBuilder {
    server: Server,
}

impl ServerBuilder {
    pub fn new(id: TargetId, dir: &str) -> Self {
        Self {
            server: Server::from_config(
                id,
                &ServerConfig {
                    dir: dir.to_string(),
                    uuid: format!("0000000{id}-test-uuid"),
                    game: "testgame".to_string(),
                    ip: "127.0.0.1".to_string(),
                    port: 27015,
                    query_port: 27016,
                    rcon_port: 27017,
                    ..ServerConfig::default()
                },
            ),
        }
    }

    pub fn start(mut self, cmd: &str) -> Self {
        self.server.start_command = cmd.to_string();
        self
    }

    pub fn stop(mut self, cmd: &str) -> Self {
        self.server.stop_command = cmd.to_string();
        self
    }

    pub fn force_stop(mut self, cmd: &str) -> Self {
        self.server.force_stop_command = cmd.to_string();
        self
    }

    pub fn restart(mut self, cmd: &str) -> Self {
        self.server.restart_command = cmd.to_string();
        self
    }

    pub fn var(mut self, key: &str, value: &str) -> Self {
        self.server.vars.insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> Server {
        self.server
    }
}

/// Builder for a `[server.<id>]` section.
pub struct ServerConfigBuilder {
    server: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn new(dir: &str) -> Self {
        Self {
            server: ServerConfig {
                dir: dir.to_string(),
                ..ServerConfig::default()
            },
        }
    }

    pub fn user(mut self, user: &str) -> Self {
        self.server.user = Some(user.to_string());
        self
    }

    pub fn uuid(mut self, uuid: &str) -> Self {
        self.server.uuid = uuid.to_string();
        self
    }

    pub fn start_command(mut self, cmd: &str) -> Self {
        self.server.start_command = cmd.to_string();
        self
    }

    pub fn stop_command(mut self, cmd: &str) -> Self {
        self.server.stop_command = cmd.to_string();
        self
    }

    pub fn build(self) -> ServerConfig {
        self.server
    }
}

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        let mut config = RawConfigFile {
            daemon: RawDaemonSection::default(),
            api: ApiSection::default(),
            scripts: ScriptsSection::default(),
            server: BTreeMap::new(),
        };
        config.daemon.work_path = "/srv/gamed-test".to_string();
        config.api.host = "http://127.0.0.1:9".to_string();
        Self { config }
    }

    pub fn work_path(mut self, path: &str) -> Self {
        self.config.daemon.work_path = path.to_string();
        self
    }

    pub fn api_host(mut self, host: &str) -> Self {
        self.config.api.host = host.to_string();
        self
    }

    pub fn cache_ttl(mut self, ttl: &str) -> Self {
        self.config.daemon.cache_ttl = ttl.to_string();
        self
    }

    pub fn command_timeout(mut self, timeout: &str) -> Self {
        self.config.daemon.command_timeout = timeout.to_string();
        self
    }

    pub fn concurrency(mut self, concurrency: Concurrency) -> Self {
        self.config.daemon.concurrency = concurrency;
        self
    }

    pub fn scripts(mut self, scripts: ScriptsSection) -> Self {
        self.config.scripts = scripts;
        self
    }

    pub fn server(mut self, id: &str, server: ServerConfig) -> Self {
        self.config.server.insert(id.to_string(), server);
        self
    }

    pub fn try_build(self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.config)
    }

    pub fn build(self) -> ConfigFile {
        self.try_build()
            .expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Executor settings rooted at `work_path`, with a short stop grace and
/// fast status polling.
pub fn executor_settings(work_path: &Path, scripts: ScriptsSection) -> Arc<ExecutorSettings> {
    Arc::new(ExecutorSettings {
        work_path: work_path.to_path_buf(),
        scripts,
        stop_grace: Duration::from_millis(500),
        status_poll_interval: Duration::from_millis(50),
    })
}
