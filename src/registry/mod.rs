// src/registry/mod.rs

//! Resolution of target ids to managed game servers.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::config::{ConfigFile, ServerConfig};
use crate::types::TargetId;

/// A managed game server as the executor sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Server {
    pub id: TargetId,
    /// Install directory, relative to the daemon's work path.
    pub dir: String,
    pub user: Option<String>,
    pub uuid: String,
    pub uuid_short: String,
    pub game: String,
    pub ip: String,
    pub port: u16,
    pub query_port: u16,
    pub rcon_port: u16,
    pub rcon_password: String,
    pub start_command: String,
    pub stop_command: String,
    pub force_stop_command: String,
    pub restart_command: String,
    pub vars: BTreeMap<String, String>,
}

impl Server {
    pub fn from_config(id: TargetId, cfg: &ServerConfig) -> Self {
        let uuid_short = cfg
            .uuid_short
            .clone()
            .unwrap_or_else(|| cfg.uuid.chars().take(8).collect());

        Self {
            id,
            dir: cfg.dir.clone(),
            user: cfg.user.clone().filter(|u| !u.trim().is_empty()),
            uuid: cfg.uuid.clone(),
            uuid_short,
            game: cfg.game.clone(),
            ip: cfg.ip.clone(),
            port: cfg.port,
            query_port: cfg.query_port,
            rcon_port: cfg.rcon_port,
            rcon_password: cfg.rcon_password.clone(),
            start_command: cfg.start_command.clone(),
            stop_command: cfg.stop_command.clone(),
            force_stop_command: cfg.force_stop_command.clone(),
            restart_command: cfg.restart_command.clone(),
            vars: cfg.vars.clone(),
        }
    }
}

/// Looks up servers by id.
pub trait ProcessRegistry: Send + Sync {
    fn resolve(&self, id: TargetId) -> Option<Arc<Server>>;

    /// Every id this registry knows, in ascending order.
    fn ids(&self) -> Vec<TargetId>;
}

/// Registry built once from the `[server.<id>]` sections of the config.
#[derive(Debug, Default)]
pub struct StaticRegistry {
    servers: HashMap<TargetId, Arc<Server>>,
}

impl StaticRegistry {
    pub fn new(servers: impl IntoIterator<Item = Server>) -> Self {
        Self {
            servers: servers
                .into_iter()
                .map(|s| (s.id, Arc::new(s)))
                .collect(),
        }
    }

    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self::new(
            cfg.servers
                .iter()
                .map(|(id, sc)| Server::from_config(*id, sc)),
        )
    }
}

impl ProcessRegistry for StaticRegistry {
    fn resolve(&self, id: TargetId) -> Option<Arc<Server>> {
        self.servers.get(&id).cloned()
    }

    fn ids(&self) -> Vec<TargetId> {
        let mut ids: Vec<TargetId> = self.servers.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
