use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of a task issued by the control plane.
pub type TaskId = u64;

/// Identifier of a managed game server.
pub type TargetId = u64;

/// Lifecycle verb carried by a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskCommand {
    Start,
    Stop,
    Restart,
    Update,
    Reinstall,
}

impl TaskCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskCommand::Start => "start",
            TaskCommand::Stop => "stop",
            TaskCommand::Restart => "restart",
            TaskCommand::Update => "update",
            TaskCommand::Reinstall => "reinstall",
        }
    }
}

impl fmt::Display for TaskCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskCommand {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "start" => Ok(TaskCommand::Start),
            "stop" => Ok(TaskCommand::Stop),
            "restart" => Ok(TaskCommand::Restart),
            "update" => Ok(TaskCommand::Update),
            "reinstall" => Ok(TaskCommand::Reinstall),
            other => Err(format!(
                "invalid task command: {other} (expected start, stop, restart, update or reinstall)"
            )),
        }
    }
}

/// How many tasks may be in `working` state at once.
///
/// - `Single`: one task at a time across all targets (default).
/// - `PerTarget`: one task per target; different targets run concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Concurrency {
    Single,
    PerTarget,
}

impl Default for Concurrency {
    fn default() -> Self {
        Concurrency::Single
    }
}

/// What a control-plane pull covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TargetScope {
    /// Every task the control plane has for this node.
    All,
    /// Tasks of a single target.
    Target(TargetId),
}

impl TargetScope {
    /// Whether a task of `target` falls under this scope.
    pub fn covers(self, target: TargetId) -> bool {
        match self {
            TargetScope::All => true,
            TargetScope::Target(id) => id == target,
        }
    }
}

impl fmt::Display for TargetScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetScope::All => f.write_str("all"),
            TargetScope::Target(id) => write!(f, "target {id}"),
        }
    }
}
