// src/exec/command.rs

//! Executor command codes.

use std::fmt;

use crate::types::TaskCommand;

/// Operation the executor can perform on a server.
///
/// Codes match the control panel's numbering. Only `Start`, `Status`,
/// `Stop`, `Restart`, `Update` and `Delete` do anything; the rest report
/// `NotImplemented`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerCommand {
    Start,
    Pause,
    Unpause,
    Status,
    Stop,
    Kill,
    Restart,
    Update,
    Install,
    Reinstall,
    Delete,
}

impl ServerCommand {
    pub fn code(&self) -> u8 {
        match self {
            ServerCommand::Start => 1,
            ServerCommand::Pause => 2,
            ServerCommand::Unpause => 3,
            ServerCommand::Status => 4,
            ServerCommand::Stop => 5,
            ServerCommand::Kill => 6,
            ServerCommand::Restart => 7,
            ServerCommand::Update => 8,
            ServerCommand::Install => 9,
            ServerCommand::Reinstall => 10,
            ServerCommand::Delete => 11,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        let cmd = match code {
            1 => ServerCommand::Start,
            2 => ServerCommand::Pause,
            3 => ServerCommand::Unpause,
            4 => ServerCommand::Status,
            5 => ServerCommand::Stop,
            6 => ServerCommand::Kill,
            7 => ServerCommand::Restart,
            8 => ServerCommand::Update,
            9 => ServerCommand::Install,
            10 => ServerCommand::Reinstall,
            11 => ServerCommand::Delete,
            _ => return None,
        };
        Some(cmd)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ServerCommand::Start => "start",
            ServerCommand::Pause => "pause",
            ServerCommand::Unpause => "unpause",
            ServerCommand::Status => "status",
            ServerCommand::Stop => "stop",
            ServerCommand::Kill => "kill",
            ServerCommand::Restart => "restart",
            ServerCommand::Update => "update",
            ServerCommand::Install => "install",
            ServerCommand::Reinstall => "reinstall",
            ServerCommand::Delete => "delete",
        }
    }
}

impl From<TaskCommand> for ServerCommand {
    fn from(cmd: TaskCommand) -> Self {
        match cmd {
            TaskCommand::Start => ServerCommand::Start,
            TaskCommand::Stop => ServerCommand::Stop,
            TaskCommand::Restart => ServerCommand::Restart,
            TaskCommand::Update => ServerCommand::Update,
            TaskCommand::Reinstall => ServerCommand::Reinstall,
        }
    }
}

impl fmt::Display for ServerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
