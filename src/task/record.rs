// src/task/record.rs

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{TargetId, TaskCommand, TaskId};

/// Task status. The declaration order is the scheduling priority:
/// `Waiting < Working < Done < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Waiting,
    Working,
    Done,
    Error,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Done | TaskStatus::Error)
    }

    /// Numeric code used by the control plane API.
    pub fn code(&self) -> u8 {
        match self {
            TaskStatus::Waiting => 0,
            TaskStatus::Working => 1,
            TaskStatus::Done => 2,
            TaskStatus::Error => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(TaskStatus::Waiting),
            1 => Some(TaskStatus::Working),
            2 => Some(TaskStatus::Done),
            3 => Some(TaskStatus::Error),
            _ => None,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Waiting => "waiting",
            TaskStatus::Working => "working",
            TaskStatus::Done => "done",
            TaskStatus::Error => "error",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("task {task_id}: status cannot move from {from} to {to}")]
pub struct StatusTransitionError {
    pub task_id: TaskId,
    pub from: TaskStatus,
    pub to: TaskStatus,
}

/// One requested lifecycle operation against a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub id: TaskId,
    pub target_id: TargetId,
    pub command: TaskCommand,
    pub status: TaskStatus,
    /// Earliest moment the task may run.
    pub execute_date: DateTime<Utc>,
    /// Captured result text, set once the task reaches a terminal status.
    pub output: Option<String>,
}

impl TaskRecord {
    /// A fresh `waiting` task.
    pub fn new(
        id: TaskId,
        target_id: TargetId,
        command: TaskCommand,
        execute_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            target_id,
            command,
            status: TaskStatus::Waiting,
            execute_date,
            output: None,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.execute_date <= now
    }

    /// Move the status forward.
    ///
    /// Terminal statuses are final and no status may regress. Staying in the
    /// same non-terminal status is allowed (a task the control plane still
    /// reports as `working` is dispatched again after a daemon restart).
    pub fn advance(&mut self, to: TaskStatus) -> Result<(), StatusTransitionError> {
        if self.status.is_terminal() || to < self.status {
            return Err(StatusTransitionError {
                task_id: self.id,
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}
