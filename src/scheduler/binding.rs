// src/scheduler/binding.rs

use chrono::{DateTime, TimeDelta, Utc};

use crate::task::TaskRecord;

/// A task in `working` state and the process currently executing it.
///
/// `pid` is filled in once the executor reports a spawn; multi-step verbs
/// (restart) report each process in turn, so it always names the live one.
#[derive(Debug, Clone)]
pub struct ExecutionBinding {
    pub task: TaskRecord,
    pub started_at: DateTime<Utc>,
    pub pid: Option<u32>,
}

impl ExecutionBinding {
    pub fn new(task: TaskRecord, started_at: DateTime<Utc>) -> Self {
        Self {
            task,
            started_at,
            pid: None,
        }
    }

    pub fn is_overdue(&self, now: DateTime<Utc>, timeout: TimeDelta) -> bool {
        now.signed_duration_since(self.started_at) >= timeout
    }
}
