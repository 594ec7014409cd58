// src/task/ordering.rs

//! Execution priority between tasks.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::task::record::{TaskRecord, TaskStatus};
use crate::types::TaskId;

/// Decide which of two tasks runs first. `Less` means `a` goes before `b`.
///
/// Lower status first (`waiting` ahead of `working`), then the earlier
/// `execute_date`. Tasks equal on both compare `Equal`.
pub fn compare(a: &TaskRecord, b: &TaskRecord) -> Ordering {
    by_priority(
        (a.status, a.execute_date),
        (b.status, b.execute_date),
    )
}

fn by_priority(a: (TaskStatus, DateTime<Utc>), b: (TaskStatus, DateTime<Utc>)) -> Ordering {
    a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1))
}

/// Sort key of a queued task.
///
/// Follows [`compare`] and breaks remaining ties by id, which makes it a
/// total order usable as a `BTreeMap` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueKey {
    pub status: TaskStatus,
    pub execute_date: DateTime<Utc>,
    pub id: TaskId,
}

impl QueueKey {
    pub fn of(task: &TaskRecord) -> Self {
        Self {
            status: task.status,
            execute_date: task.execute_date,
            id: task.id,
        }
    }
}

impl Ord for QueueKey {
    fn cmp(&self, other: &Self) -> Ordering {
        by_priority(
            (self.status, self.execute_date),
            (other.status, other.execute_date),
        )
        .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for QueueKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
