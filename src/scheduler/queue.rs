// src/scheduler/queue.rs

use std::collections::{BTreeMap, HashMap};

use crate::task::{QueueKey, TaskRecord};
use crate::types::TaskId;

/// Priority queue of tasks, highest priority first (see [`crate::task::compare`]).
///
/// Backed by a `BTreeMap` so the scheduler can both take the head and walk
/// the queue in order, plus an id index so each id is held at most once.
#[derive(Debug, Default)]
pub struct TaskQueue {
    entries: BTreeMap<QueueKey, TaskRecord>,
    index: HashMap<TaskId, QueueKey>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.index.contains_key(&id)
    }

    /// Insert a task. Returns `false` (and keeps the existing copy) when a
    /// task with the same id is already queued.
    pub fn push(&mut self, task: TaskRecord) -> bool {
        if self.index.contains_key(&task.id) {
            return false;
        }
        let key = QueueKey::of(&task);
        self.index.insert(task.id, key);
        self.entries.insert(key, task);
        true
    }

    /// Highest-priority task, without removing it.
    pub fn peek(&self) -> Option<&TaskRecord> {
        self.entries.values().next()
    }

    pub fn remove(&mut self, id: TaskId) -> Option<TaskRecord> {
        let key = self.index.remove(&id)?;
        self.entries.remove(&key)
    }

    /// Tasks in execution order.
    pub fn iter(&self) -> impl Iterator<Item = &TaskRecord> {
        self.entries.values()
    }
}
