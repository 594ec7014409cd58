// src/scheduler/core.rs

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info, warn};

use crate::config::DaemonSettings;
use crate::scheduler::binding::ExecutionBinding;
use crate::scheduler::queue::TaskQueue;
use crate::scheduler::sync_cache::SyncCache;
use crate::task::{ExecOutcome, FailureKind, TaskRecord, TaskStatus};
use crate::types::{Concurrency, TargetId, TargetScope, TaskId};

/// Tunables of the scheduler.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerOptions {
    pub cache_ttl: Duration,
    pub command_timeout: Duration,
    pub concurrency: Concurrency,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(300),
            command_timeout: Duration::from_secs(600),
            concurrency: Concurrency::Single,
        }
    }
}

impl SchedulerOptions {
    pub fn from_settings(settings: &DaemonSettings) -> Self {
        Self {
            cache_ttl: settings.cache_ttl,
            command_timeout: settings.command_timeout,
            concurrency: settings.concurrency,
        }
    }
}

/// Result of [`Scheduler::enqueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    Added,
    /// The id is already queued, running or awaiting acknowledgement.
    Duplicate,
    /// The task already carries a terminal status; there is nothing to run.
    Terminal,
}

/// Owns every task the daemon knows about, from enqueue until the control
/// plane acknowledges its terminal status.
///
/// A task id lives in exactly one of three places at a time:
/// - the queue (`waiting`, or `working` as reported by the control plane),
/// - the binding map (dispatched to the executor),
/// - the finished map (terminal, result not yet pushed).
///
/// `known` is the dedup set spanning all three.
#[derive(Debug)]
pub struct Scheduler {
    queue: TaskQueue,
    known: HashSet<TaskId>,
    bindings: HashMap<TaskId, ExecutionBinding>,
    finished: BTreeMap<TaskId, TaskRecord>,
    sync: SyncCache,
    targets: BTreeSet<TargetId>,
    options: SchedulerOptions,
}

impl Scheduler {
    /// Create a scheduler that syncs the given targets.
    ///
    /// With no targets, reconciliation falls back to a single `All` scope.
    pub fn new(options: SchedulerOptions, targets: impl IntoIterator<Item = TargetId>) -> Self {
        Self {
            queue: TaskQueue::new(),
            known: HashSet::new(),
            bindings: HashMap::new(),
            finished: BTreeMap::new(),
            sync: SyncCache::new(options.cache_ttl),
            targets: targets.into_iter().collect(),
            options,
        }
    }

    pub fn options(&self) -> &SchedulerOptions {
        &self.options
    }

    /// `true` iff no task is queued. Running and finished tasks don't count.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of queued tasks.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Nothing queued, nothing running, nothing left to report.
    pub fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.bindings.is_empty() && self.finished.is_empty()
    }

    /// Whether the id is anywhere in local state.
    pub fn contains(&self, id: TaskId) -> bool {
        self.known.contains(&id)
    }

    pub fn queued(&self) -> impl Iterator<Item = &TaskRecord> {
        self.queue.iter()
    }

    pub fn binding(&self, id: TaskId) -> Option<&ExecutionBinding> {
        self.bindings.get(&id)
    }

    pub fn bindings(&self) -> impl Iterator<Item = &ExecutionBinding> {
        self.bindings.values()
    }

    pub fn is_target_working(&self, target: TargetId) -> bool {
        self.bindings.values().any(|b| b.task.target_id == target)
    }

    pub fn finished(&self, id: TaskId) -> Option<&TaskRecord> {
        self.finished.get(&id)
    }

    /// Terminal tasks whose result hasn't been acknowledged yet.
    pub fn pending_results(&self) -> Vec<TaskRecord> {
        self.finished.values().cloned().collect()
    }

    /// Whether `target` has its own sync scope.
    pub fn is_tracked(&self, target: TargetId) -> bool {
        self.targets.contains(&target)
    }

    /// Add a task unless its id is already known.
    pub fn enqueue(&mut self, task: TaskRecord) -> EnqueueOutcome {
        if self.known.contains(&task.id) {
            debug!(task_id = task.id, "task already known; enqueue is a no-op");
            return EnqueueOutcome::Duplicate;
        }

        if task.status.is_terminal() {
            debug!(
                task_id = task.id,
                status = %task.status,
                "task already terminal; not enqueued"
            );
            return EnqueueOutcome::Terminal;
        }

        info!(
            task_id = task.id,
            target_id = task.target_id,
            command = %task.command,
            execute_date = %task.execute_date,
            "task enqueued"
        );

        self.known.insert(task.id);
        self.queue.push(task);
        EnqueueOutcome::Added
    }

    /// Take the next runnable task, mark it `working` and bind it.
    ///
    /// Returns `None` without touching any state when the queue is empty,
    /// when concurrency rules forbid another working task, or when the
    /// candidate's `execute_date` is still in the future.
    pub fn run_next(&mut self, now: DateTime<Utc>) -> Option<TaskRecord> {
        let candidate = match self.options.concurrency {
            Concurrency::Single => {
                if !self.bindings.is_empty() {
                    return None;
                }
                self.queue.peek()?
            }
            Concurrency::PerTarget => self
                .queue
                .iter()
                .find(|t| !self.is_target_working(t.target_id))?,
        };

        if !candidate.is_due(now) {
            return None;
        }

        let id = candidate.id;
        let mut task = self.queue.remove(id)?;

        if let Err(e) = task.advance(TaskStatus::Working) {
            // Terminal tasks never enter the queue.
            warn!(task_id = id, error = %e, "queued task could not start");
            self.known.remove(&id);
            return None;
        }

        info!(
            task_id = id,
            target_id = task.target_id,
            command = %task.command,
            "dispatching task"
        );

        self.bindings
            .insert(id, ExecutionBinding::new(task.clone(), now));
        Some(task)
    }

    /// Remember the process currently executing a task.
    pub fn record_spawn(&mut self, id: TaskId, pid: u32) {
        match self.bindings.get_mut(&id) {
            Some(binding) => {
                debug!(task_id = id, pid, "bound process to task");
                binding.pid = Some(pid);
            }
            None => debug!(task_id = id, pid, "spawn reported for unbound task; ignoring"),
        }
    }

    /// Apply an executor outcome to a working task.
    ///
    /// Returns the terminal record, or `None` when the task is no longer
    /// bound (it already timed out).
    pub fn complete(&mut self, id: TaskId, outcome: &ExecOutcome) -> Option<&TaskRecord> {
        let Some(binding) = self.bindings.remove(&id) else {
            warn!(task_id = id, "completion for a task without binding; ignoring");
            return None;
        };

        let mut task = binding.task;
        self.finish(&mut task, outcome);
        self.finished.insert(id, task);
        self.finished.get(&id)
    }

    /// Cancel a task.
    ///
    /// A queued task is failed on the spot. For a running task this only
    /// reports `true`; the caller signals the process and the executor's
    /// resulting outcome completes the task as usual.
    pub fn request_cancel(&mut self, id: TaskId) -> bool {
        if self.bindings.contains_key(&id) {
            info!(task_id = id, "cancellation requested for running task");
            return true;
        }

        if let Some(mut task) = self.queue.remove(id) {
            info!(task_id = id, "cancelled queued task before it started");
            let outcome = ExecOutcome::failed(
                FailureKind::CommandFailed,
                "cancelled before start",
                None,
                String::new(),
            );
            self.finish(&mut task, &outcome);
            self.finished.insert(id, task);
        }

        false
    }

    /// Fail every working task that outlived `command_timeout`.
    ///
    /// Their bindings are cleared so the targets are schedulable again; the
    /// returned ids should be cancelled at the executor.
    pub fn expire_overdue(&mut self, now: DateTime<Utc>) -> Vec<TaskId> {
        let timeout = TimeDelta::from_std(self.options.command_timeout).unwrap_or(TimeDelta::MAX);

        let overdue: Vec<TaskId> = self
            .bindings
            .values()
            .filter(|b| b.is_overdue(now, timeout))
            .map(|b| b.task.id)
            .collect();

        for id in &overdue {
            if let Some(binding) = self.bindings.remove(id) {
                warn!(
                    task_id = id,
                    target_id = binding.task.target_id,
                    pid = binding.pid,
                    "task exceeded command timeout"
                );
                let outcome = ExecOutcome::failed(
                    FailureKind::ExecutionTimeout,
                    format!(
                        "command did not finish within {}s",
                        self.options.command_timeout.as_secs()
                    ),
                    None,
                    String::new(),
                );
                let mut task = binding.task;
                self.finish(&mut task, &outcome);
                self.finished.insert(*id, task);
            }
        }

        overdue
    }

    /// Scopes whose cached pull has expired.
    pub fn due_scopes(&self, now: DateTime<Utc>) -> Vec<TargetScope> {
        if self.targets.is_empty() {
            return if self.sync.is_due(TargetScope::All, now) {
                vec![TargetScope::All]
            } else {
                Vec::new()
            };
        }

        self.targets
            .iter()
            .map(|id| TargetScope::Target(*id))
            .filter(|scope| self.sync.is_due(*scope, now))
            .collect()
    }

    pub fn mark_synced(&mut self, scope: TargetScope, now: DateTime<Utc>) {
        self.sync.mark(scope, now);
    }

    pub fn last_sync(&self, scope: TargetScope) -> Option<DateTime<Utc>> {
        self.sync.last_sync(scope)
    }

    /// Forget a terminal task once the control plane has its result.
    pub fn acknowledge(&mut self, id: TaskId) -> bool {
        if self.finished.remove(&id).is_some() {
            self.known.remove(&id);
            debug!(task_id = id, "result acknowledged; task forgotten");
            true
        } else {
            false
        }
    }

    fn finish(&self, task: &mut TaskRecord, outcome: &ExecOutcome) {
        let status = outcome.status();
        if let Err(e) = task.advance(status) {
            warn!(error = %e, "ignoring invalid status transition");
        }
        task.output = Some(outcome.report());

        match outcome.failure_kind() {
            None => info!(task_id = task.id, target_id = task.target_id, "task done"),
            Some(kind) => warn!(
                task_id = task.id,
                target_id = task.target_id,
                %kind,
                exit_code = outcome.exit_code,
                "task failed"
            ),
        }
    }
}
