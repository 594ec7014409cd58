// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::engine::RuntimeOptions;
use crate::scheduler::{EnqueueOutcome, Scheduler};
use crate::task::{ExecOutcome, TaskRecord};
use crate::types::TaskId;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Send these `working` tasks to the executor.
    DispatchTasks(Vec<TaskRecord>),
    /// Terminate the processes of these tasks.
    CancelTasks(Vec<TaskId>),
    /// Push every pending terminal result to the control plane now.
    PushResults,
    /// Request that the process exits (used for `--once` when idle).
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    pub(crate) fn idle() -> Self {
        Self {
            commands: Vec::new(),
            keep_running: true,
        }
    }

    fn with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

/// Periodic tick. Reconciliation has already run in the shell.
///
/// - Overdue tasks are failed and their processes cancelled.
/// - Every runnable task is dispatched.
/// - In `exit_when_idle` mode, an idle scheduler ends the runtime.
pub fn handle_tick(
    scheduler: &mut Scheduler,
    options: &RuntimeOptions,
    now: DateTime<Utc>,
) -> CoreStep {
    let mut commands = Vec::new();

    let expired = scheduler.expire_overdue(now);
    if !expired.is_empty() {
        commands.push(CoreCommand::CancelTasks(expired));
        commands.push(CoreCommand::PushResults);
    }

    push_dispatch(scheduler, now, &mut commands);

    if options.exit_when_idle && scheduler.is_idle() {
        info!("scheduler idle; exit requested");
        commands.push(CoreCommand::RequestExit);
        return CoreStep {
            commands,
            keep_running: false,
        };
    }

    CoreStep::with(commands)
}

/// Inbound "run now" request. Goes through the same dedup path as a pull.
pub fn handle_enqueue(scheduler: &mut Scheduler, task: TaskRecord, now: DateTime<Utc>) -> CoreStep {
    let mut commands = Vec::new();

    if scheduler.enqueue(task) == EnqueueOutcome::Added {
        push_dispatch(scheduler, now, &mut commands);
    }

    CoreStep::with(commands)
}

/// Cancel a queued or running task.
pub fn handle_cancel(scheduler: &mut Scheduler, task_id: TaskId) -> CoreStep {
    if scheduler.request_cancel(task_id) {
        return CoreStep::with(vec![CoreCommand::CancelTasks(vec![task_id])]);
    }

    if scheduler.finished(task_id).is_some() {
        return CoreStep::with(vec![CoreCommand::PushResults]);
    }

    debug!(task_id, "cancel for unknown task; ignoring");
    CoreStep::idle()
}

/// An executor reported the outcome of a task.
pub fn handle_task_finished(
    scheduler: &mut Scheduler,
    task_id: TaskId,
    outcome: &ExecOutcome,
    now: DateTime<Utc>,
) -> CoreStep {
    let mut commands = Vec::new();

    if scheduler.complete(task_id, outcome).is_some() {
        commands.push(CoreCommand::PushResults);
    }

    // The target is free again; the next task may go.
    push_dispatch(scheduler, now, &mut commands);

    CoreStep::with(commands)
}

/// Stop the loop, terminating whatever is still running.
pub fn handle_shutdown(scheduler: &Scheduler) -> CoreStep {
    let running: Vec<TaskId> = scheduler.bindings().map(|b| b.task.id).collect();

    let mut commands = Vec::new();
    if !running.is_empty() {
        info!(count = running.len(), "shutdown: cancelling running tasks");
        commands.push(CoreCommand::CancelTasks(running));
    }

    CoreStep {
        commands,
        keep_running: false,
    }
}

fn push_dispatch(scheduler: &mut Scheduler, now: DateTime<Utc>, commands: &mut Vec<CoreCommand>) {
    let mut ready = Vec::new();
    while let Some(task) = scheduler.run_next(now) {
        ready.push(task);
    }

    if !ready.is_empty() {
        commands.push(CoreCommand::DispatchTasks(ready));
    }
}
