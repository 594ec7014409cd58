// tests/core_runtime.rs

use std::time::Duration;

use chrono::{TimeDelta, Utc};
use gamed::engine::{CoreCommand, CoreRuntime, RuntimeEvent, RuntimeOptions};
use gamed::scheduler::{Scheduler, SchedulerOptions};
use gamed::task::{ExecOutcome, TaskStatus};
use gamed_test_utils::{TaskBuilder, init_tracing};

fn core(exit_when_idle: bool) -> CoreRuntime {
    let options = SchedulerOptions {
        command_timeout: Duration::from_secs(60),
        ..SchedulerOptions::default()
    };
    CoreRuntime::new(
        Scheduler::new(options, [7]),
        RuntimeOptions { exit_when_idle },
    )
}

fn dispatched(commands: &[CoreCommand]) -> Vec<u64> {
    commands
        .iter()
        .flat_map(|c| match c {
            CoreCommand::DispatchTasks(tasks) => tasks.iter().map(|t| t.id).collect(),
            _ => Vec::new(),
        })
        .collect()
}

#[test]
fn enqueue_immediate_dispatches_due_task() {
    init_tracing();
    let now = Utc::now();
    let mut core = core(false);

    let step = core.step(
        RuntimeEvent::EnqueueImmediate {
            task: TaskBuilder::new(1, 7).due_at(now, -1).build(),
        },
        now,
    );

    assert!(step.keep_running);
    assert_eq!(dispatched(&step.commands), vec![1]);
    assert_eq!(
        core.scheduler().binding(1).map(|b| b.task.status),
        Some(TaskStatus::Working)
    );
}

#[test]
fn duplicate_enqueue_dispatches_nothing() {
    let now = Utc::now();
    let mut core = core(false);
    let task = TaskBuilder::new(1, 7).due_at(now, 30).build();

    core.step(RuntimeEvent::EnqueueImmediate { task: task.clone() }, now);
    let step = core.step(RuntimeEvent::EnqueueImmediate { task }, now);

    assert!(step.commands.is_empty());
    assert_eq!(core.scheduler().len(), 1);
}

#[test]
fn finish_pushes_results_and_dispatches_the_next_task() {
    let now = Utc::now();
    let mut core = core(false);
    core.step(
        RuntimeEvent::EnqueueImmediate {
            task: TaskBuilder::new(1, 7).due_at(now, -2).build(),
        },
        now,
    );
    core.step(
        RuntimeEvent::EnqueueImmediate {
            task: TaskBuilder::new(2, 7).due_at(now, -1).build(),
        },
        now,
    );

    let step = core.step(
        RuntimeEvent::TaskFinished {
            task_id: 1,
            outcome: ExecOutcome::success(Some(0), String::new()),
        },
        now,
    );

    assert_eq!(step.commands.first(), Some(&CoreCommand::PushResults));
    assert_eq!(dispatched(&step.commands), vec![2]);
}

#[test]
fn tick_expires_overdue_tasks_and_cancels_them() {
    init_tracing();
    let now = Utc::now();
    let mut core = core(false);
    core.step(
        RuntimeEvent::EnqueueImmediate {
            task: TaskBuilder::new(1, 7).due_at(now, -1).build(),
        },
        now,
    );
    core.step(RuntimeEvent::ProcessSpawned { task_id: 1, pid: 999 }, now);

    let later = now + TimeDelta::seconds(61);
    let step = core.step(RuntimeEvent::Tick, later);

    assert!(step.commands.contains(&CoreCommand::CancelTasks(vec![1])));
    assert!(step.commands.contains(&CoreCommand::PushResults));
    assert_eq!(
        core.scheduler().finished(1).map(|t| t.status),
        Some(TaskStatus::Error)
    );
}

#[test]
fn cancel_running_task_emits_cancel_command() {
    let now = Utc::now();
    let mut core = core(false);
    core.step(
        RuntimeEvent::EnqueueImmediate {
            task: TaskBuilder::new(1, 7).due_at(now, -1).build(),
        },
        now,
    );

    let step = core.step(RuntimeEvent::CancelRequested { task_id: 1 }, now);
    assert_eq!(step.commands, vec![CoreCommand::CancelTasks(vec![1])]);
}

#[test]
fn cancel_queued_task_pushes_its_failure() {
    let now = Utc::now();
    let mut core = core(false);
    core.step(
        RuntimeEvent::EnqueueImmediate {
            task: TaskBuilder::new(1, 7).due_at(now, 60).build(),
        },
        now,
    );

    let step = core.step(RuntimeEvent::CancelRequested { task_id: 1 }, now);
    assert_eq!(step.commands, vec![CoreCommand::PushResults]);
}

#[test]
fn tick_requests_exit_when_idle_in_once_mode() {
    let now = Utc::now();
    let mut core = core(true);

    let step = core.step(RuntimeEvent::Tick, now);
    assert!(!step.keep_running);
    assert!(step.commands.contains(&CoreCommand::RequestExit));
}

#[test]
fn tick_keeps_running_while_work_is_pending() {
    let now = Utc::now();
    let mut core = core(true);
    core.step(
        RuntimeEvent::EnqueueImmediate {
            task: TaskBuilder::new(1, 7).due_at(now, 60).build(),
        },
        now,
    );

    let step = core.step(RuntimeEvent::Tick, now);
    assert!(step.keep_running);
}

#[test]
fn shutdown_cancels_running_tasks() {
    let now = Utc::now();
    let mut core = core(false);
    core.step(
        RuntimeEvent::EnqueueImmediate {
            task: TaskBuilder::new(1, 7).due_at(now, -1).build(),
        },
        now,
    );

    let step = core.step(RuntimeEvent::ShutdownRequested, now);
    assert!(!step.keep_running);
    assert_eq!(step.commands, vec![CoreCommand::CancelTasks(vec![1])]);
}
