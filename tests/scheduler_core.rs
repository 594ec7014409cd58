// tests/scheduler_core.rs

use std::time::Duration;

use chrono::{TimeDelta, Utc};
use gamed::scheduler::{EnqueueOutcome, Scheduler, SchedulerOptions};
use gamed::task::{ExecOutcome, FailureKind, TaskStatus};
use gamed::types::{Concurrency, TargetId, TargetScope, TaskCommand};
use gamed_test_utils::{TaskBuilder, init_tracing};

fn scheduler() -> Scheduler {
    Scheduler::new(SchedulerOptions::default(), [7])
}

#[test]
fn empty_scheduler_run_next_is_noop() {
    init_tracing();
    let mut s = scheduler();

    assert!(s.is_empty());
    assert!(s.run_next(Utc::now()).is_none());
    assert!(s.is_idle());
}

#[test]
fn future_task_is_not_dispatched_until_due() {
    init_tracing();
    let now = Utc::now();
    let mut s = scheduler();

    s.enqueue(
        TaskBuilder::new(2, 7)
            .command(TaskCommand::Stop)
            .due_at(now, 60)
            .build(),
    );

    assert!(s.run_next(now).is_none());
    assert_eq!(s.len(), 1);
    assert!(s.binding(2).is_none());
    assert_eq!(s.queued().next().map(|t| t.status), Some(TaskStatus::Waiting));

    let later = now + TimeDelta::seconds(60);
    let task = s.run_next(later).expect("task due after 60s");
    assert_eq!(task.id, 2);
    assert_eq!(task.status, TaskStatus::Working);
    assert!(s.is_empty());
    assert_eq!(s.binding(2).map(|b| b.started_at), Some(later));
}

#[test]
fn enqueue_is_idempotent_until_acknowledged() {
    init_tracing();
    let now = Utc::now();
    let mut s = scheduler();
    let task = TaskBuilder::new(1, 7).due_at(now, -1).build();

    assert_eq!(s.enqueue(task.clone()), EnqueueOutcome::Added);
    assert_eq!(s.enqueue(task.clone()), EnqueueOutcome::Duplicate);
    assert_eq!(s.len(), 1);

    // Still deduplicated while running and while the result is unpushed.
    s.run_next(now).unwrap();
    assert_eq!(s.enqueue(task.clone()), EnqueueOutcome::Duplicate);
    s.complete(1, &ExecOutcome::success(Some(0), String::new()));
    assert_eq!(s.enqueue(task.clone()), EnqueueOutcome::Duplicate);

    assert!(s.acknowledge(1));
    assert!(!s.contains(1));
    assert!(s.is_idle());
    assert_eq!(s.enqueue(task), EnqueueOutcome::Added);
}

#[test]
fn terminal_tasks_are_not_enqueued() {
    let mut s = scheduler();
    let done = TaskBuilder::new(5, 7).status(TaskStatus::Done).build();

    assert_eq!(s.enqueue(done), EnqueueOutcome::Terminal);
    assert!(s.is_empty());
    assert!(!s.contains(5));
}

#[test]
fn earlier_execute_date_pops_first_regardless_of_arrival() {
    init_tracing();
    let now = Utc::now();
    let mut s = scheduler();

    s.enqueue(TaskBuilder::new(20, 7).due_at(now, -10).build());
    s.enqueue(TaskBuilder::new(10, 7).due_at(now, -20).build());

    let first = s.run_next(now).unwrap();
    assert_eq!(first.id, 10);

    s.complete(10, &ExecOutcome::success(Some(0), String::new()));
    let second = s.run_next(now).unwrap();
    assert_eq!(second.id, 20);
}

#[test]
fn waiting_runs_before_working() {
    let now = Utc::now();
    let mut s = scheduler();

    s.enqueue(
        TaskBuilder::new(1, 7)
            .status(TaskStatus::Working)
            .due_at(now, -100)
            .build(),
    );
    s.enqueue(TaskBuilder::new(2, 7).due_at(now, -1).build());

    assert_eq!(s.run_next(now).unwrap().id, 2);
}

#[test]
fn single_mode_runs_one_task_at_a_time() {
    let now = Utc::now();
    let mut s = Scheduler::new(SchedulerOptions::default(), [7, 8]);

    s.enqueue(TaskBuilder::new(1, 7).due_at(now, -2).build());
    s.enqueue(TaskBuilder::new(2, 8).due_at(now, -1).build());

    assert_eq!(s.run_next(now).unwrap().id, 1);
    assert!(s.run_next(now).is_none());

    s.complete(1, &ExecOutcome::success(Some(0), String::new()));
    assert_eq!(s.run_next(now).unwrap().id, 2);
}

#[test]
fn per_target_mode_serializes_each_target() {
    let now = Utc::now();
    let options = SchedulerOptions {
        concurrency: Concurrency::PerTarget,
        ..SchedulerOptions::default()
    };
    let mut s = Scheduler::new(options, [7, 8]);

    s.enqueue(TaskBuilder::new(1, 7).due_at(now, -3).build());
    s.enqueue(TaskBuilder::new(2, 7).due_at(now, -2).build());
    s.enqueue(TaskBuilder::new(3, 8).due_at(now, -1).build());

    assert_eq!(s.run_next(now).unwrap().id, 1);
    // Task 2 waits for target 7; target 8 is free.
    assert_eq!(s.run_next(now).unwrap().id, 3);
    assert!(s.run_next(now).is_none());
    assert!(s.is_target_working(7));
    assert!(s.is_target_working(8));

    s.complete(1, &ExecOutcome::success(Some(0), String::new()));
    assert_eq!(s.run_next(now).unwrap().id, 2);
}

#[test]
fn failed_execution_becomes_error_with_output() {
    let now = Utc::now();
    let mut s = scheduler();
    s.enqueue(TaskBuilder::new(1, 7).due_at(now, -1).build());
    s.run_next(now).unwrap();

    let outcome = ExecOutcome::failed(
        FailureKind::CommandFailed,
        "start command exited with code 1",
        Some(1),
        "boom\n".to_string(),
    );
    let task = s.complete(1, &outcome).unwrap().clone();

    assert_eq!(task.status, TaskStatus::Error);
    let output = task.output.unwrap();
    assert!(!output.is_empty());
    assert!(output.contains("boom"));
    assert!(s.binding(1).is_none());
}

#[test]
fn target_not_found_outcome_marks_error() {
    let now = Utc::now();
    let mut s = scheduler();
    s.enqueue(TaskBuilder::new(4, 99).due_at(now, -1).build());
    s.run_next(now).unwrap();

    let outcome = ExecOutcome::failed(
        FailureKind::TargetNotFound,
        "Target not found: 99",
        None,
        String::new(),
    );
    let task = s.complete(4, &outcome).unwrap();

    assert_eq!(task.status, TaskStatus::Error);
    assert!(task.output.as_deref().unwrap().starts_with("target not found"));
    assert_eq!(s.pending_results().len(), 1);
}

#[test]
fn record_spawn_binds_pid() {
    let now = Utc::now();
    let mut s = scheduler();
    s.enqueue(TaskBuilder::new(1, 7).due_at(now, -1).build());
    s.run_next(now).unwrap();

    s.record_spawn(1, 4242);
    assert_eq!(s.binding(1).and_then(|b| b.pid), Some(4242));

    // Unknown tasks are ignored.
    s.record_spawn(2, 1);
    assert!(s.binding(2).is_none());
}

#[test]
fn overdue_task_times_out_and_frees_target() {
    init_tracing();
    let now = Utc::now();
    let options = SchedulerOptions {
        command_timeout: Duration::from_secs(30),
        ..SchedulerOptions::default()
    };
    let mut s = Scheduler::new(options, [7]);
    s.enqueue(TaskBuilder::new(1, 7).due_at(now, -1).build());
    s.enqueue(TaskBuilder::new(2, 7).due_at(now, 0).build());
    s.run_next(now).unwrap();

    assert!(s.expire_overdue(now + TimeDelta::seconds(29)).is_empty());

    let expired = s.expire_overdue(now + TimeDelta::seconds(30));
    assert_eq!(expired, vec![1]);
    assert!(s.binding(1).is_none());

    let task = s.finished(1).unwrap();
    assert_eq!(task.status, TaskStatus::Error);
    assert!(task.output.as_deref().unwrap().starts_with("execution timeout"));

    // A late completion from the killed process is ignored.
    assert!(s.complete(1, &ExecOutcome::success(Some(0), String::new())).is_none());
    assert_eq!(s.finished(1).unwrap().status, TaskStatus::Error);

    // The target is schedulable again.
    assert_eq!(s.run_next(now + TimeDelta::seconds(30)).unwrap().id, 2);
}

#[test]
fn cancel_queued_task_fails_it_without_running() {
    let now = Utc::now();
    let mut s = scheduler();
    s.enqueue(TaskBuilder::new(1, 7).due_at(now, 60).build());

    assert!(!s.request_cancel(1));
    assert!(s.is_empty());

    let task = s.finished(1).unwrap();
    assert_eq!(task.status, TaskStatus::Error);
    assert!(task.output.as_deref().unwrap().contains("cancelled before start"));
}

#[test]
fn cancel_running_task_leaves_completion_to_executor() {
    let now = Utc::now();
    let mut s = scheduler();
    s.enqueue(TaskBuilder::new(1, 7).due_at(now, -1).build());
    s.run_next(now).unwrap();

    assert!(s.request_cancel(1));
    assert!(s.binding(1).is_some());
    assert!(s.finished(1).is_none());
}

#[test]
fn due_scopes_follow_cache_ttl() {
    let now = Utc::now();
    let options = SchedulerOptions {
        cache_ttl: Duration::from_secs(300),
        ..SchedulerOptions::default()
    };
    let mut s = Scheduler::new(options, [7, 8]);

    assert_eq!(
        s.due_scopes(now),
        vec![TargetScope::Target(7), TargetScope::Target(8)]
    );

    s.mark_synced(TargetScope::Target(7), now);
    assert_eq!(s.due_scopes(now), vec![TargetScope::Target(8)]);
    assert_eq!(s.last_sync(TargetScope::Target(7)), Some(now));

    let before_ttl = now + TimeDelta::seconds(299);
    assert_eq!(s.due_scopes(before_ttl), vec![TargetScope::Target(8)]);

    let at_ttl = now + TimeDelta::seconds(300);
    assert!(s.due_scopes(at_ttl).contains(&TargetScope::Target(7)));
}

#[test]
fn empty_registry_syncs_everything_at_once() {
    let now = Utc::now();
    let mut s = Scheduler::new(SchedulerOptions::default(), Vec::<TargetId>::new());

    assert_eq!(s.due_scopes(now), vec![TargetScope::All]);
    s.mark_synced(TargetScope::All, now);
    assert!(s.due_scopes(now).is_empty());
}
