// tests/task_ordering.rs

use std::cmp::Ordering;

use chrono::{TimeDelta, Utc};
use gamed::task::{ExecOutcome, FailureKind, QueueKey, TaskRecord, TaskStatus, compare};
use gamed::types::TaskCommand;
use gamed_test_utils::TaskBuilder;

#[test]
fn compare_orders_by_status_then_execute_date() {
    let now = Utc::now();

    let waiting_late = TaskBuilder::new(1, 7).due_at(now, 60).build();
    let waiting_early = TaskBuilder::new(2, 7).due_at(now, -60).build();
    let working_early = TaskBuilder::new(3, 7)
        .status(TaskStatus::Working)
        .due_at(now, -600)
        .build();

    // (a, b, expected)
    let table = [
        (&waiting_early, &waiting_late, Ordering::Less),
        (&waiting_late, &waiting_early, Ordering::Greater),
        (&waiting_late, &working_early, Ordering::Less),
        (&working_early, &waiting_early, Ordering::Greater),
        (&waiting_early, &waiting_early, Ordering::Equal),
    ];

    for (a, b, expected) in table {
        assert_eq!(
            compare(a, b),
            expected,
            "compare(task {}, task {})",
            a.id,
            b.id
        );
    }
}

#[test]
fn queue_key_breaks_ties_by_id() {
    let now = Utc::now();
    let a = TaskBuilder::new(10, 1).execute_date(now).build();
    let b = TaskBuilder::new(11, 2).execute_date(now).build();

    assert_eq!(compare(&a, &b), Ordering::Equal);
    assert!(QueueKey::of(&a) < QueueKey::of(&b));
}

#[test]
fn advance_moves_forward_only() {
    let mut task = TaskRecord::new(1, 7, TaskCommand::Start, Utc::now());

    task.advance(TaskStatus::Working).unwrap();
    task.advance(TaskStatus::Working).unwrap();
    assert!(task.advance(TaskStatus::Waiting).is_err());

    task.advance(TaskStatus::Done).unwrap();
    let err = task.advance(TaskStatus::Error).unwrap_err();
    assert_eq!(err.from, TaskStatus::Done);
    assert_eq!(err.to, TaskStatus::Error);
    assert_eq!(task.status, TaskStatus::Done);
}

#[test]
fn is_due_includes_the_exact_instant() {
    let now = Utc::now();
    let task = TaskBuilder::new(1, 7).execute_date(now).build();

    assert!(task.is_due(now));
    assert!(!task.is_due(now - TimeDelta::seconds(1)));
}

#[test]
fn status_codes_match_the_panel() {
    for (status, code) in [
        (TaskStatus::Waiting, 0),
        (TaskStatus::Working, 1),
        (TaskStatus::Done, 2),
        (TaskStatus::Error, 3),
    ] {
        assert_eq!(status.code(), code);
        assert_eq!(TaskStatus::from_code(code), Some(status));
    }
    assert_eq!(TaskStatus::from_code(4), None);
}

#[test]
fn failure_report_leads_with_kind_and_exit_code() {
    let outcome = ExecOutcome::failed(
        FailureKind::CommandFailed,
        "start command exited with code 2",
        Some(2),
        "/srv/cs# ./start.sh\n\nboom\n\nExited with 2\n".to_string(),
    );

    assert_eq!(outcome.status(), TaskStatus::Error);
    let report = outcome.report();
    assert!(report.starts_with("command failed: start command exited with code 2\nexit code: 2\n"));
    assert!(report.ends_with("Exited with 2\n"));
}

#[test]
fn success_report_is_the_output() {
    let outcome = ExecOutcome::success(Some(0), "ok\n".to_string());
    assert_eq!(outcome.status(), TaskStatus::Done);
    assert_eq!(outcome.report(), "ok\n");
}
