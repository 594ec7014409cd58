// tests/runtime_fake_executor.rs

use std::time::Duration;

use chrono::Utc;
use gamed::engine::{CoreRuntime, EnqueueHandle, Runtime, RuntimeEvent, RuntimeOptions};
use gamed::scheduler::{Scheduler, SchedulerOptions};
use gamed::task::{ExecOutcome, FailureKind, TaskStatus};
use gamed::types::TaskCommand;
use gamed_test_utils::{FakeControlPlane, FakeExecutor, TaskBuilder, init_tracing, with_timeout};
use tokio::sync::mpsc;

type TestResult = Result<(), Box<dyn std::error::Error>>;

const TICK: Duration = Duration::from_millis(20);

fn core(options: SchedulerOptions, exit_when_idle: bool) -> CoreRuntime {
    CoreRuntime::new(
        Scheduler::new(options, [7]),
        RuntimeOptions { exit_when_idle },
    )
}

async fn wait_for_push(api: &FakeControlPlane, count: usize) {
    while api.pushed().len() < count {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn pulled_start_task_runs_and_result_is_pushed() -> TestResult {
    init_tracing();

    let api = FakeControlPlane::with_tasks([TaskBuilder::new(1, 7)
        .command(TaskCommand::Start)
        .due_at(Utc::now(), -1)
        .build()]);

    let (tx, rx) = mpsc::channel::<RuntimeEvent>(64);
    let executor = FakeExecutor::new(tx.clone());
    let dispatched = executor.dispatched();

    let runtime = Runtime::new(
        core(SchedulerOptions::default(), true),
        rx,
        executor,
        api.clone(),
        TICK,
    );

    let core = with_timeout(runtime.run()).await?;

    assert_eq!(*dispatched.lock().unwrap(), vec![1]);

    let pushed = api.pushed();
    assert_eq!(pushed.len(), 1);
    assert_eq!(pushed[0].task_id, 1);
    assert_eq!(pushed[0].status, TaskStatus::Done);
    assert!(api.remaining().is_empty());
    assert!(core.is_idle());
    Ok(())
}

#[tokio::test]
async fn failing_task_reports_error_upstream() -> TestResult {
    init_tracing();

    let api = FakeControlPlane::with_tasks([TaskBuilder::new(3, 7).due_at(Utc::now(), -1).build()]);
    let (tx, rx) = mpsc::channel::<RuntimeEvent>(64);
    let executor = FakeExecutor::new(tx.clone()).with_outcome(
        3,
        ExecOutcome::failed(
            FailureKind::CommandFailed,
            "start command exited with code 1",
            Some(1),
            "segfault\n".to_string(),
        ),
    );

    let runtime = Runtime::new(
        core(SchedulerOptions::default(), true),
        rx,
        executor,
        api.clone(),
        TICK,
    );
    with_timeout(runtime.run()).await?;

    let pushed = api.pushed();
    assert_eq!(pushed.len(), 1);
    assert_eq!(pushed[0].status, TaskStatus::Error);
    assert!(pushed[0].output.contains("segfault"));
    Ok(())
}

#[tokio::test]
async fn enqueue_handle_and_cancel_reach_the_executor() -> TestResult {
    init_tracing();

    let api = FakeControlPlane::new();
    let (tx, rx) = mpsc::channel::<RuntimeEvent>(64);
    let executor = FakeExecutor::new(tx.clone()).holding(5);
    let cancelled = executor.cancelled();
    let handle = EnqueueHandle::new(tx.clone());

    let runtime = Runtime::new(
        core(SchedulerOptions::default(), false),
        rx,
        executor,
        api.clone(),
        TICK,
    );

    let driver = async {
        let task = TaskBuilder::new(5, 7).due_at(Utc::now(), -1).build();
        handle.enqueue_immediate(task.clone()).await?;
        // Duplicate request while running is absorbed.
        handle.enqueue_immediate(task).await?;
        tokio::time::sleep(Duration::from_millis(50)).await;

        handle.cancel(5).await?;
        wait_for_push(&api, 1).await;

        handle.shutdown().await?;
        Ok::<_, gamed::errors::GamedError>(())
    };

    let (core, driven) = with_timeout(async { tokio::join!(runtime.run(), driver) }).await;
    driven?;
    let core = core?;

    assert_eq!(*cancelled.lock().unwrap(), vec![5]);
    let pushed = api.pushed();
    assert_eq!(pushed.len(), 1);
    assert_eq!(pushed[0].task_id, 5);
    assert_eq!(pushed[0].status, TaskStatus::Error);
    assert!(core.is_idle());
    Ok(())
}

#[tokio::test]
async fn hung_task_times_out_and_is_cancelled() -> TestResult {
    init_tracing();

    let api = FakeControlPlane::with_tasks([TaskBuilder::new(9, 7).due_at(Utc::now(), -1).build()]);
    let (tx, rx) = mpsc::channel::<RuntimeEvent>(64);
    let executor = FakeExecutor::new(tx.clone()).holding(9);
    let cancelled = executor.cancelled();

    let options = SchedulerOptions {
        command_timeout: Duration::from_millis(100),
        ..SchedulerOptions::default()
    };
    let runtime = Runtime::new(core(options, true), rx, executor, api.clone(), TICK);
    with_timeout(runtime.run()).await?;

    assert_eq!(*cancelled.lock().unwrap(), vec![9]);
    let pushed = api.pushed();
    assert_eq!(pushed.len(), 1, "late completion must not be pushed twice");
    assert_eq!(pushed[0].status, TaskStatus::Error);
    assert!(pushed[0].output.starts_with("execution timeout"));
    Ok(())
}

#[tokio::test]
async fn push_failures_are_retried_on_later_ticks() -> TestResult {
    init_tracing();

    let api = FakeControlPlane::with_tasks([TaskBuilder::new(4, 7).due_at(Utc::now(), -1).build()]);
    api.set_fail_pushes(true);

    let (tx, rx) = mpsc::channel::<RuntimeEvent>(64);
    let executor = FakeExecutor::new(tx.clone());
    let runtime = Runtime::new(
        core(SchedulerOptions::default(), true),
        rx,
        executor,
        api.clone(),
        TICK,
    );

    let healer = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(api.pushed().is_empty());
        api.set_fail_pushes(false);
    };

    let (core, ()) = with_timeout(async { tokio::join!(runtime.run(), healer) }).await;
    core?;

    assert_eq!(api.pushed().len(), 1);
    assert_eq!(api.pushed()[0].status, TaskStatus::Done);
    Ok(())
}
