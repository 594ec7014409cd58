// tests/runtime_real_executor.rs
#![cfg(unix)]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use gamed::config::ScriptsSection;
use gamed::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions};
use gamed::exec::RealExecutorBackend;
use gamed::registry::{ProcessRegistry, StaticRegistry};
use gamed::scheduler::{Scheduler, SchedulerOptions};
use gamed::task::TaskStatus;
use gamed::types::TaskCommand;
use gamed_test_utils::{
    FakeControlPlane, ServerBuilder, TaskBuilder, executor_settings, init_tracing, with_timeout,
};
use tokio::sync::mpsc;

type TestResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::test]
async fn start_then_stop_against_real_processes() -> TestResult {
    init_tracing();

    let work = tempfile::tempdir()?;
    std::fs::create_dir(work.path().join("srv7"))?;

    let server = ServerBuilder::new(7, "srv7")
        .start("touch running && echo up")
        .stop("rm -f running && echo down")
        .build();
    let registry: Arc<dyn ProcessRegistry> = Arc::new(StaticRegistry::new([server]));
    let scripts = ScriptsSection {
        status: "test -f running".to_string(),
        ..ScriptsSection::default()
    };
    let settings = executor_settings(work.path(), scripts);

    let now = Utc::now();
    let api = FakeControlPlane::with_tasks([
        TaskBuilder::new(1, 7)
            .command(TaskCommand::Start)
            .due_at(now, -2)
            .build(),
        TaskBuilder::new(2, 7)
            .command(TaskCommand::Stop)
            .due_at(now, -1)
            .build(),
        // Unknown target: fails without spawning anything.
        TaskBuilder::new(3, 99).due_at(now, -1).build(),
    ]);

    let (tx, rx) = mpsc::channel::<RuntimeEvent>(64);
    let executor = RealExecutorBackend::new(tx.clone(), Arc::clone(&registry), settings);

    let scheduler = Scheduler::new(SchedulerOptions::default(), registry.ids());
    let core = CoreRuntime::new(
        scheduler,
        RuntimeOptions {
            exit_when_idle: true,
        },
    );
    let runtime = Runtime::new(core, rx, executor, api.clone(), Duration::from_millis(20));

    with_timeout(runtime.run()).await?;

    let pushed = api.pushed();
    let ids: Vec<u64> = pushed.iter().map(|p| p.task_id).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    assert_eq!(pushed[0].status, TaskStatus::Done);
    assert!(pushed[0].output.contains("up"));
    assert_eq!(pushed[1].status, TaskStatus::Done);
    assert!(pushed[1].output.contains("down"));
    assert_eq!(pushed[2].status, TaskStatus::Error);
    assert!(pushed[2].output.starts_with("target not found"));

    assert!(!work.path().join("srv7/running").exists());
    Ok(())
}
