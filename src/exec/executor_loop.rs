// src/exec/executor_loop.rs

//! Background loop that owns every running task.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::engine::RuntimeEvent;
use crate::exec::executor::ExecutorSettings;
use crate::exec::task_runner::run_task;
use crate::registry::ProcessRegistry;
use crate::task::TaskRecord;
use crate::types::TaskId;

/// Message accepted by the executor loop.
#[derive(Debug)]
pub enum ExecutorRequest {
    Run(TaskRecord),
    Cancel(TaskId),
}

/// Internal handle for a currently-running task.
///
/// - `cancel` flips to `true` to ask the runner to terminate its process.
/// - `handle` is the Tokio task that is actually running the command.
struct ActiveTask {
    cancel: watch::Sender<bool>,
    handle: tokio::task::JoinHandle<()>,
}

/// Spawn the background executor loop.
///
/// Each dispatched task runs in its own Tokio task. A `Run` for an id that
/// is still running is ignored; the scheduler never dispatches the same id
/// twice, so this only guards against duplicated requests.
pub fn spawn_executor(
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    registry: Arc<dyn ProcessRegistry>,
    settings: Arc<ExecutorSettings>,
) -> mpsc::Sender<ExecutorRequest> {
    let (tx, mut rx) = mpsc::channel::<ExecutorRequest>(32);

    tokio::spawn(async move {
        info!("executor loop started");

        let mut active: HashMap<TaskId, ActiveTask> = HashMap::new();

        while let Some(request) = rx.recv().await {
            active.retain(|_, t| !t.handle.is_finished());

            match request {
                ExecutorRequest::Run(task) => {
                    start_task(task, &mut active, &runtime_tx, &registry, &settings);
                }
                ExecutorRequest::Cancel(task_id) => cancel_task(task_id, &active),
            }
        }

        // Runtime is gone: stop whatever is still running.
        for (task_id, task) in active {
            if !task.handle.is_finished() {
                debug!(task_id, "executor shutting down; cancelling task");
                let _ = task.cancel.send(true);
            }
        }

        info!("executor loop finished (channel closed)");
    });

    tx
}

fn start_task(
    task: TaskRecord,
    active: &mut HashMap<TaskId, ActiveTask>,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
    registry: &Arc<dyn ProcessRegistry>,
    settings: &Arc<ExecutorSettings>,
) {
    let task_id = task.id;

    if active.contains_key(&task_id) {
        warn!(task_id, "task already running; ignoring duplicate dispatch");
        return;
    }

    let (cancel_tx, cancel_rx) = watch::channel(false);
    let rt_tx = runtime_tx.clone();
    let registry = Arc::clone(registry);
    let settings = Arc::clone(settings);

    let handle = tokio::spawn(async move {
        run_task(task, registry, settings, rt_tx, cancel_rx).await;
        debug!(task_id, "task runner future finished");
    });

    active.insert(
        task_id,
        ActiveTask {
            cancel: cancel_tx,
            handle,
        },
    );
}

fn cancel_task(task_id: TaskId, active: &HashMap<TaskId, ActiveTask>) {
    match active.get(&task_id) {
        Some(task) => {
            info!(task_id, "cancelling running task");
            if task.cancel.send(true).is_err() {
                debug!(task_id, "task already finished while cancelling");
            }
        }
        None => debug!(task_id, "cancel for a task that is not running; ignoring"),
    }
}
