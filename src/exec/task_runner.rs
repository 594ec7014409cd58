// src/exec/task_runner.rs

//! Individual task runner.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use crate::engine::RuntimeEvent;
use crate::exec::command::ServerCommand;
use crate::exec::context::ExecContext;
use crate::exec::executor::{CommandExecutor, ExecutorSettings};
use crate::registry::ProcessRegistry;
use crate::task::{ExecOutcome, FailureKind, TaskRecord};

/// Run a single task and emit exactly one `TaskFinished` for it.
///
/// Resolution failures produce a `TargetNotFound` outcome without spawning
/// anything. A cancelled task still reports; its outcome is a failure.
pub async fn run_task(
    task: TaskRecord,
    registry: Arc<dyn ProcessRegistry>,
    settings: Arc<ExecutorSettings>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    cancel_rx: watch::Receiver<bool>,
) {
    let task_id = task.id;
    let command = ServerCommand::from(task.command);

    info!(
        task_id,
        target_id = task.target_id,
        %command,
        "starting task"
    );

    let outcome = match CommandExecutor::new(command, task.target_id, registry.as_ref(), settings) {
        Ok(executor) => {
            let ctx = ExecContext::new(task_id, runtime_tx.clone(), cancel_rx);
            executor.execute(&ctx).await
        }
        Err(e) => {
            warn!(task_id, target_id = task.target_id, error = %e, "cannot resolve target");
            ExecOutcome::failed(FailureKind::TargetNotFound, e.to_string(), None, String::new())
        }
    };

    info!(
        task_id,
        exit_code = outcome.exit_code,
        success = outcome.is_success(),
        "task finished"
    );

    if let Err(e) = runtime_tx
        .send(RuntimeEvent::TaskFinished { task_id, outcome })
        .await
    {
        error!(task_id, error = %e, "failed to report task completion to runtime");
    }
}
