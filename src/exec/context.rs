// src/exec/context.rs

use tokio::sync::{mpsc, watch};
use tracing::debug;

use crate::engine::RuntimeEvent;
use crate::types::TaskId;

/// Per-invocation link between an executor and the runtime.
///
/// Carries the cancellation flag and, when the executor runs on behalf of
/// a scheduled task, the channel used to report spawned process ids.
#[derive(Debug, Clone)]
pub struct ExecContext {
    task_id: Option<TaskId>,
    events: Option<mpsc::Sender<RuntimeEvent>>,
    cancel: watch::Receiver<bool>,
}

impl ExecContext {
    pub fn new(
        task_id: TaskId,
        events: mpsc::Sender<RuntimeEvent>,
        cancel: watch::Receiver<bool>,
    ) -> Self {
        Self {
            task_id: Some(task_id),
            events: Some(events),
            cancel,
        }
    }

    /// A context that never reports and is cancelled only through the
    /// returned sender.
    pub fn detached() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        let ctx = Self {
            task_id: None,
            events: None,
            cancel: rx,
        };
        (tx, ctx)
    }

    pub fn task_id(&self) -> Option<TaskId> {
        self.task_id
    }

    pub fn is_cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Resolves once cancellation is requested. Never resolves if the
    /// sending side is gone without having cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.cancel.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    pub async fn report_spawn(&self, pid: u32) {
        let (Some(task_id), Some(events)) = (self.task_id, &self.events) else {
            return;
        };
        if events
            .send(RuntimeEvent::ProcessSpawned { task_id, pid })
            .await
            .is_err()
        {
            debug!(task_id, pid, "runtime gone; spawn not reported");
        }
    }
}
