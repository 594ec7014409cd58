use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use gamed::engine::RuntimeEvent;
use gamed::errors::Result;
use gamed::exec::ExecutorBackend;
use gamed::task::{ExecOutcome, FailureKind, TaskRecord};
use gamed::types::TaskId;
use tokio::sync::mpsc;

/// A fake executor that:
/// - records which tasks were dispatched and cancelled
/// - immediately reports `TaskFinished` for each dispatched task, with a
///   configured outcome or exit-0 success
/// - for "held" tasks, reports nothing until they are cancelled.
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    dispatched: Arc<Mutex<Vec<TaskId>>>,
    cancelled: Arc<Mutex<Vec<TaskId>>>,
    outcomes: HashMap<TaskId, ExecOutcome>,
    held: HashSet<TaskId>,
}

impl FakeExecutor {
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>) -> Self {
        Self {
            runtime_tx,
            dispatched: Arc::new(Mutex::new(Vec::new())),
            cancelled: Arc::new(Mutex::new(Vec::new())),
            outcomes: HashMap::new(),
            held: HashSet::new(),
        }
    }

    /// Report `outcome` when `task_id` is dispatched.
    pub fn with_outcome(mut self, task_id: TaskId, outcome: ExecOutcome) -> Self {
        self.outcomes.insert(task_id, outcome);
        self
    }

    /// Keep `task_id` running until it is cancelled.
    pub fn holding(mut self, task_id: TaskId) -> Self {
        self.held.insert(task_id);
        self
    }

    /// Shared log of dispatched ids, in dispatch order.
    pub fn dispatched(&self) -> Arc<Mutex<Vec<TaskId>>> {
        Arc::clone(&self.dispatched)
    }

    /// Shared log of cancelled ids.
    pub fn cancelled(&self) -> Arc<Mutex<Vec<TaskId>>> {
        Arc::clone(&self.cancelled)
    }
}

impl ExecutorBackend for FakeExecutor {
    fn dispatch_tasks(
        &mut self,
        tasks: Vec<TaskRecord>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let dispatched = Arc::clone(&self.dispatched);

        let finished: Vec<(TaskId, ExecOutcome)> = tasks
            .iter()
            .filter(|t| !self.held.contains(&t.id))
            .map(|t| {
                let outcome = self.outcomes.get(&t.id).cloned().unwrap_or_else(|| {
                    ExecOutcome::success(Some(0), format!("ran {} on {}\n", t.command, t.target_id))
                });
                (t.id, outcome)
            })
            .collect();

        Box::pin(async move {
            dispatched
                .lock()
                .unwrap()
                .extend(tasks.iter().map(|t| t.id));

            for (task_id, outcome) in finished {
                tx.send(RuntimeEvent::TaskFinished { task_id, outcome })
                    .await
                    .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }

    fn cancel_tasks(
        &mut self,
        ids: Vec<TaskId>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let cancelled = Arc::clone(&self.cancelled);
        let held: Vec<TaskId> = ids
            .iter()
            .copied()
            .filter(|id| self.held.remove(id))
            .collect();

        Box::pin(async move {
            cancelled.lock().unwrap().extend(ids.iter().copied());

            for task_id in held {
                let outcome = ExecOutcome::failed(
                    FailureKind::CommandFailed,
                    "terminated",
                    Some(143),
                    String::new(),
                );
                tx.send(RuntimeEvent::TaskFinished { task_id, outcome })
                    .await
                    .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}
