use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use gamed::api::ControlPlane;
use gamed::errors::{GamedError, Result};
use gamed::task::{TaskRecord, TaskStatus};
use gamed::types::{TargetScope, TaskId};

/// A result as the fake control plane received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushedResult {
    pub task_id: TaskId,
    pub status: TaskStatus,
    pub output: String,
}

#[derive(Debug, Default)]
struct State {
    tasks: Vec<TaskRecord>,
    pulls: Vec<TargetScope>,
    pushed: Vec<PushedResult>,
    fail_pulls: bool,
    fail_pushes: bool,
}

/// In-memory control plane.
///
/// Clones share state, so a test can keep one clone for inspection while
/// the runtime owns another. A successful push removes the task from the
/// served list, like the real panel marking it done.
#[derive(Debug, Clone, Default)]
pub struct FakeControlPlane {
    state: Arc<Mutex<State>>,
}

impl FakeControlPlane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: impl IntoIterator<Item = TaskRecord>) -> Self {
        let plane = Self::new();
        plane.state.lock().unwrap().tasks.extend(tasks);
        plane
    }

    pub fn add_task(&self, task: TaskRecord) {
        self.state.lock().unwrap().tasks.push(task);
    }

    pub fn set_fail_pulls(&self, fail: bool) {
        self.state.lock().unwrap().fail_pulls = fail;
    }

    pub fn set_fail_pushes(&self, fail: bool) {
        self.state.lock().unwrap().fail_pushes = fail;
    }

    /// Every scope pulled so far (failed pulls included).
    pub fn pulls(&self) -> Vec<TargetScope> {
        self.state.lock().unwrap().pulls.clone()
    }

    /// Every result accepted so far.
    pub fn pushed(&self) -> Vec<PushedResult> {
        self.state.lock().unwrap().pushed.clone()
    }

    /// Tasks still served to pulls.
    pub fn remaining(&self) -> Vec<TaskRecord> {
        self.state.lock().unwrap().tasks.clone()
    }
}

impl ControlPlane for FakeControlPlane {
    fn pull_tasks(
        &self,
        scope: TargetScope,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<TaskRecord>>> + Send + '_>> {
        let result = {
            let mut state = self.state.lock().unwrap();
            state.pulls.push(scope);
            if state.fail_pulls {
                Err(GamedError::SyncFailure("pull refused".to_string()))
            } else {
                Ok(state
                    .tasks
                    .iter()
                    .filter(|t| scope.covers(t.target_id))
                    .cloned()
                    .collect())
            }
        };

        Box::pin(async move { result })
    }

    fn push_result<'a>(
        &'a self,
        task_id: TaskId,
        status: TaskStatus,
        output: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        let result = {
            let mut state = self.state.lock().unwrap();
            if state.fail_pushes {
                Err(GamedError::SyncFailure("push refused".to_string()))
            } else {
                state.pushed.push(PushedResult {
                    task_id,
                    status,
                    output: output.to_string(),
                });
                state.tasks.retain(|t| t.id != task_id);
                Ok(())
            }
        };

        Box::pin(async move { result })
    }
}
