// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of a raw mpsc sender.
//! This makes it easy to swap in a fake executor in tests while keeping the
//! production executor implementation in [`executor_loop`].
//!
//! - `RealExecutorBackend` is the default implementation used by `gamed`.
//!   It wraps the `spawn_executor` loop and forwards dispatch and cancel
//!   requests over an mpsc channel.
//! - Tests can provide their own `ExecutorBackend` that, for example, records
//!   which tasks were dispatched and directly emits `TaskFinished` events.
//!
//! [`executor_loop`]: super::executor_loop

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::engine::RuntimeEvent;
use crate::errors::{Error, Result};
use crate::exec::executor::ExecutorSettings;
use crate::registry::ProcessRegistry;
use crate::task::TaskRecord;
use crate::types::TaskId;

use super::executor_loop::{ExecutorRequest, spawn_executor};

/// Trait abstracting how dispatched tasks are executed.
///
/// Production code uses [`RealExecutorBackend`]; tests can provide their own
/// implementation that doesn't spawn real processes.
pub trait ExecutorBackend: Send {
    /// Start executing the given `working` tasks.
    ///
    /// Every dispatched task must eventually produce exactly one
    /// `RuntimeEvent::TaskFinished`.
    fn dispatch_tasks(
        &mut self,
        tasks: Vec<TaskRecord>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Best-effort termination of running tasks.
    fn cancel_tasks(
        &mut self,
        ids: Vec<TaskId>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Real executor backend used in production.
///
/// Internally, this just wraps the executor loop in [`spawn_executor`].
pub struct RealExecutorBackend {
    tx: mpsc::Sender<ExecutorRequest>,
}

impl RealExecutorBackend {
    /// Create a new real executor backend, wiring it to the given runtime
    /// event sender.
    ///
    /// This spawns the background executor loop immediately.
    pub fn new(
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        registry: Arc<dyn ProcessRegistry>,
        settings: Arc<ExecutorSettings>,
    ) -> Self {
        let tx = spawn_executor(runtime_tx, registry, settings);
        Self { tx }
    }

    fn send_all(
        &self,
        requests: Vec<ExecutorRequest>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        // Clone the sender so the future doesn't borrow `self` across `await`.
        let tx = self.tx.clone();

        Box::pin(async move {
            for request in requests {
                tx.send(request).await.map_err(Error::from)?;
            }
            Ok(())
        })
    }
}

impl ExecutorBackend for RealExecutorBackend {
    fn dispatch_tasks(
        &mut self,
        tasks: Vec<TaskRecord>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        self.send_all(tasks.into_iter().map(ExecutorRequest::Run).collect())
    }

    fn cancel_tasks(
        &mut self,
        ids: Vec<TaskId>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        self.send_all(ids.into_iter().map(ExecutorRequest::Cancel).collect())
    }
}
