// src/engine/mod.rs

//! Orchestration engine for gamed.
//!
//! This module ties together:
//! - the task scheduler
//! - reconciliation with the control plane
//! - the main runtime event loop that reacts to:
//!   - periodic ticks
//!   - inbound "run now" and cancel requests
//!   - process spawn and task completion events
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use crate::task::{ExecOutcome, TaskRecord};
use crate::types::TaskId;

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// If true, exit the runtime once nothing is queued, running or waiting
    /// to be reported (used for `--once`).
    pub exit_when_idle: bool,
}

/// Events flowing into the runtime from the ticker, executors and the
/// inbound session layer.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// Periodic heartbeat: reconcile, expire overdue tasks, dispatch.
    Tick,
    /// Operator asked for a task to be queued right away.
    EnqueueImmediate { task: TaskRecord },
    /// Operator asked for a task to be cancelled.
    CancelRequested { task_id: TaskId },
    /// An executor started a process on behalf of a task.
    ProcessSpawned { task_id: TaskId, pid: u32 },
    /// An executor finished a task.
    TaskFinished {
        task_id: TaskId,
        outcome: ExecOutcome,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod handle;
pub mod reconcile;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use handle::EnqueueHandle;
pub use reconcile::{ReconcileReport, pull_due, push_results, reconcile};
pub use runtime::Runtime;
