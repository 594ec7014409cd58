// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels and the ticker
//! - reconciling with the control plane
//! - sending tasks and cancellations to the executor
//! - handling Ctrl+C / shutdown
//!
//! The core is intended to be extensively unit tested without any Tokio,
//! channels, network, or processes. Time is passed in.

use chrono::{DateTime, Utc};

use crate::engine::event_handlers::{
    CoreStep, handle_cancel, handle_enqueue, handle_shutdown, handle_task_finished, handle_tick,
};
use crate::engine::{RuntimeEvent, RuntimeOptions};
use crate::scheduler::Scheduler;

/// Pure core runtime state.
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
    options: RuntimeOptions,
}

impl CoreRuntime {
    pub fn new(scheduler: Scheduler, options: RuntimeOptions) -> Self {
        Self { scheduler, options }
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Mutable access for the reconcile step, which runs in the shell.
    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent, now: DateTime<Utc>) -> CoreStep {
        match event {
            RuntimeEvent::Tick => handle_tick(&mut self.scheduler, &self.options, now),
            RuntimeEvent::EnqueueImmediate { task } => {
                handle_enqueue(&mut self.scheduler, task, now)
            }
            RuntimeEvent::CancelRequested { task_id } => {
                handle_cancel(&mut self.scheduler, task_id)
            }
            RuntimeEvent::ProcessSpawned { task_id, pid } => {
                self.scheduler.record_spawn(task_id, pid);
                CoreStep::idle()
            }
            RuntimeEvent::TaskFinished { task_id, outcome } => {
                handle_task_finished(&mut self.scheduler, task_id, &outcome, now)
            }
            RuntimeEvent::ShutdownRequested => handle_shutdown(&self.scheduler),
        }
    }
}
