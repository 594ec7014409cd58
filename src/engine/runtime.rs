// src/engine/runtime.rs

use std::fmt;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::api::ControlPlane;
use crate::errors::Result;
use crate::exec::ExecutorBackend;
use crate::task::TaskRecord;
use crate::types::TaskId;

use super::core::CoreRuntime;
use super::reconcile::{push_results, reconcile};
use super::{CoreCommand, RuntimeEvent};

/// Drives the task scheduler in response to `RuntimeEvent`s and a periodic
/// tick, delegates command execution to an `ExecutorBackend` and talks to
/// the control plane.
///
/// This is an IO shell around `CoreRuntime`, which contains the runtime
/// semantics.
pub struct Runtime<E: ExecutorBackend, C: ControlPlane> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
    control_plane: C,
    tick_interval: Duration,
}

impl<E: ExecutorBackend, C: ControlPlane> fmt::Debug for Runtime<E, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("tick_interval", &self.tick_interval)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend, C: ControlPlane> Runtime<E, C> {
    pub fn new(
        core: CoreRuntime,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        executor: E,
        control_plane: C,
        tick_interval: Duration,
    ) -> Self {
        Self {
            core,
            event_rx,
            executor,
            control_plane,
            tick_interval,
        }
    }

    /// Main event loop.
    ///
    /// - Ticks every `tick_interval` (the first tick fires immediately).
    /// - Consumes `RuntimeEvent`s from `event_rx`.
    /// - Feeds both into the core runtime and executes the commands it
    ///   returns.
    ///
    /// Returns the core so callers can inspect the final state.
    pub async fn run(mut self) -> Result<CoreRuntime> {
        info!(tick_interval = ?self.tick_interval, "gamed runtime started");

        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let event = tokio::select! {
                maybe = self.event_rx.recv() => match maybe {
                    Some(e) => e,
                    None => {
                        info!("runtime event channel closed; exiting");
                        break;
                    }
                },
                _ = ticker.tick() => RuntimeEvent::Tick,
            };

            match &event {
                RuntimeEvent::Tick => {
                    reconcile(self.core.scheduler_mut(), &self.control_plane, Utc::now()).await;
                }
                other => debug!(event = ?other, "runtime received event"),
            }

            // Feed the event into the pure core and get commands back.
            let step = self.core.step(event, Utc::now());

            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                info!("core requested exit; stopping runtime");
                break;
            }
        }

        info!("runtime exiting");
        Ok(self.core)
    }

    /// Execute a single command from the core.
    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::DispatchTasks(tasks) => self.dispatch(tasks).await?,
            CoreCommand::CancelTasks(ids) => self.cancel(ids).await?,
            CoreCommand::PushResults => {
                push_results(self.core.scheduler_mut(), &self.control_plane).await;
            }
            CoreCommand::RequestExit => {
                // keep_running=false already ends the loop.
                info!("core issued RequestExit command");
            }
        }
        Ok(())
    }

    async fn dispatch(&mut self, tasks: Vec<TaskRecord>) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }

        let ids: Vec<TaskId> = tasks.iter().map(|t| t.id).collect();
        debug!(?ids, "dispatching tasks to executor");

        self.executor.dispatch_tasks(tasks).await
    }

    async fn cancel(&mut self, ids: Vec<TaskId>) -> Result<()> {
        if ids.is_empty() {
            return Ok(());
        }

        debug!(?ids, "cancelling tasks at executor");
        self.executor.cancel_tasks(ids).await
    }
}
