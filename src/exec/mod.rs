// src/exec/mod.rs

//! Process execution layer.
//!
//! This module turns scheduled tasks into shell commands run against a
//! managed server, and reports the outcome back to the runtime via
//! `RuntimeEvent`s.
//!
//! - [`command`] defines the executor's command codes.
//! - [`template`] renders command templates with server shortcodes.
//! - [`process`] owns a spawned process and collects its output.
//! - [`executor`] implements the lifecycle verbs (`start`, `stop`, ...).
//! - [`executor_loop`] owns the background loop which tracks running tasks.
//! - [`task_runner`] runs a single task and emits `TaskFinished`.
//! - [`backend`] provides the `ExecutorBackend` trait and a concrete
//!   `RealExecutorBackend` that the runtime uses in production, and which
//!   tests can replace with a fake implementation.

pub mod backend;
pub mod command;
pub mod context;
pub mod executor;
pub mod executor_loop;
pub mod output;
pub mod privilege;
pub mod process;
pub mod task_runner;
pub mod template;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use command::ServerCommand;
pub use context::ExecContext;
pub use executor::{CommandExecutor, ExecutorSettings};
pub use executor_loop::{ExecutorRequest, spawn_executor};
pub use output::OutputBuffer;
pub use process::{ExecOptions, ProcessExit, SpawnedProcess};
