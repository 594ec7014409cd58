// src/task/mod.rs

//! Task records and the values that flow with them.
//!
//! - [`record`] holds the task entity and its status state machine.
//! - [`ordering`] defines execution priority between two tasks.
//! - [`outcome`] describes what the executor reports back.

pub mod ordering;
pub mod outcome;
pub mod record;

pub use ordering::{QueueKey, compare};
pub use outcome::{ExecOutcome, Failure, FailureKind};
pub use record::{StatusTransitionError, TaskRecord, TaskStatus};
