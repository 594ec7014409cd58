// src/scheduler/mod.rs

//! Task scheduling.
//!
//! - [`queue`] is the priority queue of pending tasks.
//! - [`sync_cache`] gates how often the control plane is polled.
//! - [`binding`] ties a running task to its process.
//! - [`core`] owns all of the above and enforces the invariants: one queued
//!   copy per task id, forward-only status, one working task per target.
//!
//! Nothing here performs IO; callers pass the current time in.

pub mod binding;
pub mod core;
pub mod queue;
pub mod sync_cache;

pub use binding::ExecutionBinding;
pub use core::{EnqueueOutcome, Scheduler, SchedulerOptions};
pub use queue::TaskQueue;
pub use sync_cache::SyncCache;
