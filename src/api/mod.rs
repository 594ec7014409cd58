// src/api/mod.rs

//! Control plane: the remote system of record that issues tasks and
//! receives their results.
//!
//! - [`ControlPlane`] is what the reconcile step talks to.
//! - [`http`] is the production client for the panel's daemon API.

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;
use crate::task::{TaskRecord, TaskStatus};
use crate::types::{TargetScope, TaskId};

pub mod http;

pub use http::{HttpControlPlane, TaskDto, decode_tasks};

/// Remote task source and result sink.
///
/// Implementations report transport or protocol problems as
/// [`GamedError::SyncFailure`](crate::errors::GamedError::SyncFailure).
pub trait ControlPlane: Send + Sync {
    /// Tasks the control plane currently holds for `scope`.
    fn pull_tasks(
        &self,
        scope: TargetScope,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<TaskRecord>>> + Send + '_>>;

    /// Deliver the terminal status and output of a task. May be called more
    /// than once for the same task.
    fn push_result<'a>(
        &'a self,
        task_id: TaskId,
        status: TaskStatus,
        output: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}
