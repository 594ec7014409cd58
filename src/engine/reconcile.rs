// src/engine/reconcile.rs

//! Keeping local state in line with the control plane.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::api::ControlPlane;
use crate::errors::GamedError;
use crate::scheduler::{EnqueueOutcome, Scheduler};
use crate::types::TargetScope;

/// What a reconcile pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Tasks returned by the control plane.
    pub pulled: usize,
    /// Pulled tasks that were new.
    pub enqueued: usize,
    /// Results acknowledged by the control plane.
    pub pushed: usize,
    /// Pulls and pushes that failed; they are retried on the next pass.
    pub failures: usize,
}

impl ReconcileReport {
    fn merge(&mut self, other: ReconcileReport) {
        self.pulled += other.pulled;
        self.enqueued += other.enqueued;
        self.pushed += other.pushed;
        self.failures += other.failures;
    }
}

/// Pull every scope whose cache entry expired, then push pending results.
///
/// Failures are logged and leave local state untouched.
pub async fn reconcile<C>(scheduler: &mut Scheduler, api: &C, now: DateTime<Utc>) -> ReconcileReport
where
    C: ControlPlane + ?Sized,
{
    let mut report = pull_due(scheduler, api, now).await;
    report.merge(push_results(scheduler, api).await);

    if report != ReconcileReport::default() {
        debug!(?report, "reconcile pass finished");
    }
    report
}

/// Pull tasks once when any scope expired and enqueue the new ones.
///
/// A single `All` pull serves every due scope. Tasks of a registered target
/// whose scope is still fresh are skipped. Tasks of targets this node does
/// not know are kept, so the executor fails them with `TargetNotFound` and
/// the control plane hears about it. Scopes are only marked synced when the
/// pull succeeded.
pub async fn pull_due<C>(scheduler: &mut Scheduler, api: &C, now: DateTime<Utc>) -> ReconcileReport
where
    C: ControlPlane + ?Sized,
{
    let mut report = ReconcileReport::default();

    let due = scheduler.due_scopes(now);
    if due.is_empty() {
        return report;
    }

    let tasks = match api.pull_tasks(TargetScope::All).await {
        Ok(tasks) => tasks,
        Err(e) => {
            let e = match e {
                e @ GamedError::SyncFailure(_) => e,
                other => GamedError::SyncFailure(other.to_string()),
            };
            warn!(scopes = due.len(), error = %e, "pull failed; will retry on next tick");
            report.failures += 1;
            return report;
        }
    };

    report.pulled = tasks.len();
    for task in tasks {
        let target = task.target_id;
        if scheduler.is_tracked(target) {
            if !due.iter().any(|scope| scope.covers(target)) {
                continue;
            }
        } else if !due.contains(&TargetScope::All) {
            debug!(task_id = task.id, target_id = target, "task for unregistered target");
        }
        if scheduler.enqueue(task) == EnqueueOutcome::Added {
            report.enqueued += 1;
        }
    }

    for scope in due {
        scheduler.mark_synced(scope, now);
    }

    if report.enqueued > 0 {
        info!(enqueued = report.enqueued, "new tasks from control plane");
    }
    report
}

/// Push every terminal result; acknowledged tasks are forgotten, the rest
/// stay for the next pass.
pub async fn push_results<C>(scheduler: &mut Scheduler, api: &C) -> ReconcileReport
where
    C: ControlPlane + ?Sized,
{
    let mut report = ReconcileReport::default();

    for task in scheduler.pending_results() {
        let output = task.output.as_deref().unwrap_or_default();
        match api.push_result(task.id, task.status, output).await {
            Ok(()) => {
                scheduler.acknowledge(task.id);
                report.pushed += 1;
            }
            Err(e) => {
                warn!(
                    task_id = task.id,
                    status = %task.status,
                    error = %e,
                    "push failed; result kept for retry"
                );
                report.failures += 1;
            }
        }
    }

    report
}
