// src/task/outcome.rs

use std::fmt;

use crate::task::record::TaskStatus;

/// Why an execution failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The registry has no such target; nothing was spawned.
    TargetNotFound,
    /// Non-zero exit or an unmet post-condition.
    CommandFailed,
    /// The command outlived `command_timeout`.
    ExecutionTimeout,
    /// Reserved verb.
    NotImplemented,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::TargetNotFound => "target not found",
            FailureKind::CommandFailed => "command failed",
            FailureKind::ExecutionTimeout => "execution timeout",
            FailureKind::NotImplemented => "not implemented",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

/// Structured result of one executor invocation.
///
/// The executor never returns errors to the scheduler; everything that can
/// go wrong ends up here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecOutcome {
    /// Exit code of the last process that ran, if any ran.
    pub exit_code: Option<i32>,
    /// Combined stdout/stderr of every process that ran.
    pub output: String,
    pub failure: Option<Failure>,
}

impl ExecOutcome {
    pub fn success(exit_code: Option<i32>, output: String) -> Self {
        Self {
            exit_code,
            output,
            failure: None,
        }
    }

    pub fn failed(
        kind: FailureKind,
        message: impl Into<String>,
        exit_code: Option<i32>,
        output: String,
    ) -> Self {
        Self {
            exit_code,
            output,
            failure: Some(Failure {
                kind,
                message: message.into(),
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.failure.as_ref().map(|f| f.kind)
    }

    /// Terminal status this outcome moves a task to.
    pub fn status(&self) -> TaskStatus {
        if self.is_success() {
            TaskStatus::Done
        } else {
            TaskStatus::Error
        }
    }

    /// Text sent upstream with the task's terminal status.
    ///
    /// Failures lead with the kind, the message and the exit code, followed
    /// by whatever the processes printed.
    pub fn report(&self) -> String {
        let Some(failure) = &self.failure else {
            return self.output.clone();
        };

        let mut report = format!("{}: {}\n", failure.kind, failure.message);
        if let Some(code) = self.exit_code {
            report.push_str(&format!("exit code: {code}\n"));
        }
        if !self.output.is_empty() {
            report.push('\n');
            report.push_str(&self.output);
        }
        report
    }
}
