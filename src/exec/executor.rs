// src/exec/executor.rs

//! Lifecycle verbs against a single server.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{ConfigFile, ScriptsSection};
use crate::errors::GamedError;
use crate::exec::command::ServerCommand;
use crate::exec::context::ExecContext;
use crate::exec::output::OutputBuffer;
use crate::exec::process::{ExecOptions, ProcessExit, SpawnedProcess};
use crate::exec::template::{render, server_dir};
use crate::registry::{ProcessRegistry, Server};
use crate::task::{ExecOutcome, FailureKind};
use crate::types::TargetId;

/// Everything the executor needs that is shared by all servers.
#[derive(Debug, Clone)]
pub struct ExecutorSettings {
    pub work_path: PathBuf,
    pub scripts: ScriptsSection,
    /// How long `stop` waits for the status probe to report stopped.
    pub stop_grace: Duration,
    pub status_poll_interval: Duration,
}

impl ExecutorSettings {
    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self {
            work_path: PathBuf::from(&cfg.daemon.work_path),
            scripts: cfg.scripts.clone(),
            stop_grace: cfg.daemon.stop_grace,
            status_poll_interval: Duration::from_secs(1),
        }
    }
}

/// Result of one verb before it is folded into an [`ExecOutcome`].
#[derive(Debug)]
enum Step {
    Passed {
        exit_code: Option<i32>,
    },
    Failed {
        kind: FailureKind,
        message: String,
        exit_code: Option<i32>,
    },
}

impl Step {
    fn failed(message: impl Into<String>, exit_code: Option<i32>) -> Self {
        Step::Failed {
            kind: FailureKind::CommandFailed,
            message: message.into(),
            exit_code,
        }
    }

    fn not_implemented(message: impl Into<String>) -> Self {
        Step::Failed {
            kind: FailureKind::NotImplemented,
            message: message.into(),
            exit_code: None,
        }
    }

    fn from_exit(what: &str, exit: ProcessExit) -> Self {
        if exit.cancelled {
            Step::failed(format!("{what} was cancelled"), Some(exit.code))
        } else if exit.code != 0 {
            Step::failed(
                format!("{what} exited with code {}", exit.code),
                Some(exit.code),
            )
        } else {
            Step::Passed {
                exit_code: Some(exit.code),
            }
        }
    }

    fn is_passed(&self) -> bool {
        matches!(self, Step::Passed { .. })
    }
}

/// Runs one [`ServerCommand`] against one server.
///
/// All processes the executor starts write into the same output buffer, so
/// the report of a `restart` contains its `stop` and `start` steps in order.
pub struct CommandExecutor {
    command: ServerCommand,
    server: Arc<Server>,
    settings: Arc<ExecutorSettings>,
    output: OutputBuffer,
}

impl CommandExecutor {
    /// Resolve the target. Fails with [`GamedError::TargetNotFound`] when
    /// the registry doesn't know it.
    pub fn new(
        command: ServerCommand,
        target_id: TargetId,
        registry: &dyn ProcessRegistry,
        settings: Arc<ExecutorSettings>,
    ) -> Result<Self, GamedError> {
        let server = registry
            .resolve(target_id)
            .ok_or(GamedError::TargetNotFound(target_id))?;

        Ok(Self {
            command,
            server,
            settings,
            output: OutputBuffer::new(),
        })
    }

    pub fn command(&self) -> ServerCommand {
        self.command
    }

    pub fn server(&self) -> &Server {
        &self.server
    }

    /// Run the command to completion. Never fails; errors are folded into
    /// the returned outcome.
    pub async fn execute(self, ctx: &ExecContext) -> ExecOutcome {
        info!(
            target_id = self.server.id,
            command = %self.command,
            "executing server command"
        );

        let step = match self.run_command(ctx).await {
            Ok(step) => step,
            Err(e) => {
                warn!(
                    target_id = self.server.id,
                    command = %self.command,
                    error = %format!("{e:#}"),
                    "server command errored"
                );
                Step::failed(format!("{e:#}"), None)
            }
        };

        let output = self.output.contents();
        match step {
            Step::Passed { exit_code } => ExecOutcome::success(exit_code, output),
            Step::Failed {
                kind,
                message,
                exit_code,
            } => ExecOutcome::failed(kind, message, exit_code, output),
        }
    }

    async fn run_command(&self, ctx: &ExecContext) -> Result<Step> {
        match self.command {
            ServerCommand::Start => self.start(ctx).await,
            ServerCommand::Stop => self.stop(ctx).await,
            ServerCommand::Restart => self.restart(ctx).await,
            ServerCommand::Status => self.status(ctx).await,
            ServerCommand::Update => self.update(ctx).await,
            ServerCommand::Delete => self.delete(ctx).await,
            ServerCommand::Pause
            | ServerCommand::Unpause
            | ServerCommand::Kill
            | ServerCommand::Install
            | ServerCommand::Reinstall => Ok(Step::not_implemented(format!(
                "'{}' is not implemented",
                self.command
            ))),
        }
    }

    async fn start(&self, ctx: &ExecContext) -> Result<Step> {
        if self.probe(ctx).await? == Some(true) {
            return Ok(Step::failed("server is already running", None));
        }

        let line = self.render(&self.settings.scripts.start, &self.server.start_command);
        let exit = self.run_line(&line, ctx).await?;
        let step = Step::from_exit("start command", exit);
        if !step.is_passed() {
            return Ok(step);
        }

        if self.probe(ctx).await? == Some(false) {
            return Ok(Step::failed(
                "server is not running after start",
                Some(exit.code),
            ));
        }

        Ok(step)
    }

    async fn stop(&self, ctx: &ExecContext) -> Result<Step> {
        let line = self.render(&self.settings.scripts.stop, &self.server.stop_command);
        let exit = self.run_line(&line, ctx).await?;
        let step = Step::from_exit("stop command", exit);
        if !step.is_passed() {
            return Ok(step);
        }

        if self.wait_stopped(ctx).await? {
            return Ok(step);
        }

        if self.server.force_stop_command.trim().is_empty() {
            return Ok(Step::failed(
                format!(
                    "server did not stop within {}s",
                    self.settings.stop_grace.as_secs()
                ),
                Some(exit.code),
            ));
        }

        warn!(
            target_id = self.server.id,
            "server still running after grace period; forcing stop"
        );
        let line = self.render("{command}", &self.server.force_stop_command);
        let exit = self.run_line(&line, ctx).await?;
        let step = Step::from_exit("force stop command", exit);
        if !step.is_passed() {
            return Ok(step);
        }

        if self.probe(ctx).await? == Some(true) {
            return Ok(Step::failed(
                "server is still running after force stop",
                Some(exit.code),
            ));
        }

        Ok(step)
    }

    async fn restart(&self, ctx: &ExecContext) -> Result<Step> {
        let line = self.render(
            &self.settings.scripts.restart,
            &self.server.restart_command,
        );
        if !line.is_empty() {
            let exit = self.run_line(&line, ctx).await?;
            return Ok(Step::from_exit("restart command", exit));
        }

        if self.probe(ctx).await? != Some(false) {
            let step = self.stop(ctx).await?;
            if !step.is_passed() {
                return Ok(step);
            }
        }

        self.start(ctx).await
    }

    async fn status(&self, ctx: &ExecContext) -> Result<Step> {
        let line = self.render(&self.settings.scripts.status, "");
        if line.is_empty() {
            return Ok(Step::not_implemented("no status script configured"));
        }

        let exit = self.run_line(&line, ctx).await?;
        if exit.code == 0 {
            Ok(Step::Passed {
                exit_code: Some(exit.code),
            })
        } else {
            Ok(Step::failed("server is not running", Some(exit.code)))
        }
    }

    async fn update(&self, ctx: &ExecContext) -> Result<Step> {
        let line = self.render(&self.settings.scripts.update, "");
        if line.is_empty() {
            return Ok(Step::not_implemented("no update script configured"));
        }

        let exit = self.run_line(&line, ctx).await?;
        Ok(Step::from_exit("update command", exit))
    }

    async fn delete(&self, ctx: &ExecContext) -> Result<Step> {
        let line = self.render(&self.settings.scripts.delete, "");
        if !line.is_empty() {
            let exit = self.run_line(&line, ctx).await?;
            return Ok(Step::from_exit("delete command", exit));
        }

        let dir = self.dir();
        if dir == self.settings.work_path {
            bail!("refusing to remove the work path {}", dir.display());
        }

        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {
                info!(target_id = self.server.id, dir = %dir.display(), "server directory removed");
                self.output
                    .write_str(&format!("removed {}\n", dir.display()));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.output
                    .write_str(&format!("{} does not exist\n", dir.display()));
            }
            Err(e) => {
                return Err(e).with_context(|| format!("removing {}", dir.display()));
            }
        }

        Ok(Step::Passed { exit_code: None })
    }

    /// Run the status script into a scratch buffer.
    ///
    /// `None` when no status script is configured.
    async fn probe(&self, ctx: &ExecContext) -> Result<Option<bool>> {
        let line = self.render(&self.settings.scripts.status, "");
        if line.is_empty() {
            return Ok(None);
        }

        let scratch = OutputBuffer::new();
        let exit = self.spawn_and_wait(&line, ctx, &scratch).await?;
        if exit.cancelled {
            bail!("status check was cancelled");
        }
        let running = exit.code == 0;

        debug!(
            target_id = self.server.id,
            exit_code = exit.code,
            running,
            "status probe"
        );
        self.output.write_str(if running {
            "status: running\n"
        } else {
            "status: stopped\n"
        });

        Ok(Some(running))
    }

    /// Poll the status probe until it reports stopped or `stop_grace` runs out.
    async fn wait_stopped(&self, ctx: &ExecContext) -> Result<bool> {
        let deadline = Instant::now() + self.settings.stop_grace;

        loop {
            match self.probe(ctx).await? {
                None | Some(false) => return Ok(true),
                Some(true) => {}
            }

            if Instant::now() >= deadline {
                return Ok(false);
            }

            tokio::select! {
                _ = tokio::time::sleep(self.settings.status_poll_interval) => {}
                _ = ctx.cancelled() => bail!("cancelled while waiting for the server to stop"),
            }
        }
    }

    /// Run a command line with the usual framing written to the output.
    async fn run_line(&self, line: &str, ctx: &ExecContext) -> Result<ProcessExit> {
        if line.is_empty() {
            bail!("empty command");
        }
        ensure_not_cancelled(ctx)?;

        let dir = self.dir();
        self.output
            .write_str(&format!("{}# {}\n\n", dir.display(), line));

        let exit = self.spawn_and_wait(line, ctx, &self.output).await?;

        self.output
            .write_str(&format!("\nExited with {}\n", exit.code));
        Ok(exit)
    }

    async fn spawn_and_wait(
        &self,
        line: &str,
        ctx: &ExecContext,
        sink: &OutputBuffer,
    ) -> Result<ProcessExit> {
        if line.is_empty() {
            bail!("empty command");
        }
        ensure_not_cancelled(ctx)?;

        let dir = self.dir();
        if !dir.is_dir() {
            bail!("server directory {} does not exist", dir.display());
        }

        let options = ExecOptions {
            work_dir: dir,
            user: self.server.user.clone(),
            env: Vec::new(),
        };

        let process = SpawnedProcess::spawn(line, &options, sink)?;
        if let Some(pid) = process.pid() {
            ctx.report_spawn(pid).await;
        }

        let exit = process.wait(ctx).await?;
        debug!(
            task_id = ?ctx.task_id(),
            target_id = self.server.id,
            exit_code = exit.code,
            cancelled = exit.cancelled,
            "process finished"
        );
        Ok(exit)
    }

    fn render(&self, template: &str, verb_command: &str) -> String {
        render(template, verb_command, &self.server, &self.settings.work_path)
    }

    fn dir(&self) -> PathBuf {
        server_dir(&self.settings.work_path, &self.server)
    }
}

/// Nothing is spawned once cancellation was requested.
fn ensure_not_cancelled(ctx: &ExecContext) -> Result<()> {
    if ctx.is_cancelled() {
        bail!("cancelled before spawning");
    }
    Ok(())
}
