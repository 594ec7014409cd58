// src/exec/process.rs

//! Owned handle for a spawned command.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::exec::context::ExecContext;
use crate::exec::output::OutputBuffer;

/// Time between SIGTERM and SIGKILL when a process is cancelled.
const KILL_GRACE: Duration = Duration::from_secs(3);

/// How long output readers may keep draining after the process exited.
///
/// A start script that backgrounds the server hands its stdout to the
/// server; collection must not wait for that process to die.
const OUTPUT_DRAIN: Duration = Duration::from_millis(500);

/// Where and as whom a command runs.
#[derive(Debug, Clone, Default)]
pub struct ExecOptions {
    pub work_dir: PathBuf,
    pub user: Option<String>,
    pub env: Vec<(String, String)>,
}

/// How a process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessExit {
    /// Exit code; `128 + signal` for signal deaths, `-1` if unknown.
    pub code: i32,
    pub cancelled: bool,
}

/// A running shell command, in its own process group, whose stdout and
/// stderr are copied into an [`OutputBuffer`].
///
/// Dropping a handle whose process was never reaped kills the whole group.
pub struct SpawnedProcess {
    child: Child,
    pid: Option<u32>,
    readers: Vec<JoinHandle<()>>,
    reaped: bool,
}

impl SpawnedProcess {
    pub fn spawn(command_line: &str, options: &ExecOptions, output: &OutputBuffer) -> Result<Self> {
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(command_line);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(command_line);
            c
        };

        cmd.current_dir(&options.work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        for (key, value) in &options.env {
            cmd.env(key, value);
        }

        #[cfg(unix)]
        cmd.process_group(0);

        if let Some(user) = &options.user {
            crate::exec::privilege::run_as(&mut cmd, user)
                .with_context(|| format!("preparing to run as '{user}'"))?;
        }

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning '{command_line}'"))?;
        let pid = child.id();

        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(copy_into(stdout, output.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(copy_into(stderr, output.clone()));
        }

        debug!(pid, cmd = %command_line, "process spawned");

        Ok(Self {
            child,
            pid,
            readers,
            reaped: false,
        })
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Wait for the process to exit, or terminate it when `ctx` is cancelled.
    pub async fn wait(mut self, ctx: &ExecContext) -> Result<ProcessExit> {
        let (status, cancelled) = tokio::select! {
            status = self.child.wait() => {
                (status.context("waiting for process")?, false)
            }
            _ = ctx.cancelled() => {
                info!(pid = self.pid, "cancellation requested; terminating process group");
                self.terminate().await;
                (self.child.wait().await.context("waiting for cancelled process")?, true)
            }
        };

        self.reaped = true;
        self.drain_readers().await;

        Ok(ProcessExit {
            code: exit_code(&status),
            cancelled,
        })
    }

    async fn terminate(&mut self) {
        self.signal(Signal::Term);

        if tokio::time::timeout(KILL_GRACE, self.child.wait())
            .await
            .is_err()
        {
            warn!(pid = self.pid, "process ignored SIGTERM; killing");
            self.signal(Signal::Kill);
            if let Err(e) = self.child.kill().await {
                warn!(pid = self.pid, error = %e, "failed to kill process");
            }
        }
    }

    async fn drain_readers(&mut self) {
        for handle in self.readers.drain(..) {
            let abort = handle.abort_handle();
            if tokio::time::timeout(OUTPUT_DRAIN, handle).await.is_err() {
                debug!(pid = self.pid, "output pipe still held open; stop collecting");
                abort.abort();
            }
        }
    }

    fn signal(&self, signal: Signal) {
        #[cfg(unix)]
        if let Some(pid) = self.pid {
            let sig = match signal {
                Signal::Term => libc::SIGTERM,
                Signal::Kill => libc::SIGKILL,
            };
            // SAFETY: plain syscall; a negative pid addresses the process
            // group this child leads.
            unsafe {
                libc::kill(-(pid as i32), sig);
            }
        }
        #[cfg(not(unix))]
        let _ = signal;
    }
}

impl Drop for SpawnedProcess {
    fn drop(&mut self) {
        if !self.reaped {
            debug!(pid = self.pid, "dropping unreaped process; killing its group");
            self.signal(Signal::Kill);
        }
        for handle in &self.readers {
            handle.abort();
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Signal {
    Term,
    Kill,
}

fn copy_into<R>(mut reader: R, output: OutputBuffer) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = [0u8; 4096];
        loop {
            match reader.read(&mut buf).await {
                Ok(0) | Err(_) => break,
                Ok(n) => output.write(&buf[..n]),
            }
        }
    })
}

fn exit_code(status: &std::process::ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(sig) = status.signal() {
            return 128 + sig;
        }
    }

    -1
}
