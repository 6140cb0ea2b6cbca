//! Command execution
//!
//! This module runs one shell command under a [`Context`], capturing stdout
//! and stderr separately and killing the child when the context ends.

use crate::error::{ExecutionError, ExecutionResult};
use crate::runner::environment::parse_entry;
use crate::runner::Context;
use async_trait::async_trait;
use std::ffi::OsString;
use std::io;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// Captured outcome of one executed command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Capability the operation runner needs from an executor
#[async_trait]
pub trait ShellExecutor: Send + Sync {
    /// Run one command line and return its buffered output.
    ///
    /// A nonzero exit is a normal result; only launch failures and
    /// cancellation are errors.
    async fn execute(&self, ctx: &Context, command: &str) -> ExecutionResult<CommandResult>;

    /// Install the `KEY=VALUE` environment used by subsequent commands
    fn add_env(&mut self, env: Vec<OsString>);
}

/// Executor that spawns steps through the context's interpreter
#[derive(Debug, Clone, Default)]
pub struct DefaultExecutor {
    env: Vec<OsString>,
}

impl DefaultExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Environment entries installed by the last `add_env` call
    pub fn env(&self) -> &[OsString] {
        &self.env
    }

    fn build_command(&self, ctx: &Context, command: &str) -> io::Result<Command> {
        let (program, args) = ctx.interpreter.split_first().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "interpreter is empty")
        })?;

        let mut cmd = Command::new(program);
        cmd.args(args)
            .arg(command)
            .current_dir(&ctx.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Without an installed environment the child inherits ours
        if !self.env.is_empty() {
            cmd.env_clear();
            for entry in &self.env {
                if let Some((key, value)) = parse_entry(entry) {
                    cmd.env(key, value);
                }
            }
        }

        // Own process group so cancellation reaches grandchildren too
        #[cfg(unix)]
        cmd.process_group(0);

        Ok(cmd)
    }
}

#[async_trait]
impl ShellExecutor for DefaultExecutor {
    async fn execute(&self, ctx: &Context, command: &str) -> ExecutionResult<CommandResult> {
        if command.trim().is_empty() {
            return Ok(CommandResult::default());
        }
        if ctx.is_cancelled() {
            return Err(cancelled(command));
        }

        let mut child = self
            .build_command(ctx, command)
            .and_then(|mut cmd| cmd.spawn())
            .map_err(|source| ExecutionError::Launch {
                command: command.to_string(),
                source,
            })?;
        debug!(command, pid = child.id(), "spawned step");

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let outcome = tokio::select! {
            res = async { tokio::try_join!(child.wait(), read_pipe(stdout), read_pipe(stderr)) } => res,
            _ = ctx.done() => {
                terminate(&mut child, command).await;
                return Err(cancelled(command));
            }
        };

        let (status, stdout, stderr) = outcome.map_err(|source| ExecutionError::Output {
            command: command.to_string(),
            source,
        })?;

        let exit_code = exit_code(status);
        debug!(command, exit_code, "step finished");

        Ok(CommandResult {
            stdout,
            stderr,
            exit_code,
        })
    }

    fn add_env(&mut self, env: Vec<OsString>) {
        self.env = env;
    }
}

fn cancelled(command: &str) -> ExecutionError {
    ExecutionError::Cancelled {
        command: command.to_string(),
    }
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> io::Result<String> {
    let mut buf = Vec::new();
    if let Some(mut reader) = pipe {
        reader.read_to_end(&mut buf).await?;
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Kill the child's process group, then the child itself, and reap it
async fn terminate(child: &mut Child, command: &str) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        // SAFETY: killpg has no memory-safety preconditions; the group was
        // created by process_group(0) so its id equals the child's pid.
        unsafe {
            libc::killpg(pid as libc::pid_t, libc::SIGKILL);
        }
    }

    if let Err(err) = child.kill().await {
        warn!(command, error = %err, "failed to kill cancelled step");
    }
    debug!(command, "cancelled step terminated");
}

/// Exit code of a finished process; signal deaths map to 128 + signal
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }

    crate::error::ABORTED_EXIT_CODE
}
