//! Scripted executor for testing.
//!
//! Records every command and environment installation and serves
//! pre-configured results, so operation logic can be tested without
//! spawning processes.

use crate::error::{ExecutionError, ExecutionResult};
use crate::runner::{CommandResult, Context, ShellExecutor};
use async_trait::async_trait;
use std::collections::HashMap;
use std::ffi::OsString;
use std::io;
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum Scripted {
    Result(CommandResult),
    Cancelled,
    LaunchFailure,
}

/// A test-double that records calls and returns scripted outcomes.
///
/// Commands without a script succeed with empty output.
#[derive(Debug, Default)]
pub struct MockExecutor {
    scripts: HashMap<String, Scripted>,
    executed: Mutex<Vec<String>>,
    env_calls: Vec<Vec<OsString>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `result` whenever `command` runs
    pub fn with_result(mut self, command: &str, result: CommandResult) -> Self {
        self.scripts
            .insert(command.to_string(), Scripted::Result(result));
        self
    }

    pub fn with_exit_code(self, command: &str, exit_code: i32) -> Self {
        self.with_result(
            command,
            CommandResult {
                exit_code,
                ..Default::default()
            },
        )
    }

    pub fn with_output(self, command: &str, stdout: &str, stderr: &str) -> Self {
        self.with_result(
            command,
            CommandResult {
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
                exit_code: 0,
            },
        )
    }

    /// Behave as if the context ended while `command` ran
    pub fn with_cancellation(mut self, command: &str) -> Self {
        self.scripts.insert(command.to_string(), Scripted::Cancelled);
        self
    }

    /// Behave as if the shell could not be started for `command`
    pub fn with_launch_failure(mut self, command: &str) -> Self {
        self.scripts
            .insert(command.to_string(), Scripted::LaunchFailure);
        self
    }

    /// Commands executed so far, in order
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Every environment passed to `add_env`, in order
    pub fn env_calls(&self) -> &[Vec<OsString>] {
        &self.env_calls
    }
}

#[async_trait]
impl ShellExecutor for MockExecutor {
    async fn execute(&self, ctx: &Context, command: &str) -> ExecutionResult<CommandResult> {
        self.executed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(command.to_string());

        if ctx.is_cancelled() {
            return Err(ExecutionError::Cancelled {
                command: command.to_string(),
            });
        }

        match self.scripts.get(command) {
            Some(Scripted::Result(result)) => Ok(result.clone()),
            Some(Scripted::Cancelled) => Err(ExecutionError::Cancelled {
                command: command.to_string(),
            }),
            Some(Scripted::LaunchFailure) => Err(ExecutionError::Launch {
                command: command.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "scripted launch failure"),
            }),
            None => Ok(CommandResult::default()),
        }
    }

    fn add_env(&mut self, env: Vec<OsString>) {
        self.env_calls.push(env);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_records_and_scripts() {
        let mut mock = MockExecutor::new()
            .with_exit_code("false", 1)
            .with_output("echo hi", "hi\n", "");
        mock.add_env(vec!["A=1".into()]);

        let ctx = Context::new();
        assert_eq!(mock.execute(&ctx, "false").await.unwrap().exit_code, 1);
        assert_eq!(mock.execute(&ctx, "echo hi").await.unwrap().stdout, "hi\n");
        assert!(mock.execute(&ctx, "other").await.unwrap().success());

        assert_eq!(mock.executed(), vec!["false", "echo hi", "other"]);
        assert_eq!(mock.env_calls(), &[vec![OsString::from("A=1")]]);
    }

    #[tokio::test]
    async fn test_mock_honors_cancelled_context() {
        let mock = MockExecutor::new();
        let ctx = Context::new();
        ctx.cancel();
        assert!(mock.execute(&ctx, "true").await.unwrap_err().is_cancelled());
    }
}
