//! Execution context for step running
//!
//! The context carries the cancellation token, an optional deadline, and the
//! settings every spawned step shares (interpreter and working directory).

use std::env;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Execution context passed by reference through every step
#[derive(Debug, Clone)]
pub struct Context {
    /// Current working directory for spawned steps
    pub working_dir: PathBuf,

    /// Interpreter prefix (e.g., ["sh", "-c"])
    pub interpreter: Vec<String>,

    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// Create a new root context with default settings
    pub fn new() -> Self {
        Context {
            working_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            interpreter: vec!["sh".to_string(), "-c".to_string()],
            cancel: CancellationToken::new(),
            deadline: None,
        }
    }

    /// Use an externally owned cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Set a deadline relative to now; an earlier existing deadline is kept
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        });
        self
    }

    /// Create a context with a specific working directory
    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = dir;
        self
    }

    /// Set the interpreter
    pub fn with_interpreter(mut self, interpreter: Vec<String>) -> Self {
        self.interpreter = interpreter;
        self
    }

    /// Derive a context whose cancellation follows this one but can also be
    /// cancelled on its own
    pub fn child(&self) -> Self {
        Context {
            working_dir: self.working_dir.clone(),
            interpreter: self.interpreter.clone(),
            cancel: self.cancel.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// True once the token is cancelled or the deadline has passed
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Resolves when the context is cancelled or its deadline is reached
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.cancel.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.cancel.cancelled().await,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
