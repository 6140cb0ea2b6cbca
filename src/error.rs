//! Error types for devops

use crate::config::Stage;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for devops operations
pub type Result<T> = std::result::Result<T, DevopsError>;

/// Exit code reserved for commands that never ran to completion
pub const ABORTED_EXIT_CODE: i32 = -1;

/// Main error type for devops
#[derive(Error, Debug)]
pub enum DevopsError {
    /// Definition loading errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Step execution errors
    #[error("{0}")]
    Execution(#[from] ExecutionError),

    /// Definition validation verdict
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON rendering errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Definition discovery and decoding errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to find definition file (searched: {0})")]
    NotFound(String),

    #[error("Invalid definition: {0}")]
    Invalid(String),

    #[error("Failed to read definition '{path}': {error}")]
    Unreadable { path: PathBuf, error: String },
}

/// Step execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// The shell could not be started for this command
    #[error("failed to launch '{command}': {source}")]
    Launch {
        command: String,
        #[source]
        source: io::Error,
    },

    /// The context was cancelled or its deadline passed before the command exited
    #[error("command '{command}' was cancelled")]
    Cancelled { command: String },

    /// Waiting on the child or reading its pipes failed
    #[error("failed to collect output of '{command}': {source}")]
    Output {
        command: String,
        #[source]
        source: io::Error,
    },

    /// A fail-fast step exited nonzero
    #[error("error while running '{command}' (exit code {exit_code})")]
    CommandFailed { command: String, exit_code: i32 },

    /// Collect-all run finished with failed steps
    #[error("failed to run steps: [{}]", .0.join(", "))]
    StepsFailed(Vec<String>),

    /// Failure of a whole stage (install, test, build)
    #[error("failed to run {stage} steps: {source}")]
    Stage {
        stage: Stage,
        #[source]
        source: Box<ExecutionError>,
    },
}

impl ExecutionError {
    /// Exit code associated with this error.
    ///
    /// Launch, capture and cancellation failures report [`ABORTED_EXIT_CODE`].
    pub fn exit_code(&self) -> i32 {
        match self {
            ExecutionError::CommandFailed { exit_code, .. } => *exit_code,
            ExecutionError::Stage { source, .. } => source.exit_code(),
            ExecutionError::StepsFailed(_) => 1,
            _ => ABORTED_EXIT_CODE,
        }
    }

    /// Whether this error came from cancellation, directly or wrapped in a stage
    pub fn is_cancelled(&self) -> bool {
        match self {
            ExecutionError::Cancelled { .. } => true,
            ExecutionError::Stage { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }
}

/// Definition validation verdict
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("found {} required {}", .0, fix_noun(.0))]
    RequiredFixes(usize),
}

fn fix_noun(count: &usize) -> &'static str {
    if *count == 1 {
        "fix"
    } else {
        "fixes"
    }
}

/// Specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Specialized result type for execution operations
pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;
