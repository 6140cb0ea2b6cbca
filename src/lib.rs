//! devops - A declarative YAML task runner
//!
//! Reads install, test and build operations from a devops-definition.yaml
//! file and runs each operation's shell steps in order, with fail-fast or
//! collect-all failure handling and signal-driven cancellation.

// Public modules
pub mod cli;
pub mod config;
pub mod error;
pub mod runner;
pub mod ui;

// Re-export commonly used types
pub use error::{DevopsError, Result};

/// Current version of devops
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
