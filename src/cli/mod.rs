//! CLI interface and argument parsing
//!
//! This module builds the command tree and dispatches to the install, test,
//! build, doctor and manifest commands.

pub mod app;

// Re-export main types
pub use app::*;
