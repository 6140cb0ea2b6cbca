//! Step execution engine
//!
//! This module handles running shell steps under a cancellable context,
//! merging operation environments, and driving whole operations.

pub mod command;
pub mod context;
pub mod environment;
pub mod lifecycle;
#[cfg(test)]
pub mod mock;
pub mod operation;

// Re-export main types
pub use command::*;
pub use context::*;
pub use environment::*;
pub use lifecycle::*;
#[cfg(test)]
pub use mock::*;
pub use operation::*;
