//! Definition loading and validation
//!
//! This module handles loading devops-definition.yaml files, validating
//! their structure, and rendering the project manifest.

pub mod manifest;
pub mod parse;
pub mod schema;
pub mod types;

// Re-export main types
pub use manifest::*;
pub use parse::*;
pub use schema::*;
pub use types::*;
