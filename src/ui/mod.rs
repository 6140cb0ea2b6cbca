//! Terminal output helpers
//!
//! Colored status lines, severity markers and separators shared by the
//! operation runner and the definition validator.

pub mod output;

pub use output::*;
