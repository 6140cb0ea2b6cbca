//! Definition validation
//!
//! Sweeps every field of a [`ProjectDefinition`] and classifies it as present,
//! absent-but-optional, or absent-and-required. The sweep never stops early;
//! the verdict is computed only once the report is complete.

use crate::config::types::{Operation, ProjectDefinition, Stage};
use crate::error::ValidationError;
use crate::ui::{print_colored_to, print_status_to, print_wide_line_to, Severity};
use colored::Color;
use regex::Regex;
use std::io::{self, Write};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::info;

/// IDs must be strictly shorter than this many characters
pub const MAX_ID_LENGTH: usize = 30;

/// A single classified line of the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub severity: Severity,
    pub message: String,
}

/// Outcome of validating a definition
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub entries: Vec<ReportEntry>,
    pub fixes: Vec<String>,
    pub suggestions: Vec<String>,
}

impl ValidationReport {
    fn pass(&mut self, message: String) {
        self.push(Severity::Pass, message);
    }

    fn warn(&mut self, message: &str, suggestion: &str) {
        self.push(Severity::Warning, message.to_string());
        self.suggestions.push(suggestion.to_string());
    }

    fn fix(&mut self, message: String, fix: &str) {
        self.push(Severity::FixRequired, message);
        self.fixes.push(fix.to_string());
    }

    fn push(&mut self, severity: Severity, message: String) {
        self.entries.push(ReportEntry { severity, message });
    }

    /// True iff no required fix was found
    pub fn is_ok(&self) -> bool {
        self.fixes.is_empty()
    }

    /// Entries of one severity, in report order
    pub fn entries_with(&self, severity: Severity) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(move |e| e.severity == severity)
    }

    pub fn verdict(&self) -> Result<(), ValidationError> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(ValidationError::RequiredFixes(self.fixes.len()))
        }
    }

    /// Write the report: status lines, a separator, then suggestions and fixes
    pub fn render<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        for entry in &self.entries {
            print_status_to(w, entry.severity, &entry.message)?;
        }

        print_wide_line_to(w, '=')?;
        if !self.suggestions.is_empty() {
            print_colored_to(w, Color::Yellow, "Suggestions:")?;
            for suggestion in &self.suggestions {
                print_colored_to(w, Color::Yellow, &format!("  - {}", suggestion))?;
            }
        }
        if !self.fixes.is_empty() {
            print_colored_to(w, Color::Red, "Fixes:")?;
            for fix in &self.fixes {
                print_colored_to(w, Color::Red, &format!("  - {}", fix))?;
            }
        }
        Ok(())
    }
}

/// Build the report for a definition
pub fn validate(definition: &ProjectDefinition) -> ValidationReport {
    let mut report = ValidationReport::default();
    let codebase = &definition.codebase;

    if definition.id.is_empty() {
        report.fix("ID is required".to_string(), "Set an ID for the project");
    } else if let Err(rule) = validate_project_id(&definition.id) {
        report.fix(
            format!("Invalid ID: {}", rule),
            "Use a valid project ID (alphanumeric/dashes/underscores, starts with letter, no whitespace, under 30 chars)",
        );
    } else {
        report.pass(format!("ID: {}", definition.id));
    }

    if let Some(name) = definition.name.as_deref().filter(|n| !n.is_empty()) {
        report.pass(format!("Name: {}", name));
    }
    if !definition.version.is_empty() {
        report.pass(format!("Version: {}", definition.version));
    }
    if let Some(description) = definition.description.as_deref().filter(|d| !d.is_empty()) {
        report.pass(format!("Description: {}", description));
    }

    if definition.repo_url.is_empty() {
        report.warn(
            "No repository URL defined",
            "Set a repository URL for the project",
        );
    } else {
        report.pass(format!("Repository URL: {}", definition.repo_url));
    }

    if codebase.language.is_empty() {
        report.fix(
            "Language is required".to_string(),
            "Set a language in the codebase",
        );
    } else {
        report.pass(format!("Language: {}", codebase.language));
    }

    match &codebase.dependencies {
        Some(deps) => report.pass(format!("Dependencies: [{}]", deps.join(", "))),
        None => report.warn(
            "No dependencies defined",
            "Declare the dependencies of the codebase",
        ),
    }

    // Install steps are optional and only reported when present
    if !codebase.install.is_empty() {
        report.pass(step_count(Stage::Install, &codebase.install));
    }

    for stage in [Stage::Test, Stage::Build] {
        let operation = definition.operation(stage);
        if operation.is_empty() {
            report.warn(
                &format!("No {} steps defined", stage),
                &format!("Set {} steps in the codebase", stage),
            );
        } else {
            report.pass(step_count(stage, operation));
        }
    }

    report
}

fn step_count(stage: Stage, operation: &Operation) -> String {
    let label = stage.as_str();
    let mut chars = label.chars();
    let capitalized = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
    };
    format!("{} steps ({})", capitalized, operation.steps.len())
}

/// Validate a definition, writing the report to `w`.
///
/// Returns an error naming the count of required fixes when any were found.
pub fn validate_to<W: Write + ?Sized>(
    definition: &ProjectDefinition,
    w: &mut W,
) -> crate::Result<()> {
    let report = validate(definition);
    report.render(w)?;
    report.verdict()?;

    info!("Project definition validated successfully");
    Ok(())
}

/// A violated project ID rule
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdRuleViolation {
    #[error("ID must be under 30 characters (current: {0})")]
    TooLong(usize),

    #[error("ID cannot be empty")]
    Empty,

    #[error("ID must start with a letter")]
    FirstCharNotLetter,

    #[error("ID cannot contain whitespace")]
    ContainsWhitespace,

    #[error("ID can only contain letters, numbers, dashes, and underscores")]
    InvalidCharacters,
}

fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9_-]*$").expect("ID pattern is valid"))
}

/// Check a project ID against the format rules.
///
/// Rules are checked in order (length, emptiness, first character, whitespace,
/// character set) and the first violation is returned.
pub fn validate_project_id(id: &str) -> Result<(), IdRuleViolation> {
    // Length is measured in bytes
    let length = id.len();
    if length >= MAX_ID_LENGTH {
        return Err(IdRuleViolation::TooLong(length));
    }

    let first = id.chars().next().ok_or(IdRuleViolation::Empty)?;
    if !first.is_alphabetic() {
        return Err(IdRuleViolation::FirstCharNotLetter);
    }

    if id.chars().any(char::is_whitespace) {
        return Err(IdRuleViolation::ContainsWhitespace);
    }

    if !id_pattern().is_match(id) {
        return Err(IdRuleViolation::InvalidCharacters);
    }

    Ok(())
}
