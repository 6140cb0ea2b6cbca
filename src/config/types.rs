//! Core definition types
//!
//! This module defines the data structures that represent a devops-definition.yaml file.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Top-level project definition
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProjectDefinition {
    /// Project identifier, required
    #[serde(default)]
    pub id: String,

    /// Human-readable project name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default)]
    pub version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Repository URL
    #[serde(default)]
    pub repo_url: String,

    /// Interpreter used for steps (e.g., ["bash", "-c"])
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interpreter: Option<Vec<String>>,

    #[serde(default)]
    pub codebase: Codebase,
}

impl ProjectDefinition {
    /// Get the operation backing a stage
    pub fn operation(&self, stage: Stage) -> &Operation {
        match stage {
            Stage::Install => &self.codebase.install,
            Stage::Test => &self.codebase.test,
            Stage::Build => &self.codebase.build,
        }
    }
}

/// Codebase section: language, dependencies and the three operations
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Codebase {
    #[serde(default)]
    pub language: String,

    /// Declared dependencies; `None` when the key is absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<String>>,

    #[serde(default)]
    pub install: Operation,

    #[serde(default)]
    pub test: Operation,

    #[serde(default)]
    pub build: Operation,
}

/// An ordered list of shell steps with scoped environment
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Operation {
    /// Stop at the first failing step
    #[serde(default)]
    pub fail_fast: bool,

    /// Environment overrides applied to every step
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,

    #[serde(default, deserialize_with = "deserialize_steps")]
    pub steps: Vec<String>,
}

impl Operation {
    /// Create a collect-all operation from steps
    pub fn new<I, S>(steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Operation {
            fail_fast: false,
            env: HashMap::new(),
            steps: steps.into_iter().map(Into::into).collect(),
        }
    }

    /// Set the fail-fast policy
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Add an environment override
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// The named operations a definition can run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Install,
    Test,
    Build,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::Install, Stage::Test, Stage::Build];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Install => "install",
            Stage::Test => "test",
            Stage::Build => "build",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Custom deserializer for steps that handles both a single string and arrays
fn deserialize_steps<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Error;
    use serde_yaml::Value;

    let value = Value::deserialize(deserializer)?;

    match value {
        Value::String(s) => Ok(vec![s]),
        Value::Sequence(seq) => {
            let mut steps = Vec::new();
            for item in seq {
                match item {
                    Value::String(s) => steps.push(s),
                    other => {
                        return Err(D::Error::custom(format!(
                            "step must be a string, got {:?}",
                            other
                        )))
                    }
                }
            }
            Ok(steps)
        }
        Value::Null => Ok(Vec::new()),
        _ => Err(D::Error::custom("steps must be a string or array")),
    }
}
