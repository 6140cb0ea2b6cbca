//! Project manifest generation

use crate::config::types::ProjectDefinition;
use crate::error::DevopsError;
use serde::{Deserialize, Serialize};

/// Summary of a project definition, rendered as JSON
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Manifest {
    pub id: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub repo_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<Vec<String>>,
}

impl Manifest {
    pub fn from_definition(definition: &ProjectDefinition) -> Self {
        Manifest {
            id: definition.id.clone(),
            version: definition.version.clone(),
            repo_url: definition.repo_url.clone(),
            dependencies: definition.codebase.dependencies.clone(),
        }
    }

    /// Render as indented JSON
    pub fn to_json(&self) -> Result<String, DevopsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
