//! Definition file discovery and loading

use crate::config::types::ProjectDefinition;
use crate::error::{ConfigError, ConfigResult, DevopsError};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Definition file names to search for
pub const DEFINITION_FILE_NAMES: &[&str] = &["devops-definition.yaml", "devops-definition.yml"];

/// Find the definition file by searching current and parent directories
pub fn find_definition_file() -> ConfigResult<PathBuf> {
    find_definition_file_from(env::current_dir().map_err(|e| {
        ConfigError::Invalid(format!("Failed to get current directory: {}", e))
    })?)
}

/// Find the definition file starting from a specific directory
pub fn find_definition_file_from(start_dir: PathBuf) -> ConfigResult<PathBuf> {
    let mut current_dir = start_dir;
    let mut searched_paths = Vec::new();

    loop {
        for file_name in DEFINITION_FILE_NAMES {
            let candidate = current_dir.join(file_name);
            searched_paths.push(candidate.display().to_string());

            if candidate.is_file() {
                return Ok(candidate);
            }
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => return Err(ConfigError::NotFound(searched_paths.join(", "))),
        }
    }
}

/// Load a definition from a path
pub fn load_definition_file(path: &Path) -> Result<ProjectDefinition, DevopsError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;

    load_definition(&contents)
}

/// Load a definition from a YAML string
pub fn load_definition(yaml: &str) -> Result<ProjectDefinition, DevopsError> {
    if yaml.trim().is_empty() {
        return Err(ConfigError::Invalid("definition file is empty".to_string()).into());
    }
    let definition: ProjectDefinition = serde_yaml::from_str(yaml)?;
    Ok(definition)
}

/// Load a definition with automatic file discovery
pub fn load_definition_auto() -> Result<(ProjectDefinition, PathBuf), DevopsError> {
    let path = find_definition_file()?;
    let definition = load_definition_file(&path)?;
    Ok((definition, path))
}
