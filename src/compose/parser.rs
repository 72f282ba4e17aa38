//! Compose file loading

use super::stack::Stack;
use crate::error::{Result, RuneError};
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default compose file names, in lookup order
pub const DEFAULT_COMPOSE_FILES: &[&str] = &[
    "compose.yaml",
    "compose.yml",
    "docker-compose.yaml",
    "docker-compose.yml",
];

/// Compose file parser
pub struct ComposeParser;

impl ComposeParser {
    /// Find compose file in directory
    pub fn find_compose_file(dir: &Path) -> Option<PathBuf> {
        DEFAULT_COMPOSE_FILES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Parse compose file from path into a YAML tree
    pub fn parse_file(path: &Path) -> Result<Value> {
        debug!(path = %path.display(), "Reading compose file");
        let content = std::fs::read_to_string(path).map_err(|source| RuneError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse_str(&content)
    }

    /// Parse compose file from string into a YAML tree
    pub fn parse_str(content: &str) -> Result<Value> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Read and translate a compose file
    pub fn load_file(path: &Path) -> Result<Stack> {
        let document = Self::parse_file(path)?;
        Ok(Stack::new(&document)?)
    }

    /// Translate compose text
    pub fn load_str(content: &str) -> Result<Stack> {
        let document = Self::parse_str(content)?;
        Ok(Stack::new(&document)?)
    }
}
