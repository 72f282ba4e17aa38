//! Error types for rune-compose

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for rune-compose operations
pub type Result<T> = std::result::Result<T, RuneError>;

/// Result type for translating a compose document
pub type ComposeResult<T> = std::result::Result<T, ComposeError>;

/// Top level errors, one per stage of loading a compose file
#[derive(Error, Debug)]
pub enum RuneError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Compose file not found in {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid compose file: {0}")]
    Compose(#[from] ComposeError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RuneError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        match self {
            RuneError::Read { .. } | RuneError::NotFound(_) => 1,
            RuneError::Yaml(_) => 2,
            RuneError::Compose(_) | RuneError::Json(_) => 3,
        }
    }
}

/// Why a value in a compose document was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Cause {
    /// The value is not the expected kind of container or scalar
    #[error("{0}")]
    Shape(String),

    /// The value has the right shape but a leaf could not be converted
    #[error("{0}")]
    Coercion(String),

    /// The value converted but breaks a domain rule
    #[error("{0}")]
    Validation(String),

    /// The `version` key is malformed or out of range
    #[error("{0}")]
    Version(String),
}

/// A translation error located by the path of keys that led to it.
///
/// Each layer of the translator prepends its own key with [`ComposeError::at`],
/// so an error raised deep inside a service renders as
/// `services.web.ports: 0 should be a number`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct ComposeError {
    path: Vec<String>,
    cause: Cause,
}

impl ComposeError {
    fn new(cause: Cause) -> Self {
        Self {
            path: Vec::new(),
            cause,
        }
    }

    pub fn shape(message: impl Into<String>) -> Self {
        Self::new(Cause::Shape(message.into()))
    }

    pub fn coercion(message: impl Into<String>) -> Self {
        Self::new(Cause::Coercion(message.into()))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(Cause::Validation(message.into()))
    }

    pub fn version(message: impl Into<String>) -> Self {
        Self::new(Cause::Version(message.into()))
    }

    /// A raw value could not be assigned to a typed slot
    pub fn mismatch(key: &str, type_name: &str) -> Self {
        Self::shape(format!("{} should be type {}", key, type_name))
    }

    /// Prepend a path segment
    pub fn at(mut self, segment: impl Into<String>) -> Self {
        self.path.insert(0, segment.into());
        self
    }

    /// Keys leading to the offending value, outermost first
    pub fn path(&self) -> &[String] {
        &self.path
    }

    pub fn cause(&self) -> &Cause {
        &self.cause
    }
}

impl fmt::Display for ComposeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.cause)
        } else {
            write!(f, "{}: {}", self.path.join("."), self.cause)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_renders_dotted() {
        let err = ComposeError::coercion("0 should be a number")
            .at("ports")
            .at("web")
            .at("services");

        assert_eq!(err.path(), ["services", "web", "ports"]);
        assert_eq!(err.to_string(), "services.web.ports: 0 should be a number");
    }

    #[test]
    fn test_mismatch_names_key() {
        let err = ComposeError::mismatch("hostname", "string");
        assert_eq!(err.to_string(), "hostname should be type string");
        assert!(matches!(err.cause(), Cause::Shape(_)));
    }

    #[test]
    fn test_exit_codes() {
        let yaml = serde_yaml::from_str::<serde_yaml::Value>("a: [").unwrap_err();
        assert_eq!(RuneError::Yaml(yaml).exit_code(), 2);
        assert_eq!(
            RuneError::Compose(ComposeError::version("Incorrect version")).exit_code(),
            3
        );
        assert_eq!(RuneError::NotFound(PathBuf::from(".")).exit_code(), 1);
    }
}
