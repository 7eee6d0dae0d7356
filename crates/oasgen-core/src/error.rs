//! Error types for oasgen.
//!
//! Every failure during a generation run is fatal: the first error aborts the run
//! and no partial document is written.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the generator.
#[derive(Debug, Error)]
pub enum GeneratorError {
    // Registry errors
    #[error("A bean named '{name}' is already registered")]
    DuplicateName { name: String },

    #[error("No bean named '{name}' is registered")]
    NotFound { name: String },

    #[error("Bean '{name}' is of type {actual}, which is not assignable to {expected}")]
    TypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    // Type loading errors
    #[error("Unable to resolve type {identifier}: {message}")]
    ClassResolution {
        identifier: String,
        /// Manifest file the type was expected in, if any
        path: Option<PathBuf>,
        message: String,
    },

    // Container contract errors
    #[error("Operation '{operation}' is not supported by the generation container")]
    NotSupported { operation: String },

    // Metadata errors
    #[error("Failed to override {tag}.{attribute} on {owner}: {message}")]
    Patch {
        owner: String,
        tag: String,
        attribute: String,
        message: String,
    },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Validation error for {field}: {message}")]
    Validation { field: String, message: String },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for generator operations.
pub type Result<T> = std::result::Result<T, GeneratorError>;

impl From<std::io::Error> for GeneratorError {
    fn from(err: std::io::Error) -> Self {
        GeneratorError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for GeneratorError {
    fn from(err: serde_json::Error) -> Self {
        GeneratorError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl GeneratorError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        GeneratorError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Create a class resolution error for an identifier.
    pub fn unresolved(identifier: impl Into<String>, message: impl Into<String>) -> Self {
        GeneratorError::ClassResolution {
            identifier: identifier.into(),
            path: None,
            message: message.into(),
        }
    }

    /// Short, stable name of the error kind, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            GeneratorError::DuplicateName { .. } => "duplicate_name",
            GeneratorError::NotFound { .. } => "not_found",
            GeneratorError::TypeMismatch { .. } => "type_mismatch",
            GeneratorError::ClassResolution { .. } => "class_resolution",
            GeneratorError::NotSupported { .. } => "not_supported",
            GeneratorError::Patch { .. } => "patch",
            GeneratorError::Io { .. } => "io",
            GeneratorError::Json { .. } => "json",
            GeneratorError::Config { .. } | GeneratorError::Validation { .. } => "config",
            GeneratorError::Other(_) => "other",
        }
    }

    /// Whether the error comes from the registry or the container contract rather
    /// than from the environment (filesystem, configuration).
    pub fn is_container_error(&self) -> bool {
        matches!(
            self,
            GeneratorError::DuplicateName { .. }
                | GeneratorError::NotFound { .. }
                | GeneratorError::TypeMismatch { .. }
                | GeneratorError::NotSupported { .. }
        )
    }
}
