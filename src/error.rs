//! Error types for Cascade
//!
//! All modules use `CascadeResult<T>` as their return type. Lookup misses and
//! cache read failures are not errors; only malformed input and genuine IO
//! failures outside the cache reach the caller.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Cascade operations
pub type CascadeResult<T> = Result<T, CascadeError>;

/// All errors that can occur in Cascade
#[derive(Error, Debug)]
pub enum CascadeError {
    // Input errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Position {position} is out of range (search path has {len} roots)")]
    OutOfRange { position: usize, len: usize },

    #[error("Invalid file filter '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("{0}")]
    User(String),
}

impl CascadeError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an invalid argument error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Whether the error was caused by caller input rather than the environment
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument(_) | Self::OutOfRange { .. } | Self::InvalidPattern { .. }
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::OutOfRange { .. } => {
                Some("Position::Index must not exceed the root count; use Position::Append to add last")
            }
            Self::InvalidPattern { .. } => Some("Filters use glob syntax, e.g. '*.toml'"),
            Self::ConfigInvalid { .. } => Some("Run: cascade config show"),
            _ => None,
        }
    }
}
