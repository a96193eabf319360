//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Recorded events could not be parsed
    #[error("Failed to parse events file {path}: {message}")]
    EventsParse { path: String, message: String },

    /// Recorded batch names a sub-HAL the configuration does not have
    #[error("Unknown sub-hal '{name}' in events file")]
    UnknownSubHal { name: String },

    /// Replay finished with wake lock contract violations
    #[error("{count} wake lock invariant violation(s) during replay")]
    InvariantViolations { count: u64 },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn events_parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EventsParse {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn unknown_sub_hal(name: impl Into<String>) -> Self {
        Self::UnknownSubHal { name: name.into() }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
