//! Error types for field generation and persistence.
//!
//! Only two kinds ever reach the caller: an invalid configuration and a
//! failure to persist the finished field. Stale artifacts are recovered
//! inside the store and non-finite samples are filtered at the threshold
//! step, so neither is fatal.

use std::path::Path;

use thiserror::Error;

/// Errors raised while configuring, building, or persisting a field.
#[derive(Debug, Error)]
pub enum FieldError {
    /// A configuration value would make the build meaningless.
    #[error("Invalid configuration: {field} {reason}")]
    InvalidConfig {
        /// Name of the offending option
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// The finished artifact could not be written.
    #[error("Failed to persist '{path}': {message}")]
    PersistenceFailed {
        /// File that could not be written
        path: String,
        /// Underlying I/O or encoding message
        message: String,
    },

    /// A persisted file exists but cannot be trusted.
    #[error("Stale artifact '{path}': {reason}")]
    StaleArtifact {
        /// File that failed to parse
        path: String,
        /// Why it was rejected
        reason: String,
    },
}

impl FieldError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        FieldError::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn persistence(path: &Path, message: impl ToString) -> Self {
        FieldError::PersistenceFailed {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }

    pub(crate) fn stale(path: &Path, reason: impl ToString) -> Self {
        FieldError::StaleArtifact {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// True for errors that must abort the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, FieldError::StaleArtifact { .. })
    }
}

/// Convenient Result type for field operations.
pub type FieldResult<T> = Result<T, FieldError>;
