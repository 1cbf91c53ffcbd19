//! Error types for ledgerpulse-core

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CoreErrorCode {
    /// Internal invariant violated during a computation
    ComputeError,
    /// Period is malformed beyond the permissive empty-range policy
    InvalidRange,
}

impl std::fmt::Display for CoreErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreErrorCode::ComputeError => write!(f, "COMPUTE_ERROR"),
            CoreErrorCode::InvalidRange => write!(f, "INVALID_RANGE"),
        }
    }
}

/// Severity levels for core errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoreErrorSeverity {
    Warning,
    Error,
    Critical,
}

/// Main error type for ledgerpulse-core
///
/// A compute error is fatal to the single computation that raised it,
/// never to the process.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Compute error: {message}")]
    Compute { message: String },

    #[error("Invalid range: {message}")]
    InvalidRange { message: String },
}

impl CoreError {
    pub fn compute(message: impl Into<String>) -> Self {
        CoreError::Compute {
            message: message.into(),
        }
    }

    /// Get the error code
    pub fn code(&self) -> CoreErrorCode {
        match self {
            CoreError::Compute { .. } => CoreErrorCode::ComputeError,
            CoreError::InvalidRange { .. } => CoreErrorCode::InvalidRange,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> CoreErrorSeverity {
        match self {
            CoreError::Compute { .. } => CoreErrorSeverity::Error,
            CoreError::InvalidRange { .. } => CoreErrorSeverity::Warning,
        }
    }
}

/// Result type with CoreError
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_and_severity() {
        let err = CoreError::compute("negative allocation");
        assert_eq!(err.code(), CoreErrorCode::ComputeError);
        assert_eq!(err.severity(), CoreErrorSeverity::Error);
        assert!(err.to_string().contains("negative allocation"));
    }
}
