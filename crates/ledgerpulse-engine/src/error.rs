//! Error types for ledgerpulse-engine

use ledgerpulse_core::CoreError;
use ledgerpulse_store::StoreError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EngineErrorCode {
    /// Budget or other entity absent
    NotFound,
    /// A store call failed; propagated, never swallowed
    UpstreamFailure,
    /// Internal invariant violated during a computation
    ComputeError,
    /// Cached value failed to encode or decode
    SerializationError,
}

impl std::fmt::Display for EngineErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineErrorCode::NotFound => write!(f, "NOT_FOUND"),
            EngineErrorCode::UpstreamFailure => write!(f, "UPSTREAM_FAILURE"),
            EngineErrorCode::ComputeError => write!(f, "COMPUTE_ERROR"),
            EngineErrorCode::SerializationError => write!(f, "SERIALIZATION_ERROR"),
        }
    }
}

/// Severity levels for engine errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// Main error type for the engine layer
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Upstream store failure: {message}")]
    Upstream { message: String },

    #[error(transparent)]
    Compute(#[from] CoreError),

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl EngineError {
    /// Get the error code
    pub fn code(&self) -> EngineErrorCode {
        match self {
            EngineError::NotFound { .. } => EngineErrorCode::NotFound,
            EngineError::Upstream { .. } => EngineErrorCode::UpstreamFailure,
            EngineError::Compute(_) => EngineErrorCode::ComputeError,
            EngineError::Serialization { .. } => EngineErrorCode::SerializationError,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> EngineErrorSeverity {
        match self {
            EngineError::NotFound { .. } => EngineErrorSeverity::Info,
            EngineError::Upstream { .. } => EngineErrorSeverity::Critical,
            EngineError::Compute(_) => EngineErrorSeverity::Error,
            EngineError::Serialization { .. } => EngineErrorSeverity::Error,
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::BudgetNotFound { id } => EngineError::NotFound {
                resource: format!("budget {}", id),
            },
            other => EngineError::Upstream {
                message: other.to_string(),
            },
        }
    }
}

/// Result type with EngineError
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_mapping() {
        let err: EngineError = StoreError::BudgetNotFound { id: "b-1".to_string() }.into();
        assert_eq!(err.code(), EngineErrorCode::NotFound);
        assert_eq!(err.severity(), EngineErrorSeverity::Info);

        let err: EngineError = StoreError::Unavailable { message: "down".to_string() }.into();
        assert_eq!(err.code(), EngineErrorCode::UpstreamFailure);
        assert_eq!(err.severity(), EngineErrorSeverity::Critical);
    }

    #[test]
    fn test_core_error_wraps_as_compute() {
        let err: EngineError = CoreError::compute("bad invariant").into();
        assert_eq!(err.code(), EngineErrorCode::ComputeError);
    }
}
