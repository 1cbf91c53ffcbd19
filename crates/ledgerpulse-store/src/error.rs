//! Error types for ledgerpulse-store

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StoreErrorCode {
    /// Budget not found
    BudgetNotFound,
    /// Store backend unreachable or failed
    Unavailable,
    /// Record rejected by the store
    InvalidRecord,
}

impl std::fmt::Display for StoreErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreErrorCode::BudgetNotFound => write!(f, "BUDGET_NOT_FOUND"),
            StoreErrorCode::Unavailable => write!(f, "UNAVAILABLE"),
            StoreErrorCode::InvalidRecord => write!(f, "INVALID_RECORD"),
        }
    }
}

/// Severity levels for store errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// Main error type for store operations
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Budget not found: {id}")]
    BudgetNotFound { id: String },

    #[error("Store unavailable: {message}")]
    Unavailable { message: String },

    #[error("Invalid record: {message}")]
    InvalidRecord { message: String },
}

impl StoreError {
    /// Get the error code
    pub fn code(&self) -> StoreErrorCode {
        match self {
            StoreError::BudgetNotFound { .. } => StoreErrorCode::BudgetNotFound,
            StoreError::Unavailable { .. } => StoreErrorCode::Unavailable,
            StoreError::InvalidRecord { .. } => StoreErrorCode::InvalidRecord,
        }
    }

    /// Get the severity level
    pub fn severity(&self) -> StoreErrorSeverity {
        match self {
            StoreError::BudgetNotFound { .. } => StoreErrorSeverity::Info,
            StoreError::Unavailable { .. } => StoreErrorSeverity::Critical,
            StoreError::InvalidRecord { .. } => StoreErrorSeverity::Warning,
        }
    }
}

/// Result type with StoreError
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(StoreErrorCode::BudgetNotFound.to_string(), "BUDGET_NOT_FOUND");
        assert_eq!(StoreErrorCode::Unavailable.to_string(), "UNAVAILABLE");
    }

    #[test]
    fn test_error_code_and_severity() {
        let err = StoreError::BudgetNotFound { id: "b-1".to_string() };
        assert_eq!(err.code(), StoreErrorCode::BudgetNotFound);
        assert_eq!(err.severity(), StoreErrorSeverity::Info);

        let err = StoreError::Unavailable { message: "timeout".to_string() };
        assert_eq!(err.code(), StoreErrorCode::Unavailable);
        assert_eq!(err.severity(), StoreErrorSeverity::Critical);
    }
}
