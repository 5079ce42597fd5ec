//! Application error type

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Application error with structured error code and details
///
/// This is the error callers of the compras core see, providing:
/// - Standardized error codes via [`ErrorCode`]
/// - Human-readable messages
/// - Optional structured details for debugging
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details (stage, key, context)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add a detail entry to this error
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    /// Whether the failed operation may be retried as a whole
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }

    // ==================== Convenience constructors ====================

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }
}

/// Result alias for operations returning [`AppError`]
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_default_message() {
        let err = AppError::new(ErrorCode::TaxConfigUnavailable);
        assert_eq!(err.message, "Could not retrieve tax configuration");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_with_detail_accumulates() {
        let err = AppError::with_message(ErrorCode::NumberingFailed, "lock timeout")
            .with_detail("document_type", "MEMO")
            .with_detail("year", 2024);
        let details = err.details.as_ref().unwrap();
        assert_eq!(details.get("document_type"), Some(&Value::from("MEMO")));
        assert_eq!(details.get("year"), Some(&Value::from(2024)));
        assert_eq!(err.to_string(), "lock timeout");
    }

    #[test]
    fn test_serializes_without_empty_details() {
        let json = serde_json::to_value(AppError::new(ErrorCode::DatabaseError)).unwrap();
        assert_eq!(json["code"], 9002);
        assert!(json.get("details").is_none());
    }
}
