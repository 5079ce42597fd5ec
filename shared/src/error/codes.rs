//! Unified error codes for compras
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Order errors
//! - 5xxx: Document numbering errors
//! - 6xxx: Settings errors
//! - 7xxx: Master data errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Monetary computation failed (overflow)
    OrderAmountOverflow = 4002,
    /// Order could not be persisted
    OrderPersistFailed = 4003,
    /// Order creation aborted by an unexpected fault
    OrderCreationAborted = 4004,

    // ==================== 5xxx: Numbering ====================
    /// Document number could not be generated
    NumberingFailed = 5001,
    /// Document number has an invalid format
    InvalidDocumentNumber = 5002,
    /// Counter exhausted its integer range
    CounterExhausted = 5003,

    // ==================== 6xxx: Settings ====================
    /// Tax configuration could not be retrieved
    TaxConfigUnavailable = 6001,
    /// Stored tax configuration is not a number
    TaxConfigInvalid = 6002,
    /// Tax rate outside 0..=100
    TaxRateOutOfRange = 6003,

    // ==================== 7xxx: Master data ====================
    /// Account point not found
    AccountPointNotFound = 7101,

    // ==================== 9xxx: System ====================
    /// Database error
    DatabaseError = 9002,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Whether a caller may retry the whole operation and expect a fresh outcome
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorCode::NumberingFailed
                | ErrorCode::TaxConfigUnavailable
                | ErrorCode::OrderPersistFailed
                | ErrorCode::DatabaseError
        )
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderAmountOverflow => "Order amounts exceed the supported range",
            ErrorCode::OrderPersistFailed => "Order could not be persisted",
            ErrorCode::OrderCreationAborted => "Order creation was aborted",

            // Numbering
            ErrorCode::NumberingFailed => "Could not generate document number",
            ErrorCode::InvalidDocumentNumber => "Invalid document number",
            ErrorCode::CounterExhausted => "Document counter exhausted",

            // Settings
            ErrorCode::TaxConfigUnavailable => "Could not retrieve tax configuration",
            ErrorCode::TaxConfigInvalid => "Stored tax configuration is invalid",
            ErrorCode::TaxRateOutOfRange => "Tax rate must be between 0 and 100",

            // Master data
            ErrorCode::AccountPointNotFound => "Account point not found",

            // System
            ErrorCode::DatabaseError => "Database error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderAmountOverflow),
            4003 => Ok(ErrorCode::OrderPersistFailed),
            4004 => Ok(ErrorCode::OrderCreationAborted),

            // Numbering
            5001 => Ok(ErrorCode::NumberingFailed),
            5002 => Ok(ErrorCode::InvalidDocumentNumber),
            5003 => Ok(ErrorCode::CounterExhausted),

            // Settings
            6001 => Ok(ErrorCode::TaxConfigUnavailable),
            6002 => Ok(ErrorCode::TaxConfigInvalid),
            6003 => Ok(ErrorCode::TaxRateOutOfRange),

            // Master data
            7101 => Ok(ErrorCode::AccountPointNotFound),

            // System
            9002 => Ok(ErrorCode::DatabaseError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::OrderNotFound.code(), 4001);
        assert_eq!(ErrorCode::NumberingFailed.code(), 5001);
        assert_eq!(ErrorCode::TaxConfigUnavailable.code(), 6001);
        assert_eq!(ErrorCode::AccountPointNotFound.code(), 7101);
        assert_eq!(ErrorCode::DatabaseError.code(), 9002);
    }

    #[test]
    fn test_try_from_u16_matches_code() {
        let all = [
            ErrorCode::ValidationFailed,
            ErrorCode::NotFound,
            ErrorCode::AlreadyExists,
            ErrorCode::OrderNotFound,
            ErrorCode::OrderAmountOverflow,
            ErrorCode::OrderPersistFailed,
            ErrorCode::OrderCreationAborted,
            ErrorCode::NumberingFailed,
            ErrorCode::InvalidDocumentNumber,
            ErrorCode::CounterExhausted,
            ErrorCode::TaxConfigUnavailable,
            ErrorCode::TaxConfigInvalid,
            ErrorCode::TaxRateOutOfRange,
            ErrorCode::AccountPointNotFound,
            ErrorCode::DatabaseError,
        ];
        for code in all {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
        assert_eq!(ErrorCode::try_from(4999), Err(InvalidErrorCode(4999)));
    }

    #[test]
    fn test_numbering_and_config_are_distinct() {
        assert_ne!(
            ErrorCode::NumberingFailed.message(),
            ErrorCode::TaxConfigUnavailable.message()
        );
        assert!(ErrorCode::NumberingFailed.is_retryable());
        assert!(!ErrorCode::TaxRateOutOfRange.is_retryable());
    }

    #[test]
    fn test_serde_as_number() {
        let json = serde_json::to_string(&ErrorCode::NumberingFailed).unwrap();
        assert_eq!(json, "5001");
        let code: ErrorCode = serde_json::from_str("6001").unwrap();
        assert_eq!(code, ErrorCode::TaxConfigUnavailable);
        assert!(serde_json::from_str::<ErrorCode>("1234").is_err());
    }
}
