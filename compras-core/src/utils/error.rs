//! Service-layer errors
//!
//! `ServiceError` is what every core operation returns. It sits between the
//! store layer ([`RepoError`]) and the caller-facing [`AppError`], and keeps
//! enough context to tell which step of an order creation failed.
//!
//! | Variant | Cause | Retryable |
//! |---------|-------|-----------|
//! | `Numbering` | counter allocation failed | yes |
//! | `Configuration` | tax rate could not be read | yes |
//! | `Persistence` | header/item insert, re-read or commit failed | yes |
//! | `Computation` | amount arithmetic overflowed | no |
//! | `Fault` | a panic unwound through the transaction | no |

use crate::db::RepoError;
use rust_decimal::Decimal;
use shared::error::{AppError, ErrorCode};
use std::fmt;
use thiserror::Error;

/// Earliest year a numbering series may belong to
pub const MIN_YEAR: i32 = 2024;
/// Last year that still formats as four digits
pub const MAX_YEAR: i32 = 9999;

/// Lifecycle of one order creation
///
/// `Draft → Numbering → Computing → Persisting → Committed`; a failure at any
/// point ends in `RolledBack`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OrderStage {
    Draft = 0,
    Numbering = 1,
    Computing = 2,
    Persisting = 3,
    Committed = 4,
    RolledBack = 5,
}

impl OrderStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Numbering => "numbering",
            Self::Computing => "computing",
            Self::Persisting => "persisting",
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
        }
    }

    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Draft,
            1 => Self::Numbering,
            2 => Self::Computing,
            3 => Self::Persisting,
            4 => Self::Committed,
            _ => Self::RolledBack,
        }
    }
}

impl fmt::Display for OrderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Write that failed while persisting an order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistStep {
    Header,
    /// Zero-based item position
    Item(usize),
    Hydrate,
    Commit,
}

impl fmt::Display for PersistStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Header => f.write_str("header insert"),
            Self::Item(pos) => write!(f, "item #{pos} insert"),
            Self::Hydrate => f.write_str("re-read"),
            Self::Commit => f.write_str("commit"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("could not generate document number")]
    Numbering(#[source] RepoError),

    #[error("could not retrieve tax configuration")]
    Configuration(#[source] RepoError),

    #[error("order persistence failed at {step}")]
    Persistence {
        step: PersistStep,
        #[source]
        source: RepoError,
    },

    #[error("order amounts overflow: {0}")]
    Computation(String),

    #[error("order creation aborted during {stage}: {message}")]
    Fault { stage: OrderStage, message: String },

    #[error("order {0} not found")]
    OrderNotFound(i64),

    #[error("account point {0} not found")]
    AccountPointNotFound(i64),

    #[error("tax rate {0} is outside 0..=100")]
    TaxRateOutOfRange(Decimal),

    #[error("invalid document type {0:?}")]
    InvalidDocumentType(String),

    #[error("year {0} is outside {min}..={max}", min = MIN_YEAR, max = MAX_YEAR)]
    InvalidYear(i32),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

impl ServiceError {
    /// Whether retrying the whole operation may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Numbering(e) => !matches!(e, RepoError::CounterOverflow(_)),
            Self::Configuration(e) => !matches!(e, RepoError::Corrupt { .. }),
            Self::Persistence { source, .. } => !matches!(source, RepoError::Corrupt { .. }),
            Self::Repo(e) => matches!(e, RepoError::Database(_)),
            Self::Computation(_)
            | Self::Fault { .. }
            | Self::OrderNotFound(_)
            | Self::AccountPointNotFound(_)
            | Self::TaxRateOutOfRange(_)
            | Self::InvalidDocumentType(_)
            | Self::InvalidYear(_) => false,
        }
    }

    /// Error code reported to callers
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Numbering(RepoError::CounterOverflow(_)) => ErrorCode::CounterExhausted,
            Self::Numbering(_) => ErrorCode::NumberingFailed,
            Self::Configuration(RepoError::Corrupt { .. }) => ErrorCode::TaxConfigInvalid,
            Self::Configuration(_) => ErrorCode::TaxConfigUnavailable,
            Self::Persistence { .. } => ErrorCode::OrderPersistFailed,
            Self::Computation(_) => ErrorCode::OrderAmountOverflow,
            Self::Fault { .. } => ErrorCode::OrderCreationAborted,
            Self::OrderNotFound(_) => ErrorCode::OrderNotFound,
            Self::AccountPointNotFound(_) => ErrorCode::AccountPointNotFound,
            Self::TaxRateOutOfRange(_) => ErrorCode::TaxRateOutOfRange,
            Self::InvalidDocumentType(_) => ErrorCode::InvalidDocumentNumber,
            Self::InvalidYear(_) => ErrorCode::ValidationFailed,
            Self::Repo(RepoError::NotFound(_)) => ErrorCode::NotFound,
            Self::Repo(RepoError::Duplicate(_)) => ErrorCode::AlreadyExists,
            Self::Repo(_) => ErrorCode::DatabaseError,
        }
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<ServiceError> for AppError {
    fn from(e: ServiceError) -> Self {
        let code = e.code();
        match &e {
            ServiceError::Numbering(source)
            | ServiceError::Configuration(source)
            | ServiceError::Repo(source) => {
                tracing::error!(error = %source, code = code.code(), "Service storage error");
                AppError::with_message(code, e.to_string()).with_detail("cause", source.to_string())
            }
            ServiceError::Persistence { step, source } => {
                tracing::error!(error = %source, step = %step, "Order persistence error");
                AppError::with_message(code, e.to_string())
                    .with_detail("step", step.to_string())
                    .with_detail("cause", source.to_string())
            }
            ServiceError::Fault { stage, .. } => {
                AppError::with_message(code, e.to_string()).with_detail("stage", stage.as_str())
            }
            ServiceError::OrderNotFound(id) | ServiceError::AccountPointNotFound(id) => {
                AppError::with_message(code, e.to_string()).with_detail("id", *id)
            }
            ServiceError::InvalidYear(year) => {
                AppError::with_message(code, e.to_string()).with_detail("year", *year)
            }
            ServiceError::Computation(_)
            | ServiceError::TaxRateOutOfRange(_)
            | ServiceError::InvalidDocumentType(_) => {
                AppError::with_message(code, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::CounterKey;

    #[test]
    fn test_messages_name_the_failure() {
        let e = ServiceError::Numbering(RepoError::Database("timeout".into()));
        assert_eq!(e.to_string(), "could not generate document number");

        let e = ServiceError::Configuration(RepoError::Database("gone".into()));
        assert_eq!(e.to_string(), "could not retrieve tax configuration");

        let e = ServiceError::Persistence {
            step: PersistStep::Item(2),
            source: RepoError::Database("disk full".into()),
        };
        assert_eq!(e.to_string(), "order persistence failed at item #2 insert");
    }

    #[test]
    fn test_retryability() {
        assert!(ServiceError::Numbering(RepoError::Database("x".into())).is_retryable());
        assert!(
            !ServiceError::Numbering(RepoError::CounterOverflow(CounterKey::new("MEMO", 2024)))
                .is_retryable()
        );
        assert!(
            !ServiceError::Configuration(RepoError::Corrupt {
                column: "settings.value",
                value: "abc".into()
            })
            .is_retryable()
        );
        assert!(!ServiceError::Computation("base amount".into()).is_retryable());
        assert!(
            !ServiceError::Fault {
                stage: OrderStage::Persisting,
                message: "boom".into()
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_into_app_error() {
        let app: AppError = ServiceError::Persistence {
            step: PersistStep::Header,
            source: RepoError::Database("x".into()),
        }
        .into();
        assert_eq!(app.code, ErrorCode::OrderPersistFailed);
        assert!(app.is_retryable());
        let details = app.details.unwrap();
        assert_eq!(details["step"], "header insert");

        let app: AppError = ServiceError::OrderNotFound(7).into();
        assert_eq!(app.code, ErrorCode::OrderNotFound);
        assert_eq!(app.message, "order 7 not found");
        assert_eq!(app.details.unwrap()["id"], 7);

        let app: AppError = ServiceError::AccountPointNotFound(3).into();
        assert_eq!(app.code, ErrorCode::AccountPointNotFound);

        let app: AppError = ServiceError::InvalidYear(-5).into();
        assert_eq!(app.code, ErrorCode::ValidationFailed);
        assert_eq!(app.message, "year -5 is outside 2024..=9999");

        let app: AppError = ServiceError::Configuration(RepoError::Corrupt {
            column: "settings.value",
            value: "x".into(),
        })
        .into();
        assert_eq!(app.code, ErrorCode::TaxConfigInvalid);
    }

    #[test]
    fn test_stage_round_trip() {
        for stage in [
            OrderStage::Draft,
            OrderStage::Numbering,
            OrderStage::Computing,
            OrderStage::Persisting,
            OrderStage::Committed,
            OrderStage::RolledBack,
        ] {
            assert_eq!(OrderStage::from_u8(stage as u8), stage);
        }
    }
}
