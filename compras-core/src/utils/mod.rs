//! Utilities: service errors and logging

pub mod error;
pub mod logger;

pub use error::{MAX_YEAR, MIN_YEAR, OrderStage, PersistStep, ServiceError, ServiceResult};
