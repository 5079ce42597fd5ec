//! Data models
//!
//! Shared between the store backends and callers of the core services.
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! Money and quantities are `rust_decimal::Decimal`; timestamps are epoch
//! milliseconds; all row IDs are `i64`.

pub mod account_point;
pub mod counter;
pub mod official;
pub mod order;
pub mod setting;

// Re-exports
pub use account_point::*;
pub use counter::*;
pub use official::*;
pub use order::*;
pub use setting::*;
