//! Shared types for the compras workspace
//!
//! Domain models, document numbering and the unified error system used by
//! `compras-core` and anything that talks to it.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use error::{AppError, AppResult, ErrorCode};
pub use models::DocumentNumber;
pub use serde::{Deserialize, Serialize};
