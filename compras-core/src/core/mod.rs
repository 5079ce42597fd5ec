//! Core: configuration and service wiring
//!
//! - [`Config`] - process configuration from the environment
//! - [`AppState`] - services sharing one store

pub mod config;
pub mod state;

pub use config::{BoxError, Config, DEFAULT_TAX_RATE, DatabaseConfig};
pub use state::AppState;
