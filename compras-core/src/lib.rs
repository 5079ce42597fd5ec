//! compras-core - document numbering and purchase order creation
//!
//! # Modules
//!
//! - [`db`] - `Store`/`StoreTx` traits with PostgreSQL and SQLite backends
//! - [`numbering`] - per-type, per-year sequence allocation
//! - [`orders`] - amount calculation and the order creation transaction
//! - [`settings`] - tax rate
//! - [`account_points`] - numbered account points
//! - [`core`] - configuration and service wiring
//! - [`cli`] - the `compras` command line
//! - [`utils`] - service errors and logging

pub mod account_points;
pub mod cli;
pub mod core;
pub mod db;
pub mod numbering;
pub mod orders;
pub mod settings;
pub mod utils;

// Re-exports
pub use account_points::AccountPointService;
pub use crate::core::{AppState, Config, DatabaseConfig};
pub use db::{Backend, RepoError, RepoResult, Store, StoreTx};
pub use numbering::{ResetAck, SequenceAllocator};
pub use orders::OrderService;
pub use settings::SettingService;
pub use utils::{OrderStage, PersistStep, ServiceError, ServiceResult};
