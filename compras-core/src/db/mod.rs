//! Database Module
//!
//! The core talks to storage only through two object-safe traits:
//!
//! - [`Store`] owns a connection pool and opens transactions.
//! - [`StoreTx`] is one open transaction. Every write the core performs goes
//!   through it, and dropping it without [`StoreTx::commit`] rolls back.
//!
//! Two backends implement them: PostgreSQL for deployments with many
//! concurrent clients, SQLite for single-site installs and tests. The backend
//! is chosen from the `DATABASE_URL` scheme.

pub mod postgres;
pub mod rows;
pub mod sqlite;

use crate::core::DatabaseConfig;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::models::{
    AccountPoint, AccountPointDraft, Counter, CounterKey, Order, OrderDraft,
    OrderItemDraft, OrderPage, OrderQuery, OrderStatus, Setting,
};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Corrupt value in column {column}: {value:?}")]
    Corrupt { column: &'static str, value: String },

    #[error("Counter {0} cannot be incremented further")]
    CounterOverflow(CounterKey),

    #[error("Unsupported database URL: {0}")]
    UnsupportedUrl(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err
            && db_err.is_unique_violation()
        {
            return RepoError::Duplicate(db_err.message().to_string());
        }
        RepoError::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for RepoError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        RepoError::Database(format!("Failed to apply migrations: {err}"))
    }
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Storage backend kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Postgres,
    Sqlite,
}

impl Backend {
    /// Pick the backend from a connection URL scheme
    pub fn from_url(url: &str) -> RepoResult<Self> {
        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Ok(Backend::Postgres)
        } else if url.starts_with("sqlite:") {
            Ok(Backend::Sqlite)
        } else {
            let scheme = url.split(':').next().unwrap_or_default();
            Err(RepoError::UnsupportedUrl(format!("{scheme}://…")))
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Postgres => f.write_str("postgres"),
            Backend::Sqlite => f.write_str("sqlite"),
        }
    }
}

/// Order header ready for insertion (amounts already computed)
#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub memo_number: &'a str,
    pub draft: &'a OrderDraft,
    pub base_amount: Decimal,
    pub iva_percentage: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub now: i64,
}

/// Order line ready for insertion
#[derive(Debug, Clone)]
pub struct NewOrderItem<'a> {
    pub position: i32,
    pub draft: &'a OrderItemDraft,
    pub line_total: Decimal,
}

/// Connection pool owner
#[async_trait]
pub trait Store: Send + Sync {
    fn backend(&self) -> Backend;

    /// Open a transaction
    async fn begin(&self) -> RepoResult<Box<dyn StoreTx>>;

    /// Close the pool, waiting for checked-out connections
    async fn close(&self);
}

/// One open transaction
///
/// Dropping the value without calling [`StoreTx::commit`] rolls back every
/// statement issued through it, including counter increments.
#[async_trait]
pub trait StoreTx: Send {
    // ── Counters ────────────────────────────────────────────────────

    /// Lock the counter for `key` (creating it at 0 if absent), increment it
    /// and return the new value.
    ///
    /// The lock is held until this transaction ends, so concurrent callers
    /// for the same key queue up behind it and each observes a distinct value.
    async fn next_sequence(&mut self, key: &CounterKey) -> RepoResult<i64>;

    async fn find_counter(&mut self, key: &CounterKey) -> RepoResult<Option<Counter>>;

    /// All counters, optionally restricted to one year, ordered by type then year
    async fn list_counters(&mut self, year: Option<i32>) -> RepoResult<Vec<Counter>>;

    // ── Settings ────────────────────────────────────────────────────

    async fn find_setting(&mut self, key: &str) -> RepoResult<Option<Setting>>;

    async fn upsert_setting(&mut self, key: &str, value: &str) -> RepoResult<Setting>;

    // ── Orders ──────────────────────────────────────────────────────

    /// Insert the header only and return its generated id
    async fn insert_order(&mut self, order: &NewOrder<'_>) -> RepoResult<i64>;

    async fn insert_order_item(&mut self, order_id: i64, item: &NewOrderItem<'_>)
    -> RepoResult<i64>;

    /// Header plus items, signing official and account point
    async fn find_order(&mut self, id: i64) -> RepoResult<Option<Order>>;

    async fn search_orders(&mut self, query: &OrderQuery) -> RepoResult<OrderPage>;

    /// Hydrated orders referencing an account point, newest first
    async fn orders_by_account_point(&mut self, account_point_id: i64) -> RepoResult<Vec<Order>>;

    // ── Master data ─────────────────────────────────────────────────

    async fn find_account_point(&mut self, id: i64) -> RepoResult<Option<AccountPoint>>;

    async fn insert_account_point(
        &mut self,
        account_number: &str,
        date: NaiveDate,
        draft: &AccountPointDraft,
    ) -> RepoResult<AccountPoint>;

    // ── Lifecycle ───────────────────────────────────────────────────

    async fn commit(self: Box<Self>) -> RepoResult<()>;
}

/// Open the store named by `config.url` and apply its migrations
pub async fn connect(config: &DatabaseConfig) -> RepoResult<Arc<dyn Store>> {
    match Backend::from_url(&config.url)? {
        Backend::Postgres => Ok(Arc::new(postgres::PgStore::connect(config).await?)),
        Backend::Sqlite => Ok(Arc::new(sqlite::SqliteStore::connect(config).await?)),
    }
}
