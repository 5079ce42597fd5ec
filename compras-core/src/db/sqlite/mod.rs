//! SQLite backend
//!
//! Embedded store for single-site installs and tests. SQLite has no row
//! locks; the counter statement takes the database writer lock instead, so
//! allocations serialize across all keys. Decimal columns hold
//! `rust_decimal` text.

mod counter;
mod master;
mod order;
mod setting;

use super::{Backend, NewOrder, NewOrderItem, RepoError, RepoResult, Store, StoreTx};
use crate::core::DatabaseConfig;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::models::{
    AccountPoint, AccountPointDraft, Counter, CounterKey, Order, OrderPage, OrderQuery,
    Setting,
};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::{Sqlite, Transaction};
use std::str::FromStr;
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite store backed by a connection pool
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) and apply migrations
    pub async fn connect(config: &DatabaseConfig) -> RepoResult<Self> {
        let in_memory = config.url.contains(":memory:");

        let mut options = SqliteConnectOptions::from_str(&config.url)
            .map_err(|e| RepoError::Database(format!("Invalid database path: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);
        if !in_memory {
            options = options
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal);
        }

        // Shared-cache memory databases fail fast on lock contention
        let max_connections = if in_memory { 1 } else { config.max_connections };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_with(options)
            .await?;
        tracing::info!(
            in_memory,
            max_connections,
            "Database connection established (SQLite, busy_timeout=5000ms)"
        );

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Private in-memory database with migrations applied
    pub async fn in_memory() -> RepoResult<Self> {
        Self::connect(&DatabaseConfig::new("sqlite::memory:")).await
    }

    /// Wrap an existing pool (migrations are not applied)
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> RepoResult<()> {
        sqlx::migrate!("./migrations/sqlite").run(&self.pool).await?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl Store for SqliteStore {
    fn backend(&self) -> Backend {
        Backend::Sqlite
    }

    async fn begin(&self) -> RepoResult<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(SqliteTx { tx }))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Open SQLite transaction
pub struct SqliteTx {
    tx: Transaction<'static, Sqlite>,
}

#[async_trait]
impl StoreTx for SqliteTx {
    async fn next_sequence(&mut self, key: &CounterKey) -> RepoResult<i64> {
        counter::next_sequence(&mut self.tx, key).await
    }

    async fn find_counter(&mut self, key: &CounterKey) -> RepoResult<Option<Counter>> {
        counter::find(&mut self.tx, key).await
    }

    async fn list_counters(&mut self, year: Option<i32>) -> RepoResult<Vec<Counter>> {
        counter::list(&mut self.tx, year).await
    }

    async fn find_setting(&mut self, key: &str) -> RepoResult<Option<Setting>> {
        setting::find(&mut self.tx, key).await
    }

    async fn upsert_setting(&mut self, key: &str, value: &str) -> RepoResult<Setting> {
        setting::upsert(&mut self.tx, key, value).await
    }

    async fn insert_order(&mut self, order: &NewOrder<'_>) -> RepoResult<i64> {
        order::insert(&mut self.tx, order).await
    }

    async fn insert_order_item(
        &mut self,
        order_id: i64,
        item: &NewOrderItem<'_>,
    ) -> RepoResult<i64> {
        order::insert_item(&mut self.tx, order_id, item).await
    }

    async fn find_order(&mut self, id: i64) -> RepoResult<Option<Order>> {
        order::find(&mut self.tx, id).await
    }

    async fn search_orders(&mut self, query: &OrderQuery) -> RepoResult<OrderPage> {
        order::search(&mut self.tx, query).await
    }

    async fn orders_by_account_point(&mut self, account_point_id: i64) -> RepoResult<Vec<Order>> {
        order::by_account_point(&mut self.tx, account_point_id).await
    }

    async fn find_account_point(&mut self, id: i64) -> RepoResult<Option<AccountPoint>> {
        master::find_account_point(&mut self.tx, id).await
    }

    async fn insert_account_point(
        &mut self,
        account_number: &str,
        date: NaiveDate,
        draft: &AccountPointDraft,
    ) -> RepoResult<AccountPoint> {
        master::insert_account_point(&mut self.tx, account_number, date, draft).await
    }

    async fn commit(self: Box<Self>) -> RepoResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}

/// Decode a decimal stored as text
pub(crate) fn parse_decimal(column: &'static str, value: &str) -> RepoResult<Decimal> {
    Decimal::from_str(value).map_err(|_| RepoError::Corrupt {
        column,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{
        IVA_PERCENTAGE_KEY, OrderDraft, OrderItemDraft, OrderStatus, document_types,
    };

    async fn store() -> SqliteStore {
        SqliteStore::in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn test_counter_created_on_first_use_and_incremented() {
        let store = store().await;
        let key = CounterKey::new(document_types::MEMO, 2024);

        let mut tx = store.begin().await.unwrap();
        assert!(tx.find_counter(&key).await.unwrap().is_none());
        assert_eq!(tx.next_sequence(&key).await.unwrap(), 1);
        assert_eq!(tx.next_sequence(&key).await.unwrap(), 2);
        tx.commit().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let counter = tx.find_counter(&key).await.unwrap().unwrap();
        assert_eq!(counter.last_sequence, 2);
        assert_eq!(counter.year, 2024);
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back_counter() {
        let store = store().await;
        let key = CounterKey::new(document_types::MEMO, 2025);

        {
            let mut tx = store.begin().await.unwrap();
            assert_eq!(tx.next_sequence(&key).await.unwrap(), 1);
            // dropped without commit
        }

        let mut tx = store.begin().await.unwrap();
        assert_eq!(tx.next_sequence(&key).await.unwrap(), 1);
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn test_list_counters_filters_by_year() {
        let store = store().await;
        let mut tx = store.begin().await.unwrap();
        tx.next_sequence(&CounterKey::new("MEMO", 2024)).await.unwrap();
        tx.next_sequence(&CounterKey::new("MEMO", 2025)).await.unwrap();
        tx.next_sequence(&CounterKey::new("PC", 2025)).await.unwrap();

        assert_eq!(tx.list_counters(None).await.unwrap().len(), 3);
        let only_2025 = tx.list_counters(Some(2025)).await.unwrap();
        let types: Vec<_> = only_2025.iter().map(|c| c.document_type.as_str()).collect();
        assert_eq!(types, vec!["MEMO", "PC"]);
    }

    #[tokio::test]
    async fn test_setting_upsert_overwrites() {
        let store = store().await;
        let mut tx = store.begin().await.unwrap();
        assert!(tx.find_setting(IVA_PERCENTAGE_KEY).await.unwrap().is_none());

        tx.upsert_setting(IVA_PERCENTAGE_KEY, "16").await.unwrap();
        let s = tx.upsert_setting(IVA_PERCENTAGE_KEY, "12.5").await.unwrap();
        assert_eq!(s.value, "12.5");

        let s = tx.find_setting(IVA_PERCENTAGE_KEY).await.unwrap().unwrap();
        assert_eq!(s.value, "12.5");
    }

    #[tokio::test]
    async fn test_decimals_survive_text_storage() {
        let store = store().await;
        let draft = OrderDraft {
            concept: "Resmas".into(),
            items: vec![OrderItemDraft {
                description: "Papel carta".into(),
                unit: "UND".into(),
                quantity: Decimal::new(3, 0),
                unit_price: Decimal::new(1_005, 3),
                applies_tax: true,
            }],
            ..Default::default()
        };

        let mut tx = store.begin().await.unwrap();
        let id = tx
            .insert_order(&NewOrder {
                memo_number: "MEMO-2025-00001",
                draft: &draft,
                base_amount: Decimal::new(3_015, 3),
                iva_percentage: Decimal::new(16, 0),
                tax_amount: Decimal::new(48_240, 5),
                total_amount: Decimal::new(349_740, 5),
                status: OrderStatus::InProgress,
                now: 1,
            })
            .await
            .unwrap();
        tx.insert_order_item(
            id,
            &NewOrderItem {
                position: 0,
                draft: &draft.items[0],
                line_total: Decimal::new(3_015, 3),
            },
        )
        .await
        .unwrap();

        let order = tx.find_order(id).await.unwrap().unwrap();
        assert_eq!(order.tax_amount, Decimal::new(4_824, 4));
        assert_eq!(order.total_amount.to_string(), "3.49740");
        assert_eq!(order.items[0].unit_price, Decimal::new(1_005, 3));
        assert!(order.signed_by.is_none());
    }

    #[test]
    fn test_parse_decimal_rejects_garbage() {
        assert!(parse_decimal("orders.base_amount", "12.50").is_ok());
        assert!(matches!(
            parse_decimal("orders.base_amount", "12,50"),
            Err(RepoError::Corrupt { .. })
        ));
    }
}
