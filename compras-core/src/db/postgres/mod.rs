//! PostgreSQL backend
//!
//! Production store. Counter allocation relies on row-level locks
//! (`SELECT ... FOR UPDATE`), so allocations for different keys never wait on
//! each other.

mod counter;
mod master;
mod order;
mod setting;

use super::{Backend, NewOrder, NewOrderItem, RepoResult, Store, StoreTx};
use crate::core::DatabaseConfig;
use async_trait::async_trait;
use chrono::NaiveDate;
use shared::models::{
    AccountPoint, AccountPointDraft, Counter, CounterKey, Order, OrderPage, OrderQuery,
    Setting,
};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};

/// PostgreSQL store backed by a connection pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and apply migrations
    pub async fn connect(config: &DatabaseConfig) -> RepoResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await?;
        tracing::info!(
            max_connections = config.max_connections,
            "Connected to PostgreSQL"
        );

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Wrap an existing pool (migrations are not applied)
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> RepoResult<()> {
        sqlx::migrate!("./migrations/postgres")
            .run(&self.pool)
            .await?;
        tracing::info!("Database migrations applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> Backend {
        Backend::Postgres
    }

    async fn begin(&self) -> RepoResult<Box<dyn StoreTx>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

/// Open PostgreSQL transaction
pub struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
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
