//! Shared fixtures for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use compras_core::db::sqlite::SqliteStore;
use compras_core::db::{Backend, NewOrder, NewOrderItem, RepoError, RepoResult, Store, StoreTx};
use compras_core::{AppState, DatabaseConfig};
use rust_decimal::Decimal;
use shared::models::{
    AccountPoint, AccountPointDraft, Counter, CounterKey, Order, OrderDraft,
    OrderItemDraft, OrderPage, OrderQuery, Setting,
};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// File-backed SQLite database (WAL, several connections) in a temp dir
pub struct TestDb {
    pub sqlite: SqliteStore,
    pub store: Arc<dyn Store>,
    _dir: TempDir,
}

pub async fn file_db() -> TestDb {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("compras.db");
    let config = DatabaseConfig {
        url: format!("sqlite:{}", path.display()),
        max_connections: 8,
        acquire_timeout: Duration::from_secs(30),
    };
    let sqlite = SqliteStore::connect(&config).await.expect("open sqlite");
    TestDb {
        store: Arc::new(sqlite.clone()),
        sqlite,
        _dir: dir,
    }
}

pub fn state(store: Arc<dyn Store>) -> AppState {
    AppState::new(store, Decimal::new(16, 0)).expect("valid default rate")
}

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).expect("decimal literal")
}

pub fn item(description: &str, quantity: &str, unit_price: &str, applies_tax: bool) -> OrderItemDraft {
    OrderItemDraft {
        description: description.into(),
        unit: "UND".into(),
        quantity: dec(quantity),
        unit_price: dec(unit_price),
        applies_tax,
    }
}

/// `[2 × 10 taxable, 1 × 5 exempt]`
pub fn sample_draft() -> OrderDraft {
    OrderDraft {
        memo_date: NaiveDate::from_ymd_opt(2025, 3, 14),
        requesting_unit: "Dirección de Administración".into(),
        responsible_official: "Ana Pérez".into(),
        concept: "Material de oficina".into(),
        provider: "Papelería Central".into(),
        items: vec![
            item("Carpetas", "2", "10", true),
            item("Flete", "1", "5", false),
        ],
        ..Default::default()
    }
}

pub async fn seed_official(db: &TestDb, full_name: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO officials (full_name, position, unit, is_active, created_at) VALUES (?1, ?2, ?3, 1, 0) RETURNING id",
    )
    .bind(full_name)
    .bind("Director")
    .bind("Administración")
    .fetch_one(db.sqlite.pool())
    .await
    .expect("seed official")
}

pub async fn seed_account_point(state: &AppState, subject: &str) -> AccountPoint {
    state
        .account_points
        .create(AccountPointDraft {
            subject: subject.into(),
            ..Default::default()
        })
        .await
        .expect("seed account point")
}

/// Fault injected by [`FaultyStore`]
#[derive(Debug, Clone, Copy)]
pub enum Fault {
    /// Counter allocation errors before touching the store
    FailSequence,
    /// Item insert at this position lands, then errors
    FailItem(i32),
    /// Item insert at this position panics
    PanicItem(i32),
}

/// Store wrapper that sabotages one write
pub struct FaultyStore {
    inner: Arc<dyn Store>,
    fault: Fault,
}

impl FaultyStore {
    pub fn new(inner: Arc<dyn Store>, fault: Fault) -> Self {
        Self { inner, fault }
    }
}

#[async_trait]
impl Store for FaultyStore {
    fn backend(&self) -> Backend {
        self.inner.backend()
    }

    async fn begin(&self) -> RepoResult<Box<dyn StoreTx>> {
        let inner = self.inner.begin().await?;
        Ok(Box::new(FaultyTx {
            inner,
            fault: self.fault,
        }))
    }

    async fn close(&self) {
        self.inner.close().await;
    }
}

struct FaultyTx {
    inner: Box<dyn StoreTx>,
    fault: Fault,
}

#[async_trait]
impl StoreTx for FaultyTx {
    async fn next_sequence(&mut self, key: &CounterKey) -> RepoResult<i64> {
        if let Fault::FailSequence = self.fault {
            return Err(RepoError::Database("injected counter failure".into()));
        }
        self.inner.next_sequence(key).await
    }

    async fn find_counter(&mut self, key: &CounterKey) -> RepoResult<Option<Counter>> {
        self.inner.find_counter(key).await
    }

    async fn list_counters(&mut self, year: Option<i32>) -> RepoResult<Vec<Counter>> {
        self.inner.list_counters(year).await
    }

    async fn find_setting(&mut self, key: &str) -> RepoResult<Option<Setting>> {
        self.inner.find_setting(key).await
    }

    async fn upsert_setting(&mut self, key: &str, value: &str) -> RepoResult<Setting> {
        self.inner.upsert_setting(key, value).await
    }

    async fn insert_order(&mut self, order: &NewOrder<'_>) -> RepoResult<i64> {
        self.inner.insert_order(order).await
    }

    async fn insert_order_item(
        &mut self,
        order_id: i64,
        item: &NewOrderItem<'_>,
    ) -> RepoResult<i64> {
        match self.fault {
            Fault::FailItem(pos) if pos == item.position => {
                // let the real insert land first so the rollback has work to undo
                self.inner.insert_order_item(order_id, item).await?;
                Err(RepoError::Database("injected item failure".into()))
            }
            Fault::PanicItem(pos) if pos == item.position => {
                panic!("injected panic at item {pos}");
            }
            _ => self.inner.insert_order_item(order_id, item).await,
        }
    }

    async fn find_order(&mut self, id: i64) -> RepoResult<Option<Order>> {
        self.inner.find_order(id).await
    }

    async fn search_orders(&mut self, query: &OrderQuery) -> RepoResult<OrderPage> {
        self.inner.search_orders(query).await
    }

    async fn orders_by_account_point(&mut self, account_point_id: i64) -> RepoResult<Vec<Order>> {
        self.inner.orders_by_account_point(account_point_id).await
    }

    async fn find_account_point(&mut self, id: i64) -> RepoResult<Option<AccountPoint>> {
        self.inner.find_account_point(id).await
    }

    async fn insert_account_point(
        &mut self,
        account_number: &str,
        date: NaiveDate,
        draft: &AccountPointDraft,
    ) -> RepoResult<AccountPoint> {
        self.inner
            .insert_account_point(account_number, date, draft)
            .await
    }

    async fn commit(self: Box<Self>) -> RepoResult<()> {
        self.inner.commit().await
    }
}
