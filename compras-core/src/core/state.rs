use std::sync::Arc;

use crate::account_points::AccountPointService;
use crate::core::{Config, DatabaseConfig};
use crate::db::{self, Store};
use crate::numbering::SequenceAllocator;
use crate::orders::OrderService;
use crate::settings::SettingService;
use crate::utils::ServiceResult;
use rust_decimal::Decimal;

/// Service handles wired to one store
///
/// Cloning is cheap: every field shares the same `Arc<dyn Store>`. Nothing is
/// global; build one per process (or per test) and pass it around.
///
/// | Field | Purpose |
/// |-------|---------|
/// | store | transactional storage |
/// | allocator | document numbers |
/// | settings | tax rate |
/// | orders | order creation and queries |
/// | account_points | account point creation |
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub allocator: SequenceAllocator,
    pub settings: SettingService,
    pub orders: OrderService,
    pub account_points: AccountPointService,
}

impl AppState {
    /// Wire every service to an already-open store
    pub fn new(store: Arc<dyn Store>, default_tax_rate: Decimal) -> ServiceResult<Self> {
        let allocator = SequenceAllocator::new(store.clone());
        let settings = SettingService::new(store.clone(), default_tax_rate)?;
        let orders = OrderService::new(store.clone(), allocator.clone(), settings.clone());
        let account_points = AccountPointService::new(store.clone(), allocator.clone());
        Ok(Self {
            store,
            allocator,
            settings,
            orders,
            account_points,
        })
    }

    /// Connect to the configured store (applying migrations) and wire services
    pub async fn initialize(config: &Config) -> ServiceResult<Self> {
        Self::connect(&config.database, config.default_tax_rate).await
    }

    pub async fn connect(database: &DatabaseConfig, default_tax_rate: Decimal) -> ServiceResult<Self> {
        let store = db::connect(database).await?;
        tracing::info!(backend = %store.backend(), "Store ready");
        Self::new(store, default_tax_rate)
    }

    pub async fn shutdown(&self) {
        self.store.close().await;
    }
}
