//! Order transaction coordinator
//!
//! `create_order` runs as one store transaction:
//!
//! 1. allocate the `MEMO` number for the current year (locks the counter)
//! 2. read the tax rate, seeding the default if none is stored
//! 3. compute line totals, base, tax and total
//! 4. insert the header, then every item
//! 5. re-read the hydrated order
//! 6. commit
//!
//! The counter write comes first so SQLite takes its writer lock before any
//! read. Any error or panic before the commit drops the transaction, which
//! rolls back the counter increment along with everything else.

use super::money::{self, OrderTotals};
use crate::db::{NewOrder, NewOrderItem, RepoError, Store, StoreTx};
use crate::numbering::SequenceAllocator;
use crate::settings::SettingService;
use crate::utils::{OrderStage, PersistStep, ServiceError, ServiceResult};
use futures::FutureExt;
use shared::models::{
    Order, OrderDraft, OrderPage, OrderQuery, OrderStatus, document_types,
};
use shared::util::{current_year, now_millis};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// Stage reached by an in-flight creation, readable after a panic
struct StageTracker(AtomicU8);

impl StageTracker {
    fn new() -> Self {
        Self(AtomicU8::new(OrderStage::Draft as u8))
    }

    fn set(&self, stage: OrderStage) {
        self.0.store(stage as u8, Ordering::Relaxed);
    }

    fn get(&self) -> OrderStage {
        OrderStage::from_u8(self.0.load(Ordering::Relaxed))
    }
}

#[derive(Clone)]
pub struct OrderService {
    store: Arc<dyn Store>,
    allocator: SequenceAllocator,
    settings: SettingService,
}

impl OrderService {
    pub fn new(
        store: Arc<dyn Store>,
        allocator: SequenceAllocator,
        settings: SettingService,
    ) -> Self {
        Self {
            store,
            allocator,
            settings,
        }
    }

    /// Create an order atomically and return it fully hydrated
    pub async fn create_order(&self, draft: OrderDraft) -> ServiceResult<Order> {
        let stage = StageTracker::new();
        let outcome = AssertUnwindSafe(self.create_in_tx(&draft, &stage))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(order)) => {
                tracing::info!(
                    order_id = order.id,
                    memo_number = %order.memo_number,
                    items = order.items.len(),
                    total = %order.total_amount,
                    "Order created"
                );
                Ok(order)
            }
            Ok(Err(e)) => {
                let failed_at = stage.get();
                stage.set(OrderStage::RolledBack);
                tracing::warn!(stage = %failed_at, error = %e, "Order creation rolled back");
                Err(e)
            }
            Err(panic) => {
                let failed_at = stage.get();
                stage.set(OrderStage::RolledBack);
                let message = panic_message(panic.as_ref());
                tracing::error!(stage = %failed_at, panic = %message, "Order creation panicked, rolled back");
                Err(ServiceError::Fault {
                    stage: failed_at,
                    message,
                })
            }
        }
    }

    async fn create_in_tx(&self, draft: &OrderDraft, stage: &StageTracker) -> ServiceResult<Order> {
        stage.set(OrderStage::Numbering);
        let mut tx = self.store.begin().await.map_err(ServiceError::Numbering)?;
        let memo = self
            .allocator
            .next_in(tx.as_mut(), document_types::MEMO, current_year())
            .await?;
        let memo_number = memo.to_string();

        stage.set(OrderStage::Computing);
        let rate = self.settings.tax_rate_in(tx.as_mut()).await?;
        let totals = money::compute_totals(&draft.items, rate)?;

        stage.set(OrderStage::Persisting);
        let order = persist(tx.as_mut(), &memo_number, draft, &totals).await?;
        tx.commit().await.map_err(|source| ServiceError::Persistence {
            step: PersistStep::Commit,
            source,
        })?;

        stage.set(OrderStage::Committed);
        Ok(order)
    }

    /// Hydrated order by id
    pub async fn get_order(&self, id: i64) -> ServiceResult<Order> {
        let mut tx = self.store.begin().await?;
        let order = tx.find_order(id).await?;
        tx.commit().await?;
        order.ok_or(ServiceError::OrderNotFound(id))
    }

    /// Paginated order summaries, newest first
    pub async fn search_orders(&self, query: &OrderQuery) -> ServiceResult<OrderPage> {
        let mut tx = self.store.begin().await?;
        let page = tx.search_orders(query).await?;
        tx.commit().await?;
        Ok(page)
    }

    /// Hydrated orders referencing an account point, newest first
    pub async fn orders_by_account_point(&self, account_point_id: i64) -> ServiceResult<Vec<Order>> {
        let mut tx = self.store.begin().await?;
        let orders = tx.orders_by_account_point(account_point_id).await?;
        tx.commit().await?;
        Ok(orders)
    }
}

/// Header, items, then the re-read
async fn persist(
    tx: &mut dyn StoreTx,
    memo_number: &str,
    draft: &OrderDraft,
    totals: &OrderTotals,
) -> ServiceResult<Order> {
    let order_id = tx
        .insert_order(&NewOrder {
            memo_number,
            draft,
            base_amount: totals.base_amount,
            iva_percentage: totals.iva_percentage,
            tax_amount: totals.tax_amount,
            total_amount: totals.total_amount,
            status: OrderStatus::InProgress,
            now: now_millis(),
        })
        .await
        .map_err(|source| ServiceError::Persistence {
            step: PersistStep::Header,
            source,
        })?;

    for (position, (item, line_total)) in draft.items.iter().zip(&totals.line_totals).enumerate() {
        let step = PersistStep::Item(position);
        let row_position = i32::try_from(position)
            .map_err(|_| ServiceError::Computation(format!("item position {position}")))?;
        tx.insert_order_item(
            order_id,
            &NewOrderItem {
                position: row_position,
                draft: item,
                line_total: *line_total,
            },
        )
        .await
        .map_err(|source| ServiceError::Persistence { step, source })?;
    }

    tx.find_order(order_id)
        .await
        .and_then(|found| {
            found.ok_or_else(|| RepoError::NotFound(format!("Order {order_id} after insert")))
        })
        .map_err(|source| ServiceError::Persistence {
            step: PersistStep::Hydrate,
            source,
        })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::SqliteStore;
    use rust_decimal::Decimal;
    use shared::models::OrderItemDraft;

    async fn service() -> OrderService {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::in_memory().await.unwrap());
        let allocator = SequenceAllocator::new(store.clone());
        let settings = SettingService::new(store.clone(), Decimal::new(16, 0)).unwrap();
        OrderService::new(store, allocator, settings)
    }

    fn draft() -> OrderDraft {
        OrderDraft {
            concept: "Material de oficina".into(),
            provider: "Papelería Central".into(),
            items: vec![
                OrderItemDraft {
                    description: "Carpetas".into(),
                    unit: "UND".into(),
                    quantity: Decimal::new(2, 0),
                    unit_price: Decimal::new(10, 0),
                    applies_tax: true,
                },
                OrderItemDraft {
                    description: "Flete".into(),
                    unit: "SERVICIO".into(),
                    quantity: Decimal::ONE,
                    unit_price: Decimal::new(5, 0),
                    applies_tax: false,
                },
            ],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_order_computes_and_hydrates() {
        let svc = service().await;
        let order = svc.create_order(draft()).await.unwrap();

        assert_eq!(order.memo_number, format!("MEMO-{}-00001", current_year()));
        assert_eq!(order.base_amount, Decimal::new(25, 0));
        assert_eq!(order.tax_amount, Decimal::new(32, 1));
        assert_eq!(order.total_amount, Decimal::new(282, 1));
        assert_eq!(order.iva_percentage, Decimal::new(16, 0));
        assert_eq!(order.status, OrderStatus::InProgress);
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[0].position, 0);
        assert_eq!(order.items[0].line_total, Decimal::new(20, 0));
        assert_eq!(order.items[1].description, "Flete");
        assert_eq!(order.taxable_base(), Decimal::new(20, 0));

        let again = svc.get_order(order.id).await.unwrap();
        assert_eq!(again.memo_number, order.memo_number);
        assert_eq!(again.items, order.items);
    }

    #[tokio::test]
    async fn test_memo_numbers_follow_each_other() {
        let svc = service().await;
        let a = svc.create_order(draft()).await.unwrap();
        let b = svc.create_order(OrderDraft::default()).await.unwrap();
        let year = current_year();
        assert_eq!(a.memo_number, format!("MEMO-{year}-00001"));
        assert_eq!(b.memo_number, format!("MEMO-{year}-00002"));
        assert!(b.items.is_empty());
        assert_eq!(b.total_amount, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_overflow_rolls_back_memo_number() {
        let svc = service().await;
        let mut bad = draft();
        bad.items[0].quantity = Decimal::MAX;
        bad.items[0].unit_price = Decimal::new(2, 0);

        let err = svc.create_order(bad).await.unwrap_err();
        assert!(matches!(err, ServiceError::Computation(_)));

        let good = svc.create_order(draft()).await.unwrap();
        assert!(good.memo_number.ends_with("-00001"));
    }

    #[tokio::test]
    async fn test_missing_reference_is_persistence_error() {
        let svc = service().await;
        let mut d = draft();
        d.signed_by_id = Some(999);

        let err = svc.create_order(d).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Persistence {
                step: PersistStep::Header,
                ..
            }
        ));
        assert!(err.is_retryable());

        let page = svc.search_orders(&OrderQuery::default()).await.unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn test_get_missing_order() {
        let svc = service().await;
        assert!(matches!(
            svc.get_order(1).await,
            Err(ServiceError::OrderNotFound(1))
        ));
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("kaboom"));
        assert_eq!(panic_message(payload.as_ref()), "kaboom");
        let payload: Box<dyn Any + Send> = Box::new(7u32);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
