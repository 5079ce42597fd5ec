//! Account point service
//!
//! An account point gets its `PC-{year}-{seq}` number in the same
//! transaction that inserts it.

use crate::db::Store;
use crate::numbering::SequenceAllocator;
use crate::utils::{ServiceError, ServiceResult};
use shared::models::{AccountPoint, AccountPointDraft, document_types};
use shared::util::{current_year, today};
use std::sync::Arc;

#[derive(Clone)]
pub struct AccountPointService {
    store: Arc<dyn Store>,
    allocator: SequenceAllocator,
}

impl AccountPointService {
    pub fn new(store: Arc<dyn Store>, allocator: SequenceAllocator) -> Self {
        Self { store, allocator }
    }

    /// Number and store a new account point
    pub async fn create(&self, draft: AccountPointDraft) -> ServiceResult<AccountPoint> {
        let mut tx = self.store.begin().await.map_err(ServiceError::Numbering)?;

        let number = self
            .allocator
            .next_in(tx.as_mut(), document_types::ACCOUNT_POINT, current_year())
            .await?;
        let account_number = number.to_string();
        let date = draft.date.unwrap_or_else(today);

        let account_point = tx
            .insert_account_point(&account_number, date, &draft)
            .await?;
        tx.commit().await?;

        tracing::info!(
            id = account_point.id,
            account_number = %account_point.account_number,
            "Account point created"
        );
        Ok(account_point)
    }

    pub async fn get(&self, id: i64) -> ServiceResult<AccountPoint> {
        let mut tx = self.store.begin().await?;
        let found = tx.find_account_point(id).await?;
        tx.commit().await?;
        found.ok_or(ServiceError::AccountPointNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::SqliteStore;
    use chrono::NaiveDate;
    use shared::models::AccountPointStatus;

    async fn service() -> AccountPointService {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::in_memory().await.unwrap());
        AccountPointService::new(store.clone(), SequenceAllocator::new(store))
    }

    #[tokio::test]
    async fn test_create_assigns_sequential_pc_numbers() {
        let svc = service().await;
        let year = current_year();

        let first = svc
            .create(AccountPointDraft {
                subject: "Adquisición de mobiliario".into(),
                date: NaiveDate::from_ymd_opt(2025, 2, 10),
                ..Default::default()
            })
            .await
            .unwrap();
        let second = svc.create(AccountPointDraft::default()).await.unwrap();

        assert_eq!(first.account_number, format!("PC-{year}-00001"));
        assert_eq!(second.account_number, format!("PC-{year}-00002"));
        assert_eq!(first.date, NaiveDate::from_ymd_opt(2025, 2, 10).unwrap());
        assert_eq!(second.date, today());
        assert_eq!(first.status, AccountPointStatus::Available);

        let loaded = svc.get(first.id).await.unwrap();
        assert_eq!(loaded, first);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let svc = service().await;
        assert!(matches!(
            svc.get(42).await,
            Err(ServiceError::AccountPointNotFound(42))
        ));
    }
}
