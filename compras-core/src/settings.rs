//! Settings service
//!
//! Only the tax (IVA) percentage lives here today. Orders copy the rate into
//! their own row on creation, so changing it never touches existing orders.

use crate::db::{RepoError, Store, StoreTx};
use crate::utils::{ServiceError, ServiceResult};
use rust_decimal::Decimal;
use shared::models::{IVA_PERCENTAGE_KEY, Setting};
use std::str::FromStr;
use std::sync::Arc;

#[derive(Clone)]
pub struct SettingService {
    store: Arc<dyn Store>,
    default_tax_rate: Decimal,
}

impl SettingService {
    /// Rejects a default outside `0..=100`, which would otherwise be seeded
    /// and then read back as corrupt
    pub fn new(store: Arc<dyn Store>, default_tax_rate: Decimal) -> ServiceResult<Self> {
        if !is_valid_rate(default_tax_rate) {
            return Err(ServiceError::TaxRateOutOfRange(default_tax_rate));
        }
        Ok(Self {
            store,
            default_tax_rate,
        })
    }

    pub fn default_tax_rate(&self) -> Decimal {
        self.default_tax_rate
    }

    /// Current tax rate, seeding the default on first read
    pub async fn tax_rate(&self) -> ServiceResult<Decimal> {
        let mut tx = self
            .store
            .begin()
            .await
            .map_err(ServiceError::Configuration)?;
        let rate = self.tax_rate_in(tx.as_mut()).await?;
        tx.commit().await.map_err(ServiceError::Configuration)?;
        Ok(rate)
    }

    /// Current tax rate read inside a caller-owned transaction.
    ///
    /// When no rate is stored the default is written through `tx`, so it
    /// only sticks if the caller commits.
    pub async fn tax_rate_in(&self, tx: &mut dyn StoreTx) -> ServiceResult<Decimal> {
        let stored = tx
            .find_setting(IVA_PERCENTAGE_KEY)
            .await
            .map_err(ServiceError::Configuration)?;

        match stored {
            Some(setting) => parse_rate(&setting.value).map_err(ServiceError::Configuration),
            None => {
                tx.upsert_setting(IVA_PERCENTAGE_KEY, &self.default_tax_rate.to_string())
                    .await
                    .map_err(ServiceError::Configuration)?;
                tracing::info!(rate = %self.default_tax_rate, "Tax rate not configured, default stored");
                Ok(self.default_tax_rate)
            }
        }
    }

    /// Replace the tax rate used by future orders
    pub async fn set_tax_rate(&self, rate: Decimal) -> ServiceResult<Setting> {
        if !is_valid_rate(rate) {
            return Err(ServiceError::TaxRateOutOfRange(rate));
        }

        let value = rate.normalize().to_string();
        let mut tx = self.store.begin().await?;
        let setting = tx.upsert_setting(IVA_PERCENTAGE_KEY, &value).await?;
        tx.commit().await?;

        tracing::info!(rate = %value, "Tax rate updated");
        Ok(setting)
    }
}

fn is_valid_rate(rate: Decimal) -> bool {
    rate >= Decimal::ZERO && rate <= Decimal::ONE_HUNDRED
}

fn parse_rate(value: &str) -> Result<Decimal, RepoError> {
    Decimal::from_str(value.trim())
        .ok()
        .filter(|r| is_valid_rate(*r))
        .ok_or_else(|| RepoError::Corrupt {
            column: "settings.value",
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::SqliteStore;

    async fn service() -> (SettingService, Arc<dyn Store>) {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::in_memory().await.unwrap());
        (
            SettingService::new(store.clone(), Decimal::new(16, 0)).unwrap(),
            store,
        )
    }

    #[tokio::test]
    async fn test_default_is_seeded_on_first_read() {
        let (svc, store) = service().await;
        assert_eq!(svc.tax_rate().await.unwrap(), Decimal::new(16, 0));

        let mut tx = store.begin().await.unwrap();
        let stored = tx.find_setting(IVA_PERCENTAGE_KEY).await.unwrap().unwrap();
        assert_eq!(stored.value, "16");
    }

    #[tokio::test]
    async fn test_set_then_read() {
        let (svc, _) = service().await;
        let s = svc.set_tax_rate(Decimal::new(1250, 2)).await.unwrap();
        assert_eq!(s.value, "12.5");
        assert_eq!(svc.tax_rate().await.unwrap(), Decimal::new(125, 1));
    }

    #[tokio::test]
    async fn test_out_of_range_rejected() {
        let (svc, _) = service().await;
        assert!(matches!(
            svc.set_tax_rate(Decimal::new(101, 0)).await,
            Err(ServiceError::TaxRateOutOfRange(_))
        ));
        assert!(matches!(
            svc.set_tax_rate(Decimal::new(-1, 0)).await,
            Err(ServiceError::TaxRateOutOfRange(_))
        ));
        assert!(svc.set_tax_rate(Decimal::ZERO).await.is_ok());
        assert!(svc.set_tax_rate(Decimal::ONE_HUNDRED).await.is_ok());
    }

    #[tokio::test]
    async fn test_garbage_value_is_configuration_error() {
        let (svc, store) = service().await;
        let mut tx = store.begin().await.unwrap();
        tx.upsert_setting(IVA_PERCENTAGE_KEY, "sixteen").await.unwrap();
        tx.commit().await.unwrap();

        let err = svc.tax_rate().await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Configuration(RepoError::Corrupt { .. })
        ));
        assert_eq!(err.to_string(), "could not retrieve tax configuration");
    }

    #[tokio::test]
    async fn test_out_of_range_default_rejected() {
        let store: Arc<dyn Store> = Arc::new(SqliteStore::in_memory().await.unwrap());
        for rate in [Decimal::new(150, 0), Decimal::new(-1, 0)] {
            assert!(matches!(
                SettingService::new(store.clone(), rate),
                Err(ServiceError::TaxRateOutOfRange(r)) if r == rate
            ));
        }
        let svc = SettingService::new(store, Decimal::ONE_HUNDRED).unwrap();
        assert_eq!(svc.tax_rate().await.unwrap(), Decimal::ONE_HUNDRED);
    }

    #[test]
    fn test_parse_rate_trims() {
        assert_eq!(parse_rate(" 16 ").unwrap(), Decimal::new(16, 0));
        assert!(parse_rate("250").is_err());
    }
}
