//! Sequence allocator
//!
//! Issues `TYPE-YEAR-SEQUENCE` document numbers from per-`(type, year)`
//! counters. There is no in-process cache: every number comes from a locked
//! read-increment-write on the store, inside whatever transaction the caller
//! provides, so a rolled-back consumer never burns a number.

use crate::db::{Store, StoreTx};
use crate::utils::{MAX_YEAR, MIN_YEAR, ServiceError, ServiceResult};
use serde::{Deserialize, Serialize};
use shared::models::{Counter, CounterKey, DocumentNumber};
use shared::util::current_year;
use std::sync::Arc;

/// Acknowledgement returned by [`SequenceAllocator::annual_reset`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetAck {
    pub year: i32,
    pub message: String,
}

#[derive(Clone)]
pub struct SequenceAllocator {
    store: Arc<dyn Store>,
}

impl SequenceAllocator {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Allocate the next number inside a caller-owned transaction.
    ///
    /// The counter stays locked until `tx` commits or rolls back.
    pub async fn next_in(
        &self,
        tx: &mut dyn StoreTx,
        document_type: &str,
        year: i32,
    ) -> ServiceResult<DocumentNumber> {
        let document_type = validate_document_type(document_type)?;
        let key = CounterKey::new(document_type, year);

        let sequence = tx.next_sequence(&key).await.map_err(|e| {
            tracing::error!(counter = %key, error = %e, "Sequence allocation failed");
            ServiceError::Numbering(e)
        })?;

        tracing::debug!(counter = %key, sequence, "Sequence allocated");
        // next_sequence only ever returns values >= 1
        Ok(DocumentNumber::new(document_type, year, sequence.unsigned_abs()))
    }

    /// Allocate in a transaction of its own and return the raw sequence
    pub async fn allocate(&self, document_type: &str, year: i32) -> ServiceResult<u64> {
        let number = self.allocate_number(document_type, year).await?;
        Ok(number.sequence)
    }

    /// Allocate for the current calendar year and return the formatted number
    pub async fn next_document_number(&self, document_type: &str) -> ServiceResult<DocumentNumber> {
        self.allocate_number(document_type, current_year()).await
    }

    async fn allocate_number(&self, document_type: &str, year: i32) -> ServiceResult<DocumentNumber> {
        let mut tx = self.store.begin().await.map_err(ServiceError::Numbering)?;
        let number = self.next_in(tx.as_mut(), document_type, year).await?;
        tx.commit().await.map_err(ServiceError::Numbering)?;

        tracing::info!(number = %number, "Document number issued");
        Ok(number)
    }

    /// Current state of one counter, `None` before its first allocation
    pub async fn counter(&self, document_type: &str, year: i32) -> ServiceResult<Option<Counter>> {
        let key = CounterKey::new(document_type, year);
        let mut tx = self.store.begin().await?;
        let counter = tx.find_counter(&key).await?;
        tx.commit().await?;
        Ok(counter)
    }

    /// All counters, optionally for one year only
    pub async fn counters(&self, year: Option<i32>) -> ServiceResult<Vec<Counter>> {
        let mut tx = self.store.begin().await?;
        let counters = tx.list_counters(year).await?;
        tx.commit().await?;
        Ok(counters)
    }

    /// Acknowledge a year-end reset.
    ///
    /// Counters are keyed by year, so the first allocation of a new year
    /// starts at 1 on its own. Nothing is written and no rows are created.
    /// Years before the first numbered series, or past four digits, are
    /// rejected.
    pub fn annual_reset(&self, year: i32) -> ServiceResult<ResetAck> {
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(ServiceError::InvalidYear(year));
        }
        tracing::info!(year, "Annual reset requested; counters are created on demand");
        Ok(ResetAck {
            year,
            message: format!(
                "Reset acknowledged for {year}: new counters will be generated on demand"
            ),
        })
    }
}

fn validate_document_type(document_type: &str) -> ServiceResult<&str> {
    let trimmed = document_type.trim();
    if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
        return Err(ServiceError::InvalidDocumentType(document_type.to_string()));
    }
    Ok(trimmed)
}
