//! Row records shared by both backends
//!
//! Enum columns are stored as text and parsed here so a bad value surfaces as
//! [`RepoError::Corrupt`] instead of a decode panic further up.

use super::{RepoError, RepoResult};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::models::{
    AccountPoint, AccountPointStatus, Official, Order, OrderItem, OrderStatus, OrderSummary,
};
use std::str::FromStr;

pub(crate) const ORDER_COLUMNS: &str = "id, memo_number, memo_date, requesting_unit, \
     responsible_official, concept, provider, quote_document_type, budget_number, budget_date, \
     delivery_time, offer_quality, price_inquiry_type, observations, has_iva_retention, has_islr, \
     has_itf, signed_by_id, account_point_id, base_amount, tax_percentage_snapshot, tax_amount, \
     total_amount, status, created_at, updated_at";

pub(crate) const ORDER_SUMMARY_COLUMNS: &str =
    "id, memo_number, memo_date, requesting_unit, provider, concept, total_amount, status, created_at";

pub(crate) const ORDER_ITEM_COLUMNS: &str =
    "id, order_id, position, description, unit, quantity, unit_price, line_total, applies_tax";

pub(crate) const ACCOUNT_POINT_COLUMNS: &str = "id, account_number, date, subject, synthesis, \
     programmatic_category, uel, status, created_at";

pub(crate) const OFFICIAL_COLUMNS: &str = "id, full_name, position, unit, is_active, created_at";

pub(crate) fn parse_order_status(value: &str) -> RepoResult<OrderStatus> {
    OrderStatus::from_str(value).map_err(|_| RepoError::Corrupt {
        column: "orders.status",
        value: value.to_string(),
    })
}

/// Account point row (identical on both backends)
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct AccountPointRow {
    pub id: i64,
    pub account_number: String,
    pub date: NaiveDate,
    pub subject: String,
    pub synthesis: String,
    pub programmatic_category: String,
    pub uel: String,
    pub status: String,
    pub created_at: i64,
}

impl TryFrom<AccountPointRow> for AccountPoint {
    type Error = RepoError;

    fn try_from(row: AccountPointRow) -> RepoResult<Self> {
        let status =
            AccountPointStatus::from_str(&row.status).map_err(|_| RepoError::Corrupt {
                column: "account_points.status",
                value: row.status.clone(),
            })?;
        Ok(AccountPoint {
            id: row.id,
            account_number: row.account_number,
            date: row.date,
            subject: row.subject,
            synthesis: row.synthesis,
            programmatic_category: row.programmatic_category,
            uel: row.uel,
            status,
            created_at: row.created_at,
        })
    }
}

/// Order header with decoded amounts
///
/// PostgreSQL decodes this directly; SQLite goes through its text row first.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct OrderRecord {
    pub id: i64,
    pub memo_number: String,
    pub memo_date: Option<NaiveDate>,
    pub requesting_unit: String,
    pub responsible_official: String,
    pub concept: String,
    pub provider: String,
    pub quote_document_type: String,
    pub budget_number: String,
    pub budget_date: Option<NaiveDate>,
    pub delivery_time: String,
    pub offer_quality: String,
    pub price_inquiry_type: String,
    pub observations: String,
    pub has_iva_retention: bool,
    pub has_islr: bool,
    pub has_itf: bool,
    pub signed_by_id: Option<i64>,
    pub account_point_id: Option<i64>,
    pub base_amount: Decimal,
    pub tax_percentage_snapshot: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub status: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl OrderRecord {
    /// Attach the hydrated children
    pub fn into_order(
        self,
        items: Vec<OrderItem>,
        signed_by: Option<Official>,
        account_point: Option<AccountPoint>,
    ) -> RepoResult<Order> {
        let status = parse_order_status(&self.status)?;
        Ok(Order {
            id: self.id,
            memo_number: self.memo_number,
            memo_date: self.memo_date,
            requesting_unit: self.requesting_unit,
            responsible_official: self.responsible_official,
            concept: self.concept,
            provider: self.provider,
            quote_document_type: self.quote_document_type,
            budget_number: self.budget_number,
            budget_date: self.budget_date,
            delivery_time: self.delivery_time,
            offer_quality: self.offer_quality,
            price_inquiry_type: self.price_inquiry_type,
            observations: self.observations,
            has_iva_retention: self.has_iva_retention,
            has_islr: self.has_islr,
            has_itf: self.has_itf,
            signed_by_id: self.signed_by_id,
            account_point_id: self.account_point_id,
            base_amount: self.base_amount,
            iva_percentage: self.tax_percentage_snapshot,
            tax_amount: self.tax_amount,
            total_amount: self.total_amount,
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
            items,
            signed_by,
            account_point,
        })
    }
}

/// Order list row with decoded total
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct OrderSummaryRecord {
    pub id: i64,
    pub memo_number: String,
    pub memo_date: Option<NaiveDate>,
    pub requesting_unit: String,
    pub provider: String,
    pub concept: String,
    pub total_amount: Decimal,
    pub status: String,
    pub created_at: i64,
}

impl TryFrom<OrderSummaryRecord> for OrderSummary {
    type Error = RepoError;

    fn try_from(row: OrderSummaryRecord) -> RepoResult<Self> {
        Ok(OrderSummary {
            status: parse_order_status(&row.status)?,
            id: row.id,
            memo_number: row.memo_number,
            memo_date: row.memo_date,
            requesting_unit: row.requesting_unit,
            provider: row.provider,
            concept: row.concept,
            total_amount: row.total_amount,
            created_at: row.created_at,
        })
    }
}
