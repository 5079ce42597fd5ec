//! Purchase Order Model

use super::{AccountPoint, Official};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    InProgress,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN_PROGRESS" => Ok(Self::InProgress),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// Order line as submitted by the caller
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OrderItemDraft {
    pub description: String,
    /// Unit of measure ("UND", "KG", "SERVICIO", ...)
    pub unit: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// Whether IVA applies to this line
    pub applies_tax: bool,
}

/// Create order payload
///
/// Memo number, amounts and the tax snapshot are computed on creation and
/// cannot be supplied.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OrderDraft {
    // Requisition
    pub memo_date: Option<NaiveDate>,
    pub requesting_unit: String,
    pub responsible_official: String,
    pub concept: String,

    // Quotation
    pub provider: String,
    /// Kind of quotation document received from the provider
    pub quote_document_type: String,
    pub budget_number: String,
    pub budget_date: Option<NaiveDate>,
    pub delivery_time: String,
    pub offer_quality: String,
    pub price_inquiry_type: String,
    pub observations: String,

    // Withholdings
    pub has_iva_retention: bool,
    pub has_islr: bool,
    pub has_itf: bool,

    // References
    pub signed_by_id: Option<i64>,
    pub account_point_id: Option<i64>,

    pub items: Vec<OrderItemDraft>,
}

/// Persisted order line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    /// Zero-based position within the order
    pub position: i32,
    pub description: String,
    pub unit: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// quantity × unit_price
    pub line_total: Decimal,
    pub applies_tax: bool,
}

/// Fully hydrated order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
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
    /// Sum of line totals
    pub base_amount: Decimal,
    /// Tax rate captured at creation time
    pub iva_percentage: Decimal,
    /// Taxable base × iva_percentage / 100
    pub tax_amount: Decimal,
    /// base_amount + tax_amount
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub created_at: i64,
    pub updated_at: i64,
    pub items: Vec<OrderItem>,
    pub signed_by: Option<Official>,
    pub account_point: Option<AccountPoint>,
}

impl Order {
    /// Sum of tax-applicable line totals
    pub fn taxable_base(&self) -> Decimal {
        self.items
            .iter()
            .filter(|i| i.applies_tax)
            .map(|i| i.line_total)
            .sum()
    }
}

/// Order list row (no items, no references)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSummary {
    pub id: i64,
    pub memo_number: String,
    pub memo_date: Option<NaiveDate>,
    pub requesting_unit: String,
    pub provider: String,
    pub concept: String,
    pub total_amount: Decimal,
    pub status: OrderStatus,
    pub created_at: i64,
}

/// Order search filters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderQuery {
    /// Matches memo number, concept, requesting unit or provider
    pub keyword: Option<String>,
    pub provider: Option<String>,
    /// Inclusive lower bound on memo date
    pub date_from: Option<NaiveDate>,
    /// Inclusive upper bound on memo date
    pub date_to: Option<NaiveDate>,
    /// 1-based page
    pub page: u32,
    pub limit: u32,
}

impl Default for OrderQuery {
    fn default() -> Self {
        Self {
            keyword: None,
            provider: None,
            date_from: None,
            date_to: None,
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

/// Page size used when the caller gives none (or zero)
pub const DEFAULT_PAGE_LIMIT: u32 = 10;

/// Largest page a single search returns
pub const MAX_PAGE_LIMIT: u32 = 100;

impl OrderQuery {
    /// Page size, falling back to the default for zero and capped at
    /// [`MAX_PAGE_LIMIT`]
    pub fn limit(&self) -> i64 {
        match self.limit {
            0 => DEFAULT_PAGE_LIMIT as i64,
            n => n.min(MAX_PAGE_LIMIT) as i64,
        }
    }

    /// Row offset for the requested page (pages below 1 read as 1).
    /// Saturates instead of overflowing for absurd page numbers.
    pub fn offset(&self) -> i64 {
        (self.page.max(1) as i64 - 1).saturating_mul(self.limit())
    }

    /// Keyword trimmed, `None` when blank
    pub fn keyword(&self) -> Option<&str> {
        self.keyword.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    /// Provider trimmed, `None` when blank
    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }
}

/// Paginated order search result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPage {
    pub orders: Vec<OrderSummary>,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_paging_defaults() {
        let q = OrderQuery::default();
        assert_eq!(q.limit(), 10);
        assert_eq!(q.offset(), 0);

        let q = OrderQuery {
            page: 3,
            limit: 25,
            ..Default::default()
        };
        assert_eq!(q.offset(), 50);

        let q = OrderQuery {
            page: 0,
            limit: 0,
            ..Default::default()
        };
        assert_eq!(q.limit(), 10);
        assert_eq!(q.offset(), 0);
    }

    #[test]
    fn test_query_extreme_paging_does_not_overflow() {
        let q = OrderQuery {
            page: u32::MAX,
            limit: u32::MAX,
            ..Default::default()
        };
        assert_eq!(q.limit(), MAX_PAGE_LIMIT as i64);
        assert_eq!(q.offset(), (u32::MAX as i64 - 1) * MAX_PAGE_LIMIT as i64);
        assert!(q.offset() > 0);

        let q = OrderQuery {
            page: 2,
            limit: 500,
            ..Default::default()
        };
        assert_eq!(q.limit(), 100);
        assert_eq!(q.offset(), 100);
    }

    #[test]
    fn test_query_blank_filters_are_ignored() {
        let q = OrderQuery {
            keyword: Some("   ".into()),
            provider: Some(" Acme ".into()),
            ..Default::default()
        };
        assert_eq!(q.keyword(), None);
        assert_eq!(q.provider(), Some("Acme"));
    }

    #[test]
    fn test_draft_deserializes_numbers_and_strings() {
        let draft: OrderDraft = serde_json::from_str(
            r#"{
                "concept": "Toner",
                "items": [
                    {"description": "Toner", "unit": "UND", "quantity": 2, "unit_price": "10.50", "applies_tax": true},
                    {"description": "Flete", "quantity": 1.5, "unit_price": 5}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(draft.items.len(), 2);
        assert_eq!(draft.items[0].unit_price, Decimal::new(1050, 2));
        assert_eq!(draft.items[1].quantity, Decimal::new(15, 1));
        assert!(!draft.items[1].applies_tax);
        assert!(draft.signed_by_id.is_none());
    }

    #[test]
    fn test_status_string_round_trip() {
        for s in [
            OrderStatus::InProgress,
            OrderStatus::Completed,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(s.as_str().parse::<OrderStatus>(), Ok(s));
        }
        assert!("DONE".parse::<OrderStatus>().is_err());
    }
}
