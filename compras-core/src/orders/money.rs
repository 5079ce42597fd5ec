//! Order amount calculation using rust_decimal
//!
//! Amounts are exact: no rounding is applied at any step, so
//! `total_amount == base_amount + tax_amount` holds to the last digit. Every
//! operation is checked; an overflow becomes [`ServiceError::Computation`]
//! instead of a panic.

use crate::utils::{ServiceError, ServiceResult};
use rust_decimal::Decimal;
use shared::models::OrderItemDraft;

/// Computed amounts for a draft
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderTotals {
    /// `quantity × unit_price`, one per item in draft order
    pub line_totals: Vec<Decimal>,
    /// Sum of all line totals
    pub base_amount: Decimal,
    /// Sum of line totals whose item applies tax
    pub taxable_base: Decimal,
    /// Rate used, captured as the order's snapshot
    pub iva_percentage: Decimal,
    /// `taxable_base × iva_percentage / 100`
    pub tax_amount: Decimal,
    /// `base_amount + tax_amount`
    pub total_amount: Decimal,
}

/// Line total for one item
pub fn line_total(item: &OrderItemDraft, position: usize) -> ServiceResult<Decimal> {
    item.quantity.checked_mul(item.unit_price).ok_or_else(|| {
        ServiceError::Computation(format!(
            "item #{position}: {} × {}",
            item.quantity, item.unit_price
        ))
    })
}

/// Tax on a base at a percentage rate
pub fn tax_on(base: Decimal, rate_percent: Decimal) -> ServiceResult<Decimal> {
    base.checked_mul(rate_percent)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .ok_or_else(|| ServiceError::Computation(format!("tax on {base} at {rate_percent}%")))
}

/// Compute every amount of an order
pub fn compute_totals(
    items: &[OrderItemDraft],
    iva_percentage: Decimal,
) -> ServiceResult<OrderTotals> {
    let mut line_totals = Vec::with_capacity(items.len());
    let mut base_amount = Decimal::ZERO;
    let mut taxable_base = Decimal::ZERO;

    for (position, item) in items.iter().enumerate() {
        let total = line_total(item, position)?;
        base_amount = base_amount
            .checked_add(total)
            .ok_or_else(|| ServiceError::Computation("base amount".into()))?;
        if item.applies_tax {
            taxable_base = taxable_base
                .checked_add(total)
                .ok_or_else(|| ServiceError::Computation("taxable base".into()))?;
        }
        line_totals.push(total);
    }

    let tax_amount = tax_on(taxable_base, iva_percentage)?;
    let total_amount = base_amount
        .checked_add(tax_amount)
        .ok_or_else(|| ServiceError::Computation("total amount".into()))?;

    Ok(OrderTotals {
        line_totals,
        base_amount,
        taxable_base,
        iva_percentage,
        tax_amount,
        total_amount,
    })
}
