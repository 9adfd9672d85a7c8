//! # Sale Totals
//!
//! Pure arithmetic for pricing a sale and settling it.
//!
//! ## Where This Runs
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Pricing a Draft Sale                                 │
//! │                                                                         │
//! │  line: qty × unit_price − discount  (floored at 0)                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  line_itbis = round(line_subtotal × 18%)                               │
//! │  line_total = line_subtotal + line_itbis                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  header: subtotal = Σ qty × unit_price                                 │
//! │          taxable  = Σ line_subtotal − header_discount  (floored at 0)  │
//! │          itbis    = round(taxable × 18%)                               │
//! │          total    = taxable + itbis                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Line totals are computed exactly once, when the draft is created. Refunds
//! and cancellations never re-derive prices; they operate purely on
//! quantities, which is why the refund planner below works on quantity maps.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{PaymentMethod, TaxRate};

// =============================================================================
// Inputs
// =============================================================================

/// One priced line of a sale request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineInput {
    pub product_id: String,
    pub qty: i64,
    pub unit_price_cents: i64,
    /// Flat discount applied to this line, in cents.
    #[serde(default)]
    pub discount_cents: i64,
}

/// One requested refund quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundItem {
    pub product_id: String,
    pub qty: i64,
}

// =============================================================================
// Line / Header Totals
// =============================================================================

/// Computed amounts for a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineTotals {
    /// qty × unit_price − discount, floored at 0.
    pub subtotal_cents: i64,
    pub itbis_cents: i64,
    /// subtotal + itbis.
    pub total_cents: i64,
}

/// Computes the amounts for one line.
pub fn line_totals(line: &LineInput, rate: TaxRate) -> LineTotals {
    let gross = Money::from_cents(line.unit_price_cents).multiply_quantity(line.qty);
    let subtotal = (gross - Money::from_cents(line.discount_cents)).floor_at_zero();
    let itbis = subtotal.calculate_tax(rate);

    LineTotals {
        subtotal_cents: subtotal.cents(),
        itbis_cents: itbis.cents(),
        total_cents: (subtotal + itbis).cents(),
    }
}

/// Computed header amounts for a whole sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaleTotals {
    /// Σ qty × unit_price, before any discount.
    pub subtotal_cents: i64,
    /// The header-level discount that was applied.
    pub discount_cents: i64,
    /// ITBIS on the aggregate taxable base.
    pub itbis_cents: i64,
    /// taxable + itbis.
    pub total_cents: i64,
}

/// Computes header totals from the sale's lines and a header-level discount.
///
/// The tax is computed on the AGGREGATE taxable base, not summed from the
/// per-line ITBIS amounts, so the header invariant
/// `total == taxable + round(taxable × rate)` holds exactly.
pub fn sale_totals(lines: &[LineInput], header_discount_cents: i64, rate: TaxRate) -> SaleTotals {
    let mut subtotal = Money::zero();
    let mut line_subtotal_sum = Money::zero();

    for line in lines {
        subtotal += Money::from_cents(line.unit_price_cents).multiply_quantity(line.qty);
        line_subtotal_sum += Money::from_cents(line_totals(line, rate).subtotal_cents);
    }

    let taxable = (line_subtotal_sum - Money::from_cents(header_discount_cents)).floor_at_zero();
    let itbis = taxable.calculate_tax(rate);

    SaleTotals {
        subtotal_cents: subtotal.cents(),
        discount_cents: header_discount_cents,
        itbis_cents: itbis.cents(),
        total_cents: (taxable + itbis).cents(),
    }
}

// =============================================================================
// Settlement Amounts
// =============================================================================

/// Paid/change amounts resolved at settlement time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlementAmounts {
    pub paid_cents: i64,
    pub change_cents: i64,
}

/// Resolves the paid and change amounts for a settlement.
///
/// ## Rules
/// - CREDIT: `paid` is the initial partial payment and may be 0
/// - Every other method: `paid` must cover the total
/// - Change is only ever produced for CASH
pub fn settlement_amounts(
    total_cents: i64,
    paid_cents: i64,
    method: PaymentMethod,
) -> CoreResult<SettlementAmounts> {
    if method != PaymentMethod::Credit && paid_cents < total_cents {
        return Err(CoreError::PaidAmountTooLow {
            total_cents,
            paid_cents,
        });
    }

    let change_cents = match method {
        PaymentMethod::Cash => (paid_cents - total_cents).max(0),
        _ => 0,
    };

    Ok(SettlementAmounts {
        paid_cents,
        change_cents,
    })
}

// =============================================================================
// Quantity Aggregation & Refund Planning
// =============================================================================

/// Sums quantities per product across line items.
///
/// A BTreeMap keeps products in ascending id order, which is also the order
/// the engine touches product rows in.
pub fn aggregate_quantities<'a, I>(items: I) -> BTreeMap<String, i64>
where
    I: IntoIterator<Item = (&'a str, i64)>,
{
    let mut map: BTreeMap<String, i64> = BTreeMap::new();
    for (product_id, qty) in items {
        *map.entry(product_id.to_string()).or_insert(0) += qty;
    }
    map
}

/// Plans a refund: which quantity to restore per product.
///
/// `sold` and `already_refunded` are per-product quantity maps; the
/// already-refunded amounts come from summing prior refund movements, which
/// is what makes repeated refund calls safe to retry.
///
/// ## Behavior
/// - `requested == None`: refund everything that remains, per product
/// - Explicit items: each must be part of the sale and within what remains
/// - Products with nothing remaining are simply omitted from the plan
pub fn refund_plan(
    sold: &BTreeMap<String, i64>,
    already_refunded: &BTreeMap<String, i64>,
    requested: Option<&[RefundItem]>,
) -> CoreResult<BTreeMap<String, i64>> {
    let remaining: BTreeMap<&String, i64> = sold
        .iter()
        .map(|(pid, qty)| {
            let refunded = already_refunded.get(pid).copied().unwrap_or(0);
            (pid, qty - refunded)
        })
        .collect();

    let mut plan: BTreeMap<String, i64> = BTreeMap::new();

    match requested {
        None => {
            for (pid, qty) in remaining {
                if qty > 0 {
                    plan.insert(pid.clone(), qty);
                }
            }
        }
        Some(items) => {
            for item in items {
                let Some(&left) = remaining.get(&item.product_id) else {
                    return Err(CoreError::InvalidRefundItem {
                        product_id: item.product_id.clone(),
                    });
                };
                let already_planned = plan.get(&item.product_id).copied().unwrap_or(0);
                if item.qty <= 0 || already_planned + item.qty > left {
                    return Err(CoreError::RefundQtyExceedsRemaining {
                        product_id: item.product_id.clone(),
                        requested: already_planned + item.qty,
                        remaining: left,
                    });
                }
                *plan.entry(item.product_id.clone()).or_insert(0) += item.qty;
            }
        }
    }

    Ok(plan)
}

/// Whether any sold quantity is still un-refunded after applying a plan.
pub fn any_quantity_remaining(
    sold: &BTreeMap<String, i64>,
    already_refunded: &BTreeMap<String, i64>,
    plan: &BTreeMap<String, i64>,
) -> bool {
    sold.iter().any(|(pid, qty)| {
        let refunded = already_refunded.get(pid).copied().unwrap_or(0);
        let planned = plan.get(pid).copied().unwrap_or(0);
        qty - refunded - planned > 0
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: &str, qty: i64, unit_price_cents: i64, discount_cents: i64) -> LineInput {
        LineInput {
            product_id: product_id.to_string(),
            qty,
            unit_price_cents,
            discount_cents,
        }
    }

    #[test]
    fn test_two_units_at_100_with_18_pct() {
        // 2 × RD$100.00, no discount: subtotal 200, itbis 36, total 236
        let lines = vec![line("p1", 2, 10000, 0)];
        let totals = sale_totals(&lines, 0, TaxRate::itbis());

        assert_eq!(totals.subtotal_cents, 20000);
        assert_eq!(totals.itbis_cents, 3600);
        assert_eq!(totals.total_cents, 23600);
    }

    #[test]
    fn test_line_discount_floors_at_zero() {
        // Discount bigger than the line: free line, never negative
        let totals = line_totals(&line("p1", 1, 500, 900), TaxRate::itbis());
        assert_eq!(totals.subtotal_cents, 0);
        assert_eq!(totals.itbis_cents, 0);
        assert_eq!(totals.total_cents, 0);
    }

    #[test]
    fn test_header_discount_floors_taxable_at_zero() {
        let lines = vec![line("p1", 1, 1000, 0)];
        let totals = sale_totals(&lines, 5000, TaxRate::itbis());
        assert_eq!(totals.subtotal_cents, 1000);
        assert_eq!(totals.itbis_cents, 0);
        assert_eq!(totals.total_cents, 0);
    }

    #[test]
    fn test_total_invariant_over_many_inputs() {
        // total == taxable + round(taxable × rate) for a spread of inputs
        let rate = TaxRate::itbis();
        for qty in 1..=7 {
            for price in [1, 33, 99, 12345, 100000] {
                for discount in [0, 17, 250] {
                    let lines = vec![line("a", qty, price, discount), line("b", 2, 333, 0)];
                    let t = sale_totals(&lines, 100, rate);

                    let line_sum: i64 = lines
                        .iter()
                        .map(|l| line_totals(l, rate).subtotal_cents)
                        .sum();
                    let taxable = (line_sum - 100).max(0);
                    let expected_itbis =
                        Money::from_cents(taxable).calculate_tax(rate).cents();

                    assert_eq!(t.itbis_cents, expected_itbis);
                    assert_eq!(t.total_cents, taxable + expected_itbis);
                }
            }
        }
    }

    #[test]
    fn test_settlement_cash_change() {
        // Scenario: total 236.00, cash 300.00 → change 64.00
        let amounts = settlement_amounts(23600, 30000, PaymentMethod::Cash).unwrap();
        assert_eq!(amounts.paid_cents, 30000);
        assert_eq!(amounts.change_cents, 6400);
    }

    #[test]
    fn test_settlement_underpayment_rejected() {
        let err = settlement_amounts(23600, 20000, PaymentMethod::Card).unwrap_err();
        assert!(matches!(err, CoreError::PaidAmountTooLow { .. }));
    }

    #[test]
    fn test_settlement_credit_allows_zero_paid() {
        let amounts = settlement_amounts(23600, 0, PaymentMethod::Credit).unwrap();
        assert_eq!(amounts.paid_cents, 0);
        assert_eq!(amounts.change_cents, 0);
    }

    #[test]
    fn test_card_never_produces_change() {
        let amounts = settlement_amounts(10000, 15000, PaymentMethod::Card).unwrap();
        assert_eq!(amounts.change_cents, 0);
    }

    #[test]
    fn test_aggregate_quantities_merges_duplicate_lines() {
        let agg = aggregate_quantities([("p2", 1), ("p1", 2), ("p2", 3)]);
        assert_eq!(agg.get("p1"), Some(&2));
        assert_eq!(agg.get("p2"), Some(&4));
        // BTreeMap iterates in ascending product id order
        let ids: Vec<&String> = agg.keys().collect();
        assert_eq!(ids, vec!["p1", "p2"]);
    }

    #[test]
    fn test_refund_plan_full() {
        let sold = aggregate_quantities([("p1", 3), ("p2", 1)]);
        let refunded = BTreeMap::new();
        let plan = refund_plan(&sold, &refunded, None).unwrap();
        assert_eq!(plan.get("p1"), Some(&3));
        assert_eq!(plan.get("p2"), Some(&1));
        assert!(!any_quantity_remaining(&sold, &refunded, &plan));
    }

    #[test]
    fn test_refund_plan_partial_then_over_request() {
        let sold = aggregate_quantities([("p1", 5)]);
        let refunded = aggregate_quantities([("p1", 2)]);

        // 3 remain; asking for 4 must fail with requested vs remaining
        let err = refund_plan(
            &sold,
            &refunded,
            Some(&[RefundItem {
                product_id: "p1".to_string(),
                qty: 4,
            }]),
        )
        .unwrap_err();
        match err {
            CoreError::RefundQtyExceedsRemaining {
                requested,
                remaining,
                ..
            } => {
                assert_eq!(requested, 4);
                assert_eq!(remaining, 3);
            }
            other => panic!("unexpected error: {other}"),
        }

        // Asking for the exact remainder succeeds and leaves nothing
        let plan = refund_plan(
            &sold,
            &refunded,
            Some(&[RefundItem {
                product_id: "p1".to_string(),
                qty: 3,
            }]),
        )
        .unwrap();
        assert!(!any_quantity_remaining(&sold, &refunded, &plan));
    }

    #[test]
    fn test_refund_plan_rejects_foreign_product() {
        let sold = aggregate_quantities([("p1", 5)]);
        let err = refund_plan(
            &sold,
            &BTreeMap::new(),
            Some(&[RefundItem {
                product_id: "p9".to_string(),
                qty: 1,
            }]),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidRefundItem { .. }));
    }

    #[test]
    fn test_refund_plan_second_full_refund_is_empty() {
        let sold = aggregate_quantities([("p1", 3)]);
        let refunded = aggregate_quantities([("p1", 3)]);
        let plan = refund_plan(&sold, &refunded, None).unwrap();
        assert!(plan.is_empty());
    }
}
