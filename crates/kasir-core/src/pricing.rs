//! # Pricing
//!
//! Turns a validated cart plus catalog rows into priced lines and order
//! totals.
//!
//! ## Calculation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  subtotal  = Σ quantity × catalog price                                 │
//! │  discount  = round(subtotal × discount%)                                │
//! │  total     = round(subtotal × (1 − discount%) × (1 + tax%))             │
//! │  tax       = total − (subtotal − discount)                              │
//! │                                                                         │
//! │  Discount is applied first, tax is charged on the discounted base.      │
//! │  Deriving tax from the rounded total keeps                              │
//! │      total = subtotal − discount + tax                                  │
//! │  exact, with a single rounding step on the total.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, Rate};
use crate::types::{CartLine, Product};

// =============================================================================
// Priced Line
// =============================================================================

/// A cart line after server-side pricing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricedLine {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: i64,
    pub line_total: i64,
}

/// Prices a cart against catalog rows and checks stock.
///
/// ## Arguments
/// * `lines` - validated cart lines, in the order the cashier entered them
/// * `products` - catalog rows for those lines (any order)
/// * `reserved` - quantities already reserved for this cart by a hold being
///   resumed, keyed by product id; they count as available
///
/// ## Errors
/// * `ProductNotFound` - a line references a missing or inactive product
/// * `OutOfStock` - the first line (in cart order) whose quantity exceeds
///   `stock + reserved`
pub fn price_cart(
    lines: &[CartLine],
    products: &[Product],
    reserved: &HashMap<String, i64>,
) -> CoreResult<Vec<PricedLine>> {
    let by_id: HashMap<&str, &Product> = products
        .iter()
        .filter(|p| p.is_active)
        .map(|p| (p.id.as_str(), p))
        .collect();

    lines
        .iter()
        .map(|line| {
            let product = by_id
                .get(line.product_id.as_str())
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

            let available = product.stock + reserved.get(&product.id).copied().unwrap_or(0);
            if available < line.quantity {
                return Err(CoreError::OutOfStock {
                    sku: product.sku.clone(),
                    available,
                    requested: line.quantity,
                });
            }

            Ok(PricedLine {
                product_id: product.id.clone(),
                sku: product.sku.clone(),
                name: product.name.clone(),
                quantity: line.quantity,
                unit_price: product.price,
                line_total: product.price().multiply_quantity(line.quantity).minor(),
            })
        })
        .collect()
}

// =============================================================================
// Order Totals
// =============================================================================

/// Header amounts of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderTotals {
    pub subtotal: i64,
    pub discount_amount: i64,
    pub tax_amount: i64,
    pub total: i64,
}

/// Computes discount, tax and total from a subtotal.
///
/// The total is rounded half up once, from the exact product
/// `subtotal × (10000 − discount_bps) × (10000 + tax_bps) / 10⁸`.
pub fn compute_totals(subtotal: Money, discount: Rate, tax: Rate) -> OrderTotals {
    let discount_amount = discount.portion_of(subtotal);

    let scale: i128 = (Rate::FULL_BPS as i128) * (Rate::FULL_BPS as i128);
    let keep = Rate::FULL_BPS as i128 - discount.bps().min(Rate::FULL_BPS) as i128;
    let grow = Rate::FULL_BPS as i128 + tax.bps() as i128;
    let total = (subtotal.minor() as i128 * keep * grow + scale / 2) / scale;
    let total = total as i64;

    let base = subtotal - discount_amount;
    OrderTotals {
        subtotal: subtotal.minor(),
        discount_amount: discount_amount.minor(),
        tax_amount: total - base.minor(),
        total,
    }
}

/// Totals for already-priced lines.
pub fn totals_for_lines(lines: &[PricedLine], discount: Rate, tax: Rate) -> OrderTotals {
    let subtotal: Money = lines.iter().map(|l| Money::from_minor(l.line_total)).sum();
    compute_totals(subtotal, discount, tax)
}

/// Returns the change owed for a cash payment.
///
/// ## Errors
/// * `InsufficientPayment` - `tendered < total`
pub fn cash_change(total: Money, tendered: Money) -> CoreResult<Money> {
    if tendered < total {
        return Err(CoreError::InsufficientPayment {
            total: total.minor(),
            tendered: tendered.minor(),
        });
    }
    Ok(tendered - total)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn product(id: &str, price: i64, stock: i64) -> Product {
        Product {
            id: id.to_string(),
            sku: format!("SKU-{}", id),
            name: format!("Product {}", id),
            price,
            stock,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_price_cart_uses_catalog_price() {
        let products = vec![product("a", 12_000, 10), product("b", 3_500, 10)];
        let lines = vec![CartLine::new("b", 2), CartLine::new("a", 1)];

        let priced = price_cart(&lines, &products, &HashMap::new()).unwrap();

        assert_eq!(priced.len(), 2);
        assert_eq!(priced[0].product_id, "b");
        assert_eq!(priced[0].unit_price, 3_500);
        assert_eq!(priced[0].line_total, 7_000);
        assert_eq!(priced[1].line_total, 12_000);
    }

    #[test]
    fn test_price_cart_names_first_short_sku() {
        let products = vec![product("a", 100, 1), product("b", 100, 0)];
        let lines = vec![CartLine::new("a", 2), CartLine::new("b", 1)];

        match price_cart(&lines, &products, &HashMap::new()) {
            Err(CoreError::OutOfStock {
                sku,
                available,
                requested,
            }) => {
                assert_eq!(sku, "SKU-a");
                assert_eq!(available, 1);
                assert_eq!(requested, 2);
            }
            other => panic!("expected OutOfStock, got {:?}", other),
        }
    }

    #[test]
    fn test_price_cart_counts_reserved_stock() {
        let products = vec![product("a", 100, 0)];
        let lines = vec![CartLine::new("a", 3)];
        let reserved = HashMap::from([("a".to_string(), 3)]);

        assert!(price_cart(&lines, &products, &reserved).is_ok());
        assert!(price_cart(&[CartLine::new("a", 4)], &products, &reserved).is_err());
    }

    #[test]
    fn test_price_cart_rejects_inactive_and_missing() {
        let mut inactive = product("a", 100, 5);
        inactive.is_active = false;

        assert!(matches!(
            price_cart(&[CartLine::new("a", 1)], &[inactive], &HashMap::new()),
            Err(CoreError::ProductNotFound(_))
        ));
        assert!(matches!(
            price_cart(&[CartLine::new("zzz", 1)], &[], &HashMap::new()),
            Err(CoreError::ProductNotFound(_))
        ));
    }

    #[test]
    fn test_compute_totals_discount_then_tax() {
        let totals = compute_totals(
            Money::from_minor(200_000),
            Rate::from_bps(500),
            Rate::from_bps(1100),
        );
        // 200000 - 10000 = 190000, + 11% = 210900
        assert_eq!(totals.discount_amount, 10_000);
        assert_eq!(totals.tax_amount, 20_900);
        assert_eq!(totals.total, 210_900);
    }

    #[test]
    fn test_compute_totals_without_rates() {
        let totals = compute_totals(Money::from_minor(4_321), Rate::zero(), Rate::zero());
        assert_eq!(totals.total, 4_321);
        assert_eq!(totals.discount_amount, 0);
        assert_eq!(totals.tax_amount, 0);
    }

    #[test]
    fn test_cash_change() {
        let change = cash_change(Money::from_minor(9_500), Money::from_minor(10_000)).unwrap();
        assert_eq!(change.minor(), 500);

        let exact = cash_change(Money::from_minor(9_500), Money::from_minor(9_500)).unwrap();
        assert!(exact.is_zero());

        assert!(matches!(
            cash_change(Money::from_minor(9_500), Money::from_minor(9_000)),
            Err(CoreError::InsufficientPayment { .. })
        ));
    }

    proptest! {
        #[test]
        fn total_matches_single_rounding(
            prices in proptest::collection::vec((1_i64..2_000_000, 1_i64..50), 1..20),
            discount_bps in 0_u32..=10_000,
            tax_bps in 0_u32..=5_000,
        ) {
            let lines: Vec<PricedLine> = prices
                .iter()
                .enumerate()
                .map(|(i, (price, qty))| PricedLine {
                    product_id: i.to_string(),
                    sku: format!("S{}", i),
                    name: String::new(),
                    quantity: *qty,
                    unit_price: *price,
                    line_total: price * qty,
                })
                .collect();

            let totals = totals_for_lines(&lines, Rate::from_bps(discount_bps), Rate::from_bps(tax_bps));
            let subtotal: i64 = prices.iter().map(|(p, q)| p * q).sum();

            let exact = subtotal as f64
                * (1.0 - discount_bps as f64 / 10_000.0)
                * (1.0 + tax_bps as f64 / 10_000.0);
            prop_assert!((totals.total as f64 - exact).abs() <= 0.5 + 1e-6 * exact.max(1.0));

            prop_assert_eq!(totals.subtotal, subtotal);
            prop_assert_eq!(
                totals.total,
                totals.subtotal - totals.discount_amount + totals.tax_amount
            );
            prop_assert!(totals.discount_amount >= 0);
            prop_assert!(totals.tax_amount >= 0);
            prop_assert!(totals.total >= 0);
        }

        #[test]
        fn change_is_never_negative(total in 0_i64..10_000_000, extra in 0_i64..1_000_000) {
            let change = cash_change(Money::from_minor(total), Money::from_minor(total + extra)).unwrap();
            prop_assert_eq!(change.minor(), extra);
        }
    }
}
