//! # Shift Arithmetic
//!
//! The derived figures of a cash-drawer shift. Nothing here is stored; the
//! ledger recomputes them from paid orders whenever a summary is asked for.
//!
//! ```text
//! expected_cash = opening_cash + cash_total
//! variance      = closing_cash - expected_cash     (+ over, - short)
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::Shift;

/// Paid-order aggregates for one shift window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ShiftTotals {
    pub cash_total: i64,
    pub wallet_total: i64,
    pub transaction_count: i64,
}

/// A shift plus its derived totals.
///
/// `closing_cash` and `variance` are `None` for a shift that is still open
/// (an X-report).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ShiftSummary {
    pub shift: Shift,
    pub cash_total: i64,
    pub wallet_total: i64,
    pub transaction_count: i64,
    pub expected_cash: i64,
    pub closing_cash: Option<i64>,
    pub variance: Option<i64>,
}

impl ShiftSummary {
    /// Combines a shift row with the aggregates of its window.
    ///
    /// ## Example
    /// ```rust
    /// use chrono::Utc;
    /// use kasir_core::shift::{ShiftSummary, ShiftTotals};
    /// use kasir_core::Shift;
    ///
    /// let shift = Shift {
    ///     id: "s-1".into(),
    ///     user_id: "u-1".into(),
    ///     opening_cash: 100_000,
    ///     closing_cash: Some(148_000),
    ///     notes: None,
    ///     started_at: Utc::now(),
    ///     ended_at: Some(Utc::now()),
    /// };
    /// let totals = ShiftTotals { cash_total: 50_000, wallet_total: 20_000, transaction_count: 3 };
    ///
    /// let summary = ShiftSummary::compute(shift, totals);
    /// assert_eq!(summary.expected_cash, 150_000);
    /// assert_eq!(summary.variance, Some(-2_000));
    /// ```
    pub fn compute(shift: Shift, totals: ShiftTotals) -> Self {
        let expected_cash = shift.opening_cash + totals.cash_total;
        let closing_cash = shift.closing_cash;

        ShiftSummary {
            cash_total: totals.cash_total,
            wallet_total: totals.wallet_total,
            transaction_count: totals.transaction_count,
            expected_cash,
            closing_cash,
            variance: closing_cash.map(|closing| closing - expected_cash),
            shift,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn shift(opening: i64, closing: Option<i64>) -> Shift {
        Shift {
            id: "s-1".to_string(),
            user_id: "u-1".to_string(),
            opening_cash: opening,
            closing_cash: closing,
            notes: None,
            started_at: Utc::now(),
            ended_at: closing.map(|_| Utc::now()),
        }
    }

    #[test]
    fn test_open_shift_has_no_variance() {
        let summary = ShiftSummary::compute(
            shift(50_000, None),
            ShiftTotals {
                cash_total: 10_000,
                wallet_total: 0,
                transaction_count: 1,
            },
        );
        assert_eq!(summary.expected_cash, 60_000);
        assert_eq!(summary.variance, None);
    }

    #[test]
    fn test_cash_over() {
        let summary = ShiftSummary::compute(shift(0, Some(12_500)), ShiftTotals {
            cash_total: 12_000,
            wallet_total: 99_000,
            transaction_count: 4,
        });
        assert_eq!(summary.expected_cash, 12_000);
        assert_eq!(summary.variance, Some(500));
    }

    proptest! {
        #[test]
        fn variance_follows_postings(
            opening in 0_i64..10_000_000,
            cash_orders in proptest::collection::vec(1_i64..5_000_000, 0..30),
            wallet_orders in proptest::collection::vec(1_i64..5_000_000, 0..30),
            closing in 0_i64..200_000_000,
        ) {
            let totals = ShiftTotals {
                cash_total: cash_orders.iter().sum(),
                wallet_total: wallet_orders.iter().sum(),
                transaction_count: (cash_orders.len() + wallet_orders.len()) as i64,
            };
            let summary = ShiftSummary::compute(shift(opening, Some(closing)), totals);

            prop_assert_eq!(summary.expected_cash, opening + cash_orders.iter().sum::<i64>());
            prop_assert_eq!(summary.variance, Some(closing - summary.expected_cash));
        }
    }
}
