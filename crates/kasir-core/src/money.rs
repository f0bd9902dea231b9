//! # Money Module
//!
//! Provides the `Money` and `Rate` types for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units                                      │
//! │    IDR has no minor unit, so 15000 means Rp15.000                       │
//! │    USD would use cents, so 1099 means $10.99                            │
//! │    Rates are basis points: 1100 bps = 11%                               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use kasir_core::money::{Money, Rate};
//!
//! let price = Money::from_minor(15_000);
//! let line = price.multiply_quantity(3);
//! assert_eq!(line.minor(), 45_000);
//!
//! let tax = Rate::from_bps(1100).portion_of(line);
//! assert_eq!(tax.minor(), 4_950);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit of the store currency.
///
/// ## Design Decisions
/// - **i64 (signed)**: Variance at shift close can be negative
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - The currency itself lives in [`StoreSettings`](crate::StoreSettings)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use kasir_core::money::Money;
    ///
    /// let unit_price = Money::from_minor(2_500);
    /// assert_eq!(unit_price.multiply_quantity(4).minor(), 10_000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// Display shows the raw minor units; use
/// [`StoreSettings::format_amount`](crate::StoreSettings::format_amount)
/// for anything a person reads.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Rate
// =============================================================================

/// A percentage represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1100 bps = 11% (Indonesian VAT), 825 bps = 8.25%
///
/// Used for both the store discount and the store tax.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rate(u32);

impl Rate {
    /// 100% in basis points.
    pub const FULL_BPS: u32 = 10_000;

    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Creates a rate from a percentage (for configuration files).
    ///
    /// Negative percentages clamp to zero.
    pub fn from_percentage(pct: f64) -> Self {
        Rate((pct * 100.0).round().max(0.0) as u32)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    /// Caps the rate at 100%.
    #[inline]
    pub fn min_full(self) -> Self {
        Rate(self.0.min(Self::FULL_BPS))
    }

    /// Returns `amount × rate`, rounded half up to the nearest minor unit.
    ///
    /// ## Implementation
    /// Integer math: `(amount * bps + 5000) / 10000`, widened to i128 so
    /// large totals cannot overflow.
    ///
    /// ## Example
    /// ```rust
    /// use kasir_core::money::{Money, Rate};
    ///
    /// // 8.25% of 1000 = 82.5 → 83
    /// assert_eq!(Rate::from_bps(825).portion_of(Money::from_minor(1000)).minor(), 83);
    /// ```
    pub fn portion_of(&self, amount: Money) -> Money {
        let portion = (amount.minor() as i128 * self.0 as i128 + 5_000) / 10_000;
        Money::from_minor(portion as i64)
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_minor() {
        let money = Money::from_minor(15_000);
        assert_eq!(money.minor(), 15_000);
        assert_eq!(format!("{}", money), "15000");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_minor(1000);
        let b = Money::from_minor(500);

        assert_eq!((a + b).minor(), 1500);
        assert_eq!((b - a).minor(), -500);
        assert!((b - a).is_negative());

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.minor(), 2000);
    }

    #[test]
    fn test_rate_from_percentage() {
        assert_eq!(Rate::from_percentage(11.0).bps(), 1100);
        assert_eq!(Rate::from_percentage(8.25).bps(), 825);
        assert_eq!(Rate::from_percentage(-5.0).bps(), 0);
        assert!((Rate::from_bps(825).percentage() - 8.25).abs() < 0.001);
    }

    #[test]
    fn test_portion_rounds_half_up() {
        let amount = Money::from_minor(1000);
        assert_eq!(Rate::from_bps(1000).portion_of(amount).minor(), 100);
        assert_eq!(Rate::from_bps(825).portion_of(amount).minor(), 83);
        assert_eq!(Rate::from_bps(824).portion_of(amount).minor(), 82);
        assert_eq!(Rate::zero().portion_of(amount).minor(), 0);
    }

    #[test]
    fn test_portion_does_not_overflow() {
        let amount = Money::from_minor(i64::MAX / 2);
        let portion = Rate::from_bps(Rate::FULL_BPS).portion_of(amount);
        assert_eq!(portion, amount);
    }
}
