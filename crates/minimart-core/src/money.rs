//! # Money Module
//!
//! Integer-backed monetary values for totals, prices, and discounts.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  In floating point:  0.1 + 0.2 = 0.30000000000000004                │
//! │                                                                     │
//! │  OUR SOLUTION: the smallest currency unit in an i64.                │
//! │  Subtotals, discount amounts, and change are exact integer          │
//! │  arithmetic; any rounding (percentage discounts) is explicit.       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every monetary value in the system (catalog prices, line totals,
//! discount amounts, cash received, change) flows through this type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit.
///
/// Signed so refunds, reversals, and negative change amounts are
/// representable; workflows that must reject negatives check explicitly.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a value from the smallest currency unit.
    #[inline]
    pub const fn new(amount: i64) -> Self {
        Money(amount)
    }

    /// Returns the raw amount in the smallest currency unit.
    #[inline]
    pub const fn amount(&self) -> i64 {
        self.0
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies a unit price by a quantity to form a line total.
    ///
    /// ## Example
    /// ```rust
    /// use minimart_core::money::Money;
    ///
    /// let unit_price = Money::new(12_000);
    /// assert_eq!(unit_price.multiply_quantity(3).amount(), 36_000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Computes `percent` percent of this amount, truncating toward zero.
    ///
    /// Used by the discount engine: 10% of 100,000 is 10,000. Intermediate
    /// math is i128 so large subtotals cannot overflow.
    pub fn percentage(&self, percent: i64) -> Money {
        let part = (self.0 as i128 * percent as i128) / 100;
        Money(part as i64)
    }

    /// Returns the smaller of two amounts.
    ///
    /// Caps fixed-amount discounts at the payable total.
    #[inline]
    pub fn min(self, other: Money) -> Money {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Debug-friendly display of the raw minor-unit amount. Client-side
/// formatting owns localization and currency symbols.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
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

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// Summing line totals into a subtotal.
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_and_amount() {
        let m = Money::new(12_500);
        assert_eq!(m.amount(), 12_500);
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::new(1_000);
        let b = Money::new(400);

        assert_eq!((a + b).amount(), 1_400);
        assert_eq!((a - b).amount(), 600);
        assert_eq!((a * 3).amount(), 3_000);
    }

    #[test]
    fn test_sum_of_line_totals() {
        let subtotal: Money = [Money::new(500), Money::new(1_500), Money::new(2_000)]
            .into_iter()
            .sum();
        assert_eq!(subtotal.amount(), 4_000);
    }

    #[test]
    fn test_percentage() {
        assert_eq!(Money::new(100_000).percentage(10).amount(), 10_000);
        // Truncation toward zero, not rounding
        assert_eq!(Money::new(999).percentage(10).amount(), 99);
        assert_eq!(Money::new(0).percentage(50).amount(), 0);
    }

    #[test]
    fn test_min_caps_amount() {
        let cap = Money::new(30_000);
        assert_eq!(Money::new(50_000).min(cap).amount(), 30_000);
        assert_eq!(Money::new(10_000).min(cap).amount(), 10_000);
    }

    #[test]
    fn test_sign_checks() {
        assert!(Money::zero().is_zero());
        assert!(Money::new(5).is_positive());
        assert!(Money::new(-5).is_negative());
    }

    #[test]
    fn test_change_can_go_negative() {
        // cash_received - total_amount may be negative; the checkout
        // workflow records it rather than rejecting it.
        let change = Money::new(20_000) - Money::new(25_000);
        assert_eq!(change.amount(), -5_000);
        assert!(change.is_negative());
    }
}
