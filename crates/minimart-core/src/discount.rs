//! # Discount Engine
//!
//! Pure discount arithmetic and availability rules. The database layer
//! resolves the discount row; everything here is a function of the record,
//! the base amount, and a date supplied by the caller.
//!
//! ## Rules
//! - `percentage`: reduction = base × value / 100 (integer, truncating)
//! - `amount`: reduction = min(value, base); never exceeds the payable total
//! - A discount is usable only while `is_active` AND the given date falls
//!   inside `[start_date, end_date]` (inclusive). Anything else is a
//!   `DiscountUnavailable` error, never a silent zero.

use chrono::NaiveDate;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Discount, DiscountType};

impl Discount {
    /// Whether this discount may be applied on `date`.
    pub fn is_available_on(&self, date: NaiveDate) -> bool {
        self.is_active && self.start_date <= date && date <= self.end_date
    }

    /// The monetary reduction this discount yields on `base`.
    ///
    /// Does not check availability; callers go through [`resolve_reduction`]
    /// on the checkout path.
    pub fn reduction(&self, base: Money) -> Money {
        match self.discount_type {
            DiscountType::Percentage => base.percentage(self.discount_value),
            DiscountType::Amount => Money::new(self.discount_value).min(base),
        }
    }
}

/// Resolves the reduction for a discount on `date`, rejecting unavailable
/// discounts loudly.
pub fn resolve_reduction(discount: &Discount, base: Money, date: NaiveDate) -> CoreResult<Money> {
    if !discount.is_available_on(date) {
        return Err(CoreError::DiscountUnavailable {
            name: discount.discount_name.clone(),
        });
    }
    Ok(discount.reduction(base))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample(discount_type: DiscountType, value: i64) -> Discount {
        Discount {
            discount_id: "d-1".to_string(),
            discount_name: "Grand Opening".to_string(),
            discount_type,
            discount_value: value,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 12, 31).unwrap(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn mid_window() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 15).unwrap()
    }

    #[test]
    fn test_percentage_reduction() {
        let d = sample(DiscountType::Percentage, 10);
        let reduction = resolve_reduction(&d, Money::new(100_000), mid_window()).unwrap();
        assert_eq!(reduction.amount(), 10_000);
        // total = subtotal - reduction
        assert_eq!((Money::new(100_000) - reduction).amount(), 90_000);
    }

    #[test]
    fn test_amount_reduction_capped_at_base() {
        let d = sample(DiscountType::Amount, 50_000);
        let reduction = resolve_reduction(&d, Money::new(30_000), mid_window()).unwrap();
        assert_eq!(reduction.amount(), 30_000);
        assert_eq!((Money::new(30_000) - reduction).amount(), 0);
    }

    #[test]
    fn test_amount_reduction_below_base() {
        let d = sample(DiscountType::Amount, 5_000);
        assert_eq!(d.reduction(Money::new(30_000)).amount(), 5_000);
    }

    #[test]
    fn test_window_is_inclusive() {
        let d = sample(DiscountType::Percentage, 10);
        assert!(d.is_available_on(d.start_date));
        assert!(d.is_available_on(d.end_date));
        assert!(!d.is_available_on(d.start_date.pred_opt().unwrap()));
        assert!(!d.is_available_on(d.end_date.succ_opt().unwrap()));
    }

    #[test]
    fn test_expired_discount_rejected() {
        let d = sample(DiscountType::Percentage, 10);
        let after = NaiveDate::from_ymd_opt(2027, 1, 1).unwrap();
        let err = resolve_reduction(&d, Money::new(100_000), after).unwrap_err();
        assert!(matches!(err, CoreError::DiscountUnavailable { .. }));
    }

    #[test]
    fn test_inactive_discount_rejected() {
        let mut d = sample(DiscountType::Percentage, 10);
        d.is_active = false;
        let err = resolve_reduction(&d, Money::new(100_000), mid_window()).unwrap_err();
        assert!(matches!(err, CoreError::DiscountUnavailable { .. }));
    }
}
