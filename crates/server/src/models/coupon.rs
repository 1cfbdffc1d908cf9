//! Coupon model and discount arithmetic.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use medbasket_core::{CouponId, DiscountType};

/// A discount code with an expiry date and a redemption cap.
#[derive(Debug, Clone, Serialize)]
pub struct Coupon {
    pub id: CouponId,
    pub code: String,
    pub discount_type: DiscountType,
    /// Percent (0-100) for [`DiscountType::Percent`], amount for
    /// [`DiscountType::Fixed`].
    pub discount_value: Decimal,
    /// Upper bound on a percent discount, if any.
    pub max_discount: Option<Decimal>,
    /// Minimum order subtotal for the coupon to apply.
    pub min_order_total: Decimal,
    pub usage_limit: i32,
    pub used_count: i32,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Coupon {
    /// Whether the coupon has expired as of `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Whether the redemption cap has been reached.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.used_count >= self.usage_limit
    }

    /// Discount amount for the given subtotal.
    ///
    /// Percent discounts are capped by `max_discount` when set; no discount
    /// ever exceeds the subtotal itself.
    #[must_use]
    pub fn discount_for(&self, subtotal: Decimal) -> Decimal {
        let raw = match self.discount_type {
            DiscountType::Percent => subtotal * self.discount_value / Decimal::from(100),
            DiscountType::Fixed => self.discount_value,
        };

        let capped = match (self.discount_type, self.max_discount) {
            (DiscountType::Percent, Some(max)) => raw.min(max),
            _ => raw,
        };

        capped.min(subtotal).round_dp(2)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn coupon(discount_type: DiscountType, value: i64, max: Option<i64>) -> Coupon {
        Coupon {
            id: CouponId::new(1),
            code: "SAVE10".to_string(),
            discount_type,
            discount_value: Decimal::from(value),
            max_discount: max.map(Decimal::from),
            min_order_total: Decimal::ZERO,
            usage_limit: 100,
            used_count: 0,
            expires_at: Utc::now() + Duration::days(7),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_percent_discount() {
        let c = coupon(DiscountType::Percent, 10, None);
        assert_eq!(c.discount_for(Decimal::from(500)), Decimal::from(50));
    }

    #[test]
    fn test_percent_discount_capped() {
        let c = coupon(DiscountType::Percent, 10, Some(30));
        assert_eq!(c.discount_for(Decimal::from(500)), Decimal::from(30));
    }

    #[test]
    fn test_fixed_discount() {
        let c = coupon(DiscountType::Fixed, 75, None);
        assert_eq!(c.discount_for(Decimal::from(500)), Decimal::from(75));
    }

    #[test]
    fn test_fixed_discount_never_exceeds_subtotal() {
        let c = coupon(DiscountType::Fixed, 75, None);
        assert_eq!(c.discount_for(Decimal::from(50)), Decimal::from(50));
    }

    #[test]
    fn test_expiry() {
        let mut c = coupon(DiscountType::Fixed, 10, None);
        assert!(!c.is_expired(Utc::now()));
        c.expires_at = Utc::now() - Duration::hours(1);
        assert!(c.is_expired(Utc::now()));
    }

    #[test]
    fn test_exhaustion() {
        let mut c = coupon(DiscountType::Fixed, 10, None);
        assert!(!c.is_exhausted());
        c.used_count = c.usage_limit;
        assert!(c.is_exhausted());
    }
}
