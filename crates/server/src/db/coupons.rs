//! Coupon repository.
//!
//! Redemption uses a compare-and-swap update (`used_count < usage_limit` in
//! the WHERE clause) so the usage cap holds under concurrent checkouts.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;

use medbasket_core::{CouponId, DiscountType};

use super::RepositoryError;
use crate::models::Coupon;

/// Errors from applying or redeeming a coupon.
#[derive(Debug, Error)]
pub enum CouponError {
    /// Underlying repository failure.
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// No coupon with that code.
    #[error("coupon code not found")]
    NotFound,

    /// The coupon's expiry date has passed.
    #[error("coupon has expired")]
    Expired,

    /// The redemption cap has been reached.
    #[error("coupon is no longer available")]
    Exhausted,

    /// The order subtotal is below the coupon's minimum.
    #[error("order total must be at least {0} to use this coupon")]
    BelowMinimum(Decimal),
}

impl From<sqlx::Error> for CouponError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct CouponRow {
    id: i32,
    code: String,
    discount_type: DiscountType,
    discount_value: Decimal,
    max_discount: Option<Decimal>,
    min_order_total: Decimal,
    usage_limit: i32,
    used_count: i32,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl From<CouponRow> for Coupon {
    fn from(row: CouponRow) -> Self {
        Self {
            id: CouponId::new(row.id),
            code: row.code,
            discount_type: row.discount_type,
            discount_value: row.discount_value,
            max_discount: row.max_discount,
            min_order_total: row.min_order_total,
            usage_limit: row.usage_limit,
            used_count: row.used_count,
            expires_at: row.expires_at,
            created_at: row.created_at,
        }
    }
}

const COUPON_COLUMNS: &str = "id, code, discount_type, discount_value, max_discount, \
     min_order_total, usage_limit, used_count, expires_at, created_at";

/// Fields for creating or replacing a coupon.
#[derive(Debug, Clone)]
pub struct NewCoupon {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub max_discount: Option<Decimal>,
    pub min_order_total: Decimal,
    pub usage_limit: i32,
    pub expires_at: DateTime<Utc>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for coupon database operations.
pub struct CouponRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CouponRepository<'a> {
    /// Create a new coupon repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all coupons, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Coupon>, RepositoryError> {
        let rows = sqlx::query_as::<_, CouponRow>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupons ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Create a coupon. Codes are stored uppercase.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the code is already in use.
    pub async fn create(&self, coupon: &NewCoupon) -> Result<Coupon, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            r"
            INSERT INTO coupons
                (code, discount_type, discount_value, max_discount,
                 min_order_total, usage_limit, expires_at)
            VALUES (upper($1), $2, $3, $4, $5, $6, $7)
            RETURNING {COUPON_COLUMNS}
            "
        ))
        .bind(&coupon.code)
        .bind(coupon.discount_type)
        .bind(coupon.discount_value)
        .bind(coupon.max_discount)
        .bind(coupon.min_order_total)
        .bind(coupon.usage_limit)
        .bind(coupon.expires_at)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "coupon code already exists"))?;

        Ok(row.into())
    }

    /// Replace a coupon's fields. The `used_count` is preserved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the coupon doesn't exist.
    pub async fn update(
        &self,
        coupon_id: CouponId,
        coupon: &NewCoupon,
    ) -> Result<Coupon, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            r"
            UPDATE coupons
            SET code = upper($2), discount_type = $3, discount_value = $4,
                max_discount = $5, min_order_total = $6, usage_limit = $7,
                expires_at = $8
            WHERE id = $1
            RETURNING {COUPON_COLUMNS}
            "
        ))
        .bind(coupon_id)
        .bind(&coupon.code)
        .bind(coupon.discount_type)
        .bind(coupon.discount_value)
        .bind(coupon.max_discount)
        .bind(coupon.min_order_total)
        .bind(coupon.usage_limit)
        .bind(coupon.expires_at)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_sqlx(e, "coupon code already exists"))?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Delete a coupon. Orders that already redeemed it keep their discount.
    ///
    /// # Returns
    ///
    /// Returns `true` if the coupon was deleted, `false` if it didn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, coupon_id: CouponId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM coupons WHERE id = $1")
            .bind(coupon_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Look up a coupon by its code, case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_code(&self, code: &str) -> Result<Option<Coupon>, RepositoryError> {
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupons WHERE code = upper($1)"
        ))
        .bind(code)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Check a coupon against a subtotal without redeeming it.
    ///
    /// Returns the coupon and the discount it would grant.
    ///
    /// # Errors
    ///
    /// Returns the [`CouponError`] explaining why the coupon doesn't apply.
    pub async fn preview(
        &self,
        code: &str,
        subtotal: Decimal,
        now: DateTime<Utc>,
    ) -> Result<(Coupon, Decimal), CouponError> {
        let coupon = self.get_by_code(code).await?.ok_or(CouponError::NotFound)?;
        let discount = check_applicable(&coupon, subtotal, now)?;
        Ok((coupon, discount))
    }

    /// Redeem a coupon inside a checkout transaction.
    ///
    /// The usage cap and expiry are re-checked in the UPDATE itself, so two
    /// concurrent checkouts can never push `used_count` past `usage_limit`.
    ///
    /// # Errors
    ///
    /// Returns the [`CouponError`] explaining why redemption failed.
    pub async fn redeem(
        tx: &mut Transaction<'_, Postgres>,
        code: &str,
        subtotal: Decimal,
        now: DateTime<Utc>,
    ) -> Result<(Coupon, Decimal), CouponError> {
        let row = sqlx::query_as::<_, CouponRow>(&format!(
            r"
            UPDATE coupons
            SET used_count = used_count + 1
            WHERE code = upper($1)
              AND used_count < usage_limit
              AND expires_at > $2
            RETURNING {COUPON_COLUMNS}
            "
        ))
        .bind(code)
        .bind(now)
        .fetch_optional(&mut **tx)
        .await?;

        if let Some(row) = row {
            // Expiry and the usage cap were enforced by the UPDATE's WHERE
            // clause; the returned row carries the post-increment count, so
            // only the order minimum is left to check.
            let coupon: Coupon = row.into();
            let discount = redeemed_discount(&coupon, subtotal)?;
            return Ok((coupon, discount));
        }

        // The CAS missed. Read the row to report why.
        let existing = sqlx::query_as::<_, CouponRow>(&format!(
            "SELECT {COUPON_COLUMNS} FROM coupons WHERE code = upper($1)"
        ))
        .bind(code)
        .fetch_optional(&mut **tx)
        .await?;

        match existing {
            None => Err(CouponError::NotFound),
            Some(row) => {
                let coupon: Coupon = row.into();
                if coupon.is_expired(now) {
                    Err(CouponError::Expired)
                } else {
                    Err(CouponError::Exhausted)
                }
            }
        }
    }
}

fn check_applicable(
    coupon: &Coupon,
    subtotal: Decimal,
    now: DateTime<Utc>,
) -> Result<Decimal, CouponError> {
    if coupon.is_expired(now) {
        return Err(CouponError::Expired);
    }
    if coupon.is_exhausted() {
        return Err(CouponError::Exhausted);
    }
    redeemed_discount(coupon, subtotal)
}

/// Discount for a coupon the CAS update already accepted. Must not re-check
/// expiry or the cap: the returned row's `used_count` is post-increment, so
/// the final permitted redemption legitimately sits at the limit.
fn redeemed_discount(coupon: &Coupon, subtotal: Decimal) -> Result<Decimal, CouponError> {
    if subtotal < coupon.min_order_total {
        return Err(CouponError::BelowMinimum(coupon.min_order_total));
    }
    Ok(coupon.discount_for(subtotal))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn coupon(used: i32, limit: i32, min: i64, expired: bool) -> Coupon {
        let offset = if expired {
            -Duration::hours(1)
        } else {
            Duration::days(7)
        };
        Coupon {
            id: CouponId::new(1),
            code: "SAVE10".to_string(),
            discount_type: DiscountType::Percent,
            discount_value: Decimal::from(10),
            max_discount: None,
            min_order_total: Decimal::from(min),
            usage_limit: limit,
            used_count: used,
            expires_at: Utc::now() + offset,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_applicable_coupon_yields_discount() {
        let c = coupon(0, 10, 0, false);
        let discount = check_applicable(&c, Decimal::from(200), Utc::now()).unwrap();
        assert_eq!(discount, Decimal::from(20));
    }

    #[test]
    fn test_expired_coupon_rejected() {
        let c = coupon(0, 10, 0, true);
        let err = check_applicable(&c, Decimal::from(200), Utc::now()).unwrap_err();
        assert!(matches!(err, CouponError::Expired));
    }

    #[test]
    fn test_exhausted_coupon_rejected() {
        let c = coupon(10, 10, 0, false);
        let err = check_applicable(&c, Decimal::from(200), Utc::now()).unwrap_err();
        assert!(matches!(err, CouponError::Exhausted));
    }

    #[test]
    fn test_subtotal_below_minimum_rejected() {
        let c = coupon(0, 10, 500, false);
        let err = check_applicable(&c, Decimal::from(200), Utc::now()).unwrap_err();
        assert!(matches!(err, CouponError::BelowMinimum(min) if min == Decimal::from(500)));
    }

    #[test]
    fn test_last_slot_still_applicable() {
        // One redemption left: the preview path must accept it.
        let c = coupon(9, 10, 0, false);
        let discount = check_applicable(&c, Decimal::from(200), Utc::now()).unwrap();
        assert_eq!(discount, Decimal::from(20));
    }

    #[test]
    fn test_final_redemption_grants_discount() {
        // A usage_limit = 1 coupon after the CAS increment: used_count sits
        // at the limit and the redemption must still go through.
        let c = coupon(1, 1, 0, false);
        let discount = redeemed_discount(&c, Decimal::from(200)).unwrap();
        assert_eq!(discount, Decimal::from(20));
    }

    #[test]
    fn test_redeemed_coupon_still_enforces_minimum() {
        let c = coupon(1, 1, 500, false);
        let err = redeemed_discount(&c, Decimal::from(200)).unwrap_err();
        assert!(matches!(err, CouponError::BelowMinimum(min) if min == Decimal::from(500)));
    }
}
