//! Coupon route handlers.
//!
//! Management is admin-only; `POST /coupons/apply` lets a logged-in
//! customer preview a code against their current cart before checkout.

use axum::{
    Json,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use medbasket_core::{CouponId, DiscountType};

use crate::db::coupons::NewCoupon;
use crate::db::{CartRepository, CouponRepository};
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireAuth};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CouponRequest {
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub max_discount: Option<Decimal>,
    #[serde(default)]
    pub min_order_total: Decimal,
    pub usage_limit: i32,
    pub expires_at: DateTime<Utc>,
}

impl CouponRequest {
    fn into_new_coupon(self) -> Result<NewCoupon> {
        if self.code.trim().is_empty() {
            return Err(AppError::Validation("code is required".to_string()));
        }
        if self.discount_value <= Decimal::ZERO {
            return Err(AppError::Validation(
                "discount_value must be positive".to_string(),
            ));
        }
        if self.discount_type == DiscountType::Percent
            && self.discount_value > Decimal::from(100)
        {
            return Err(AppError::Validation(
                "percent discount cannot exceed 100".to_string(),
            ));
        }
        if self.usage_limit < 1 {
            return Err(AppError::Validation(
                "usage_limit must be at least 1".to_string(),
            ));
        }

        Ok(NewCoupon {
            code: self.code,
            discount_type: self.discount_type,
            discount_value: self.discount_value,
            max_discount: self.max_discount,
            min_order_total: self.min_order_total,
            usage_limit: self.usage_limit,
            expires_at: self.expires_at,
        })
    }
}

#[derive(Deserialize)]
pub struct ApplyRequest {
    pub code: String,
}

/// GET /coupons
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<Value>> {
    let coupons = CouponRepository::new(state.pool()).list().await?;
    Ok(Json(json!({ "success": true, "coupons": coupons })))
}

/// POST /coupons
#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Json(body): Json<CouponRequest>,
) -> Result<Json<Value>> {
    let coupon = CouponRepository::new(state.pool())
        .create(&body.into_new_coupon()?)
        .await?;
    Ok(Json(json!({ "success": true, "coupon": coupon })))
}

/// PUT /coupons/{id}
#[instrument(skip(state, body))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<CouponId>,
    Json(body): Json<CouponRequest>,
) -> Result<Json<Value>> {
    let coupon = CouponRepository::new(state.pool())
        .update(id, &body.into_new_coupon()?)
        .await?;
    Ok(Json(json!({ "success": true, "coupon": coupon })))
}

/// DELETE /coupons/{id}
#[instrument(skip(state))]
pub async fn delete_coupon(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<CouponId>,
) -> Result<Json<Value>> {
    let deleted = CouponRepository::new(state.pool()).delete(id).await?;
    if !deleted {
        return Err(AppError::NotFound("coupon".to_string()));
    }
    Ok(Json(json!({ "success": true })))
}

/// POST /coupons/apply
///
/// Previews the discount against the caller's current cart subtotal without
/// consuming a redemption.
#[instrument(skip(state, body))]
pub async fn apply(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<ApplyRequest>,
) -> Result<Json<Value>> {
    let cart = CartRepository::new(state.pool()).view(user.id).await?;
    let (coupon, discount) = CouponRepository::new(state.pool())
        .preview(&body.code, cart.subtotal, Utc::now())
        .await?;

    Ok(Json(json!({
        "success": true,
        "coupon": coupon,
        "subtotal": cart.subtotal,
        "discount": discount,
        "total": cart.subtotal - discount,
    })))
}
