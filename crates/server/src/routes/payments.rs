//! Payment route handlers.
//!
//! Checkout sessions are created against the gateway and recorded locally;
//! settlement arrives asynchronously on the webhook, which is authenticated
//! by an HMAC signature over the raw body rather than a session cookie.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
};
use serde_json::{Value, json};
use tracing::instrument;

use medbasket_core::{CurrencyCode, OrderId, OrderStatus, PaymentId, PaymentStatus};

use crate::db::{OrderRepository, PaymentRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

/// Header carrying the webhook body signature.
const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// POST /orders/{id}/payments
#[instrument(skip(state))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(order_id): Path<OrderId>,
) -> Result<Json<Value>> {
    let owner = if user.is_admin() { None } else { Some(user.id) };
    let detail = OrderRepository::new(state.pool())
        .get_detail(order_id, owner)
        .await?
        .ok_or_else(|| AppError::NotFound("order".to_string()))?;

    if detail.order.status != OrderStatus::Created {
        return Err(AppError::Validation(
            "order is already settled".to_string(),
        ));
    }

    let session = state
        .payments()
        .create_session(order_id, detail.order.total, CurrencyCode::INR)
        .await?;

    let payment = PaymentRepository::new(state.pool())
        .create(
            order_id,
            &session.provider_order_id,
            detail.order.total,
            &session.redirect_url,
        )
        .await?;

    Ok(Json(json!({ "success": true, "payment": payment })))
}

/// GET /payments/{id}
///
/// A payment still awaiting its webhook is reconciled against the gateway,
/// so a client polling after the hosted-checkout redirect sees the final
/// status without waiting for the callback.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<PaymentId>,
) -> Result<Json<Value>> {
    let repo = PaymentRepository::new(state.pool());
    let mut payment = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("payment".to_string()))?;

    // Ownership is checked through the order the payment belongs to
    let owner = if user.is_admin() { None } else { Some(user.id) };
    OrderRepository::new(state.pool())
        .get_detail(payment.order_id, owner)
        .await?
        .ok_or_else(|| AppError::NotFound("payment".to_string()))?;

    if payment.status == PaymentStatus::Created {
        match state.payments().fetch_status(&payment.provider_order_id).await {
            Ok(PaymentStatus::Created) => {}
            Ok(settled) => {
                payment = repo.settle(&payment.provider_order_id, settled).await?;
            }
            // A gateway outage degrades to the locally recorded status
            Err(err) => {
                tracing::warn!(error = %err, "gateway status check failed");
            }
        }
    }

    Ok(Json(json!({ "success": true, "payment": payment })))
}

/// POST /payments/webhook
///
/// The gateway retries deliveries, so settlement is idempotent: a webhook
/// for an already settled payment answers 200 without changing anything.
#[instrument(skip_all)]
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing webhook signature".to_string()))?;

    if !state.payments().verify_webhook(&body, signature) {
        tracing::warn!("webhook rejected: bad signature");
        return Err(AppError::Unauthorized("invalid webhook signature".to_string()));
    }

    let event = state.payments().parse_webhook(&body)?;
    let payment = PaymentRepository::new(state.pool())
        .settle(&event.order_id, event.status)
        .await?;

    tracing::info!(
        payment_id = %payment.id,
        order_id = %payment.order_id,
        status = ?payment.status,
        "webhook settled"
    );

    Ok(Json(json!({ "success": true })))
}
