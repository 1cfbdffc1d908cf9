//! Order route handlers: checkout, history, and per-item status moves.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use medbasket_core::{AddressId, OrderId, OrderItemId, OrderItemStatus};

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CheckoutRequest {
    pub address_id: AddressId,
    pub coupon_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OrderListQuery {
    /// Admins pass `?all=true` to see every order.
    #[serde(default)]
    pub all: bool,
}

#[derive(Deserialize)]
pub struct TransitionRequest {
    pub status: OrderItemStatus,
}

/// POST /orders
#[instrument(skip(state, body))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<CheckoutRequest>,
) -> Result<Json<Value>> {
    let order = OrderRepository::new(state.pool())
        .checkout(user.id, body.address_id, body.coupon_code.as_deref())
        .await?;

    tracing::info!(order_id = %order.order.id, total = %order.order.total, "order placed");
    Ok(Json(json!({ "success": true, "order": order })))
}

/// GET /orders
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Query(query): Query<OrderListQuery>,
) -> Result<Json<Value>> {
    let repo = OrderRepository::new(state.pool());

    let orders = if query.all {
        if !user.is_admin() {
            return Err(AppError::Forbidden("admin access required".to_string()));
        }
        repo.list_all().await?
    } else {
        repo.list_for_user(user.id).await?
    };

    Ok(Json(json!({ "success": true, "orders": orders })))
}

/// GET /orders/{id}
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Json<Value>> {
    let owner = if user.is_admin() { None } else { Some(user.id) };
    let order = OrderRepository::new(state.pool())
        .get_detail(id, owner)
        .await?
        .ok_or_else(|| AppError::NotFound("order".to_string()))?;

    Ok(Json(json!({ "success": true, "order": order })))
}

/// PATCH /orders/{order_id}/items/{item_id}/status
///
/// Customers may cancel pending items and return delivered ones; every
/// other edge requires the admin role.
#[instrument(skip(state, body))]
pub async fn transition_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path((order_id, item_id)): Path<(OrderId, OrderItemId)>,
    Json(body): Json<TransitionRequest>,
) -> Result<Json<Value>> {
    let is_admin = user.is_admin();
    let owner = if is_admin { None } else { Some(user.id) };

    let item = OrderRepository::new(state.pool())
        .transition_item(order_id, item_id, owner, body.status, is_admin)
        .await?;

    tracing::info!(order_id = %order_id, item_id = %item_id, status = %item.status, "item status moved");
    Ok(Json(json!({ "success": true, "item": item })))
}
