//! Cart route handlers.
//!
//! Every endpoint requires a session; carts are keyed by user, not by a
//! client-side cart id.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use medbasket_core::{CartItemId, CombinationId, ProductId};

use crate::db::CartRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AddItemRequest {
    pub product_id: ProductId,
    pub combination_id: Option<CombinationId>,
    pub quantity: i32,
}

#[derive(Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i32,
}

fn validate_quantity(quantity: i32) -> Result<()> {
    if quantity < 1 {
        return Err(AppError::Validation("quantity must be at least 1".to_string()));
    }
    Ok(())
}

/// GET /cart
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Value>> {
    let cart = CartRepository::new(state.pool()).view(user.id).await?;
    Ok(Json(json!({ "success": true, "cart": cart })))
}

/// POST /cart/items
#[instrument(skip(state, body))]
pub async fn add_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<AddItemRequest>,
) -> Result<Json<Value>> {
    validate_quantity(body.quantity)?;
    let item = CartRepository::new(state.pool())
        .upsert_item(user.id, body.product_id, body.combination_id, body.quantity)
        .await?;
    Ok(Json(json!({ "success": true, "item": item })))
}

/// PUT /cart/items/{id}
#[instrument(skip(state, body))]
pub async fn update_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<CartItemId>,
    Json(body): Json<UpdateItemRequest>,
) -> Result<Json<Value>> {
    validate_quantity(body.quantity)?;
    let item = CartRepository::new(state.pool())
        .update_quantity(user.id, id, body.quantity)
        .await?;
    Ok(Json(json!({ "success": true, "item": item })))
}

/// DELETE /cart/items/{id}
#[instrument(skip(state))]
pub async fn remove_item(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<CartItemId>,
) -> Result<Json<Value>> {
    let removed = CartRepository::new(state.pool()).remove(user.id, id).await?;
    if !removed {
        return Err(AppError::NotFound("cart item".to_string()));
    }
    Ok(Json(json!({ "success": true })))
}

/// DELETE /cart
#[instrument(skip(state))]
pub async fn clear(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Value>> {
    CartRepository::new(state.pool()).clear(user.id).await?;
    Ok(Json(json!({ "success": true })))
}

/// GET /cart/count
#[instrument(skip(state))]
pub async fn count(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Value>> {
    let count = CartRepository::new(state.pool()).count(user.id).await?;
    Ok(Json(json!({ "success": true, "count": count })))
}
