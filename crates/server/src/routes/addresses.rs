//! Address route handlers.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use medbasket_core::{AddressId, PhoneNumber};

use crate::db::AddressRepository;
use crate::db::addresses::NewAddress;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct AddressRequest {
    pub label: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub phone: String,
    #[serde(default)]
    pub is_default: bool,
}

impl AddressRequest {
    fn into_new_address(self) -> Result<NewAddress> {
        if self.label.trim().is_empty() || self.line1.trim().is_empty() {
            return Err(AppError::Validation(
                "label and line1 are required".to_string(),
            ));
        }
        let phone = PhoneNumber::parse(&self.phone)
            .map_err(|e| AppError::Validation(format!("invalid phone number: {e}")))?;

        Ok(NewAddress {
            label: self.label,
            line1: self.line1,
            line2: self.line2,
            city: self.city,
            state: self.state,
            postal_code: self.postal_code,
            phone,
            is_default: self.is_default,
        })
    }
}

/// GET /addresses
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Value>> {
    let addresses = AddressRepository::new(state.pool()).list(user.id).await?;
    Ok(Json(json!({ "success": true, "addresses": addresses })))
}

/// POST /addresses
#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(body): Json<AddressRequest>,
) -> Result<Json<Value>> {
    let new = body.into_new_address()?;
    let address = AddressRepository::new(state.pool())
        .create(user.id, &new)
        .await?;
    Ok(Json(json!({ "success": true, "address": address })))
}

/// PUT /addresses/{id}
#[instrument(skip(state, body))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
    Json(body): Json<AddressRequest>,
) -> Result<Json<Value>> {
    let new = body.into_new_address()?;
    let address = AddressRepository::new(state.pool())
        .update(user.id, id, &new)
        .await?;
    Ok(Json(json!({ "success": true, "address": address })))
}

/// DELETE /addresses/{id}
#[instrument(skip(state))]
pub async fn delete_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Json<Value>> {
    let deleted = AddressRepository::new(state.pool())
        .delete(user.id, id)
        .await?;
    if !deleted {
        return Err(AppError::NotFound("address".to_string()));
    }
    Ok(Json(json!({ "success": true })))
}
