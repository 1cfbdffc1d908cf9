//! Places proxy route handlers.
//!
//! Forwards autocomplete and details lookups so the Places API key never
//! ships to a client. Responses pass through unmodified.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AutocompleteQuery {
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct DetailsQuery {
    pub place_id: String,
}

/// GET /places/autocomplete?q=
#[instrument(skip(state))]
pub async fn autocomplete(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Query(query): Query<AutocompleteQuery>,
) -> Result<Json<Value>> {
    if query.q.trim().is_empty() {
        return Err(AppError::Validation("q is required".to_string()));
    }
    let predictions = state.places().autocomplete(&query.q).await?;
    Ok(Json(json!({ "success": true, "predictions": predictions })))
}

/// GET /places/details?place_id=
#[instrument(skip(state))]
pub async fn details(
    State(state): State<AppState>,
    RequireAuth(_): RequireAuth,
    Query(query): Query<DetailsQuery>,
) -> Result<Json<Value>> {
    if query.place_id.trim().is_empty() {
        return Err(AppError::Validation("place_id is required".to_string()));
    }
    let place = state.places().details(&query.place_id).await?;
    Ok(Json(json!({ "success": true, "place": place })))
}
