//! Category and subcategory route handlers.
//!
//! Reads are public; writes require the admin role and invalidate the
//! product search cache.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use medbasket_core::{CategoryId, SubCategoryId};

use crate::db::CatalogRepository;
use crate::db::catalog::NewCategory;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CategoryRequest {
    pub name: String,
    pub slug: String,
    pub image_url: Option<String>,
}

impl CategoryRequest {
    fn into_new_category(self) -> Result<NewCategory> {
        if self.name.trim().is_empty() || self.slug.trim().is_empty() {
            return Err(AppError::Validation("name and slug are required".to_string()));
        }
        Ok(NewCategory {
            name: self.name,
            slug: self.slug,
            image_url: self.image_url,
        })
    }
}

/// GET /categories
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> Result<Json<Value>> {
    let categories = CatalogRepository::new(state.pool()).list_categories().await?;
    Ok(Json(json!({ "success": true, "categories": categories })))
}

/// POST /categories
#[instrument(skip(state, body))]
pub async fn create_category(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Json(body): Json<CategoryRequest>,
) -> Result<Json<Value>> {
    let category = CatalogRepository::new(state.pool())
        .create_category(&body.into_new_category()?)
        .await?;
    Ok(Json(json!({ "success": true, "category": category })))
}

/// PUT /categories/{id}
#[instrument(skip(state, body))]
pub async fn update_category(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<CategoryId>,
    Json(body): Json<CategoryRequest>,
) -> Result<Json<Value>> {
    let category = CatalogRepository::new(state.pool())
        .update_category(id, &body.into_new_category()?)
        .await?;
    Ok(Json(json!({ "success": true, "category": category })))
}

/// DELETE /categories/{id}
#[instrument(skip(state))]
pub async fn delete_category(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<CategoryId>,
) -> Result<Json<Value>> {
    let deleted = CatalogRepository::new(state.pool()).delete_category(id).await?;
    if !deleted {
        return Err(AppError::NotFound("category".to_string()));
    }
    state.search_cache().invalidate_all();
    Ok(Json(json!({ "success": true })))
}

/// POST /categories/{id}/subcategories
#[instrument(skip(state, body))]
pub async fn create_subcategory(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(category_id): Path<CategoryId>,
    Json(body): Json<CategoryRequest>,
) -> Result<Json<Value>> {
    let subcategory = CatalogRepository::new(state.pool())
        .create_subcategory(category_id, &body.into_new_category()?)
        .await?;
    Ok(Json(json!({ "success": true, "subcategory": subcategory })))
}

/// PUT /subcategories/{id}
#[instrument(skip(state, body))]
pub async fn update_subcategory(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<SubCategoryId>,
    Json(body): Json<CategoryRequest>,
) -> Result<Json<Value>> {
    let subcategory = CatalogRepository::new(state.pool())
        .update_subcategory(id, &body.into_new_category()?)
        .await?;
    Ok(Json(json!({ "success": true, "subcategory": subcategory })))
}

/// DELETE /subcategories/{id}
#[instrument(skip(state))]
pub async fn delete_subcategory(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<SubCategoryId>,
) -> Result<Json<Value>> {
    let deleted = CatalogRepository::new(state.pool()).delete_subcategory(id).await?;
    if !deleted {
        return Err(AppError::NotFound("subcategory".to_string()));
    }
    state.search_cache().invalidate_all();
    Ok(Json(json!({ "success": true })))
}
