//! Product route handlers: listing, search, detail, and admin catalog
//! management.
//!
//! Text searches (`?q=`) are served through the in-process search cache;
//! every admin write invalidates it.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use medbasket_core::{
    CombinationId, ProductId, SubCategoryId, VariantTypeId, VariantValueId,
};

use crate::db::CatalogRepository;
use crate::db::catalog::{NewCombination, NewMedicine, NewProduct, ProductFilter};
use crate::error::{AppError, Result};
use crate::middleware::{OptionalAuth, RequireAdmin};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProductQuery {
    pub subcategory_id: Option<SubCategoryId>,
    pub q: Option<String>,
    #[serde(default)]
    pub include_inactive: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Deserialize)]
pub struct MedicineRequest {
    pub composition: String,
    pub manufacturer: String,
    #[serde(default)]
    pub requires_prescription: bool,
}

#[derive(Deserialize)]
pub struct ProductRequest {
    pub subcategory_id: SubCategoryId,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub mrp: Decimal,
    pub stock: i32,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub medicine: Option<MedicineRequest>,
}

const fn default_true() -> bool {
    true
}

impl ProductRequest {
    fn into_new_product(self) -> Result<NewProduct> {
        if self.name.trim().is_empty() || self.slug.trim().is_empty() {
            return Err(AppError::Validation("name and slug are required".to_string()));
        }
        if self.price < Decimal::ZERO || self.mrp < Decimal::ZERO || self.stock < 0 {
            return Err(AppError::Validation(
                "price, mrp, and stock must not be negative".to_string(),
            ));
        }

        Ok(NewProduct {
            subcategory_id: self.subcategory_id,
            name: self.name,
            slug: self.slug,
            description: self.description,
            price: self.price,
            mrp: self.mrp,
            stock: self.stock,
            image_urls: self.image_urls,
            is_active: self.is_active,
            medicine: self.medicine.map(|m| NewMedicine {
                composition: m.composition,
                manufacturer: m.manufacturer,
                requires_prescription: m.requires_prescription,
            }),
        })
    }
}

#[derive(Deserialize)]
pub struct VariantTypeRequest {
    pub name: String,
}

#[derive(Deserialize)]
pub struct VariantValueRequest {
    pub value: String,
}

#[derive(Deserialize)]
pub struct CombinationRequest {
    pub sku: String,
    pub price: Decimal,
    pub stock: i32,
    pub value_ids: Vec<VariantValueId>,
}

#[derive(Deserialize)]
pub struct CombinationUpdateRequest {
    pub price: Decimal,
    pub stock: i32,
}

const DEFAULT_LIMIT: i64 = 50;

/// Whether a listing can be served from the search cache.
///
/// The cache key is the normalized query text alone, so every knob that
/// changes the result set beyond the query (filters, admin visibility,
/// pagination) must match the defaults.
fn cacheable_search(filter: &ProductFilter) -> bool {
    filter.query.is_some()
        && filter.subcategory_id.is_none()
        && !filter.include_inactive
        && filter.limit == DEFAULT_LIMIT
        && filter.offset == 0
}

/// GET /products
///
/// Plain text searches go through the cache; filtered or admin listings
/// always hit the database.
#[instrument(skip(state, auth))]
pub async fn index(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Value>> {
    let is_admin = auth.is_some_and(|u| u.is_admin());
    let filter = ProductFilter {
        subcategory_id: query.subcategory_id,
        query: query.q.clone().filter(|q| !q.trim().is_empty()),
        include_inactive: query.include_inactive && is_admin,
        limit: query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, 200),
        offset: query.offset.unwrap_or(0).max(0),
    };

    let cacheable = cacheable_search(&filter);

    if cacheable
        && let Some(q) = &filter.query
        && let Some(hit) = state.search_cache().get(q).await
    {
        return Ok(Json(json!({ "success": true, "products": &*hit })));
    }

    let products = CatalogRepository::new(state.pool()).list_products(&filter).await?;

    if cacheable && let Some(q) = &filter.query {
        let cached = state.search_cache().insert(q, products).await;
        return Ok(Json(json!({ "success": true, "products": &*cached })));
    }

    Ok(Json(json!({ "success": true, "products": products })))
}

/// GET /products/{id}
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Value>> {
    let detail = CatalogRepository::new(state.pool())
        .get_product_detail(id)
        .await?
        .ok_or_else(|| AppError::NotFound("product".to_string()))?;
    Ok(Json(json!({ "success": true, "product": detail })))
}

/// POST /products
#[instrument(skip(state, body))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Json(body): Json<ProductRequest>,
) -> Result<Json<Value>> {
    let product = CatalogRepository::new(state.pool())
        .create_product(&body.into_new_product()?)
        .await?;
    state.search_cache().invalidate_all();
    Ok(Json(json!({ "success": true, "product": product })))
}

/// PUT /products/{id}
#[instrument(skip(state, body))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(body): Json<ProductRequest>,
) -> Result<Json<Value>> {
    let product = CatalogRepository::new(state.pool())
        .update_product(id, &body.into_new_product()?)
        .await?;
    state.search_cache().invalidate_all();
    Ok(Json(json!({ "success": true, "product": product })))
}

/// DELETE /products/{id}
///
/// Deactivates rather than deletes; historical orders keep their reference.
#[instrument(skip(state))]
pub async fn deactivate(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<Value>> {
    let deactivated = CatalogRepository::new(state.pool()).deactivate_product(id).await?;
    if !deactivated {
        return Err(AppError::NotFound("product".to_string()));
    }
    state.search_cache().invalidate_all();
    Ok(Json(json!({ "success": true })))
}

/// POST /products/{id}/variant-types
#[instrument(skip(state, body))]
pub async fn create_variant_type(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(body): Json<VariantTypeRequest>,
) -> Result<Json<Value>> {
    if body.name.trim().is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }
    let variant_type = CatalogRepository::new(state.pool())
        .create_variant_type(id, &body.name)
        .await?;
    Ok(Json(json!({ "success": true, "variant_type": variant_type })))
}

/// DELETE /variant-types/{id}
#[instrument(skip(state))]
pub async fn delete_variant_type(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<VariantTypeId>,
) -> Result<Json<Value>> {
    let deleted = CatalogRepository::new(state.pool()).delete_variant_type(id).await?;
    if !deleted {
        return Err(AppError::NotFound("variant type".to_string()));
    }
    Ok(Json(json!({ "success": true })))
}

/// POST /variant-types/{id}/values
#[instrument(skip(state, body))]
pub async fn create_variant_value(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<VariantTypeId>,
    Json(body): Json<VariantValueRequest>,
) -> Result<Json<Value>> {
    if body.value.trim().is_empty() {
        return Err(AppError::Validation("value is required".to_string()));
    }
    let variant_value = CatalogRepository::new(state.pool())
        .create_variant_value(id, &body.value)
        .await?;
    Ok(Json(json!({ "success": true, "variant_value": variant_value })))
}

/// DELETE /variant-values/{id}
#[instrument(skip(state))]
pub async fn delete_variant_value(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<VariantValueId>,
) -> Result<Json<Value>> {
    let deleted = CatalogRepository::new(state.pool()).delete_variant_value(id).await?;
    if !deleted {
        return Err(AppError::NotFound("variant value".to_string()));
    }
    Ok(Json(json!({ "success": true })))
}

/// POST /products/{id}/combinations
#[instrument(skip(state, body))]
pub async fn create_combination(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(body): Json<CombinationRequest>,
) -> Result<Json<Value>> {
    if body.sku.trim().is_empty() {
        return Err(AppError::Validation("sku is required".to_string()));
    }
    let new = NewCombination {
        sku: body.sku,
        price: body.price,
        stock: body.stock,
        value_ids: body.value_ids,
    };
    let combination = CatalogRepository::new(state.pool())
        .create_combination(id, &new)
        .await?;
    Ok(Json(json!({ "success": true, "combination": combination })))
}

/// PUT /combinations/{id}
#[instrument(skip(state, body))]
pub async fn update_combination(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<CombinationId>,
    Json(body): Json<CombinationUpdateRequest>,
) -> Result<Json<Value>> {
    let combination = CatalogRepository::new(state.pool())
        .update_combination(id, body.price, body.stock)
        .await?;
    Ok(Json(json!({ "success": true, "combination": combination })))
}

/// DELETE /combinations/{id}
#[instrument(skip(state))]
pub async fn delete_combination(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<CombinationId>,
) -> Result<Json<Value>> {
    let deleted = CatalogRepository::new(state.pool()).delete_combination(id).await?;
    if !deleted {
        return Err(AppError::NotFound("combination".to_string()));
    }
    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search(q: &str) -> ProductFilter {
        ProductFilter {
            subcategory_id: None,
            query: Some(q.to_string()),
            include_inactive: false,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }

    #[test]
    fn test_plain_search_is_cacheable() {
        assert!(cacheable_search(&search("dolo")));
    }

    #[test]
    fn test_listing_without_query_not_cached() {
        let filter = ProductFilter {
            query: None,
            ..search("")
        };
        assert!(!cacheable_search(&filter));
    }

    #[test]
    fn test_custom_limit_not_cached() {
        // A ?limit=1 result must never be served to default-limit searches
        let filter = ProductFilter {
            limit: 1,
            ..search("dolo")
        };
        assert!(!cacheable_search(&filter));
    }

    #[test]
    fn test_paginated_or_filtered_search_not_cached() {
        let filter = ProductFilter {
            offset: 50,
            ..search("dolo")
        };
        assert!(!cacheable_search(&filter));

        let filter = ProductFilter {
            subcategory_id: Some(SubCategoryId::new(3)),
            ..search("dolo")
        };
        assert!(!cacheable_search(&filter));

        let filter = ProductFilter {
            include_inactive: true,
            ..search("dolo")
        };
        assert!(!cacheable_search(&filter));
    }
}
