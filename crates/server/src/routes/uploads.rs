//! Image upload route handlers.
//!
//! Accepts multipart uploads from the admin dashboard, pushes them to the
//! storage provider, and returns the CDN URL for use in catalog payloads.

use axum::{
    Json,
    extract::{Multipart, Path, State},
};
use serde_json::{Value, json};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

const ALLOWED_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// POST /uploads
#[instrument(skip(state, multipart))]
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    mut multipart: Multipart,
) -> Result<Json<Value>> {
    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))?
        .ok_or_else(|| AppError::Validation("missing file field".to_string()))?;

    // Prefix with a random id so two admins uploading "product.png" never
    // overwrite each other's object.
    let filename = format!("{}-{}", Uuid::new_v4(), field.file_name().unwrap_or("upload"));
    let content_type = field
        .content_type()
        .map(ToOwned::to_owned)
        .ok_or_else(|| AppError::Validation("missing content type".to_string()))?;

    if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
        return Err(AppError::Validation(format!(
            "unsupported content type: {content_type}"
        )));
    }

    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::Validation(format!("failed to read upload: {e}")))?;

    if bytes.is_empty() {
        return Err(AppError::Validation("empty upload".to_string()));
    }
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::Validation("upload exceeds 5 MiB".to_string()));
    }

    let image = state
        .storage()
        .upload(&filename, &content_type, bytes.to_vec())
        .await?;

    Ok(Json(json!({ "success": true, "image": image })))
}

/// DELETE /uploads/{key}
#[instrument(skip(state))]
pub async fn delete_upload(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(key): Path<String>,
) -> Result<Json<Value>> {
    state.storage().delete(&key).await?;
    Ok(Json(json!({ "success": true })))
}
