//! Admin report route handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use crate::db::OrderRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RevenueQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// GET /admin/reports/revenue?from=&to=
///
/// Daily order count and paid revenue over an inclusive date range, with
/// whole-range totals.
#[instrument(skip(state))]
pub async fn revenue(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(query): Query<RevenueQuery>,
) -> Result<Json<Value>> {
    if query.from > query.to {
        return Err(AppError::Validation("from must not be after to".to_string()));
    }

    let repo = OrderRepository::new(state.pool());
    let days = repo.revenue_by_day(query.from, query.to).await?;
    let totals = repo.revenue_totals(query.from, query.to).await?;

    Ok(Json(json!({ "success": true, "days": days, "totals": totals })))
}
