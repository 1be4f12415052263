//! Inventory ledger endpoints.

use axum::extract::{Query, State};
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;
use minimart_core::Capability;
use minimart_db::repository::inventory::{
    AdjustmentOutcome, InventoryLogDetail, InventoryStats, ProductMovementReport,
};

#[derive(Debug, Deserialize)]
pub struct AdjustRequest {
    pub product_id: String,
    pub quantity_change: i64,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// `GET /api/inventory`: recent ledger entries.
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<ApiResponse<Vec<InventoryLogDetail>>>, ApiError> {
    let logs = state.db.inventory().list(50).await.map_err(ApiError::from)?;
    Ok(Json(ApiResponse::ok(logs)))
}

/// `POST /api/inventory/adjust`: manual stock correction.
pub async fn adjust(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<AdjustRequest>,
) -> Result<Json<ApiResponse<AdjustmentOutcome>>, ApiError> {
    user.require(Capability::AdjustInventory)?;

    if req.quantity_change == 0 {
        return Err(ApiError::validation("quantity_change must not be zero"));
    }

    let outcome = state
        .db
        .inventory()
        .adjust(
            &req.product_id,
            &user.0.user_id,
            req.quantity_change,
            req.notes,
        )
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ApiResponse::ok_with_message(
        "Inventory adjusted successfully",
        outcome,
    )))
}

/// `GET /api/inventory/stats`
pub async fn stats(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<ApiResponse<InventoryStats>>, ApiError> {
    user.require(Capability::AdjustInventory)?;

    let stats = state
        .db
        .inventory()
        .stats(query.start_date, query.end_date)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ApiResponse::ok(stats)))
}

/// `GET /api/inventory/report`: both date bounds required.
pub async fn report(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<DateRangeQuery>,
) -> Result<Json<ApiResponse<Vec<ProductMovementReport>>>, ApiError> {
    user.require(Capability::AdjustInventory)?;

    let (start, end) = match (query.start_date, query.end_date) {
        (Some(start), Some(end)) => (start, end),
        _ => {
            return Err(ApiError::validation(
                "start_date and end_date are required",
            ))
        }
    };

    let rows = state
        .db
        .inventory()
        .report(start, end)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ApiResponse::ok(rows)))
}
