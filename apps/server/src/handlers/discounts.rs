//! Discount endpoints, including the calculate endpoint the POS frontend
//! uses to preview a reduction before checkout.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;
use minimart_core::discount::resolve_reduction;
use minimart_core::validation::{validate_name, validate_price};
use minimart_core::{Capability, Discount, DiscountType, Money};
use minimart_db::repository::discount::{DiscountPatch, DiscountWithStatus, NewDiscount};

#[derive(Debug, Deserialize)]
pub struct CalculateRequest {
    pub discount_id: String,
    pub total_amount: Money,
}

#[derive(Debug, Serialize)]
pub struct CalculateResponse {
    pub discount_amount: Money,
    pub discount_name: String,
    pub discount_type: DiscountType,
    pub discount_value: i64,
}

/// `GET /api/discounts`
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<ApiResponse<Vec<DiscountWithStatus>>>, ApiError> {
    let discounts = state.db.discounts().list(50).await.map_err(ApiError::from)?;
    Ok(Json(ApiResponse::ok(discounts)))
}

/// `GET /api/discounts/active`: usable today.
pub async fn active(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<ApiResponse<Vec<Discount>>>, ApiError> {
    let discounts = state
        .db
        .discounts()
        .list_active()
        .await
        .map_err(ApiError::from)?;
    Ok(Json(ApiResponse::ok(discounts)))
}

/// `GET /api/discounts/:id`
pub async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Discount>>, ApiError> {
    let discount = state
        .db
        .discounts()
        .get_by_id(&id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found("Discount", &id))?;

    Ok(Json(ApiResponse::ok(discount)))
}

/// `POST /api/discounts/calculate`
///
/// An expired, upcoming, or inactive discount is an explicit
/// `DiscountUnavailable` error, not a zero.
pub async fn calculate(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(req): Json<CalculateRequest>,
) -> Result<Json<ApiResponse<CalculateResponse>>, ApiError> {
    validate_price("total_amount", req.total_amount.amount())?;

    let discount = state
        .db
        .discounts()
        .get_by_id(&req.discount_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found("Discount", &req.discount_id))?;

    let discount_amount =
        resolve_reduction(&discount, req.total_amount, Utc::now().date_naive())
            .map_err(ApiError::from)?;

    Ok(Json(ApiResponse::ok(CalculateResponse {
        discount_amount,
        discount_name: discount.discount_name,
        discount_type: discount.discount_type,
        discount_value: discount.discount_value,
    })))
}

/// `POST /api/discounts`
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<NewDiscount>,
) -> Result<(StatusCode, Json<ApiResponse<Discount>>), ApiError> {
    user.require(Capability::ManageDiscounts)?;

    validate_name("discount_name", &req.discount_name)?;
    validate_price("discount_value", req.discount_value)?;

    let created = state
        .db
        .discounts()
        .insert(req)
        .await
        .map_err(ApiError::from)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(
            "Discount created successfully",
            created,
        )),
    ))
}

/// `PUT /api/discounts/:id`
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(patch): Json<DiscountPatch>,
) -> Result<Json<ApiResponse<Discount>>, ApiError> {
    user.require(Capability::ManageDiscounts)?;

    if let Some(ref name) = patch.discount_name {
        validate_name("discount_name", name)?;
    }
    if let Some(value) = patch.discount_value {
        validate_price("discount_value", value)?;
    }

    let updated = state
        .db
        .discounts()
        .update(&id, patch)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ApiResponse::ok_with_message(
        "Discount updated successfully",
        updated,
    )))
}

/// `DELETE /api/discounts/:id`
pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    user.require(Capability::ManageDiscounts)?;

    state
        .db
        .discounts()
        .delete(&id)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ApiResponse::message("Discount deleted successfully")))
}
