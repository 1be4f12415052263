//! Purchase order endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;
use minimart_core::validation::{validate_item_count, validate_price, validate_quantity};
use minimart_core::{Capability, Money, PurchaseStatus};
use minimart_db::repository::purchase::{
    NewPurchaseItem, NewPurchaseOrder, PurchaseItemDetail, PurchaseOrderDetail,
};

#[derive(Debug, Deserialize)]
pub struct CreatePurchaseRequest {
    pub supplier_id: String,
    pub items: Vec<NewPurchaseItem>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatePurchaseResponse {
    pub purchase_order_id: String,
    pub order_number: String,
    pub total_amount: Money,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: PurchaseStatus,
}

#[derive(Debug, Serialize)]
pub struct PurchaseDetailResponse {
    #[serde(flatten)]
    pub order: PurchaseOrderDetail,
    pub items: Vec<PurchaseItemDetail>,
}

/// `POST /api/purchases`: receive stock from a supplier.
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreatePurchaseRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreatePurchaseResponse>>), ApiError> {
    user.require(Capability::ManagePurchases)?;

    validate_item_count(req.items.len())?;
    for item in &req.items {
        validate_quantity(item.quantity)?;
        validate_price("unit_price", item.unit_price.amount())?;
    }

    let order = state
        .db
        .purchases()
        .create_order(NewPurchaseOrder {
            supplier_id: req.supplier_id,
            user_id: user.0.user_id.clone(),
            items: req.items,
            notes: req.notes,
        })
        .await
        .map_err(ApiError::from)?;

    let response = CreatePurchaseResponse {
        purchase_order_id: order.purchase_order_id,
        order_number: order.order_number,
        total_amount: order.total_amount,
    };

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(
            "Purchase order created successfully",
            response,
        )),
    ))
}

/// `GET /api/purchases`
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<ApiResponse<Vec<PurchaseOrderDetail>>>, ApiError> {
    let orders = state.db.purchases().list(50).await.map_err(ApiError::from)?;
    Ok(Json(ApiResponse::ok(orders)))
}

/// `GET /api/purchases/:id`
pub async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<PurchaseDetailResponse>>, ApiError> {
    let order = state
        .db
        .purchases()
        .get_by_id(&id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found("Purchase order", &id))?;

    let items = state
        .db
        .purchases()
        .get_items(&id)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ApiResponse::ok(PurchaseDetailResponse { order, items })))
}

/// `PUT /api/purchases/:id/status`: pending → completed | cancelled.
/// Stock is untouched; it was applied when the order was created.
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    user.require(Capability::ManagePurchases)?;

    state
        .db
        .purchases()
        .update_status(&id, req.status)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ApiResponse::message(
        "Purchase order status updated successfully",
    )))
}

/// `DELETE /api/purchases/:id`: pending only; reverses the stock the
/// order brought in.
pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    user.require(Capability::ManagePurchases)?;

    state
        .db
        .purchases()
        .delete_order(&id, &user.0.user_id)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ApiResponse::message(
        "Purchase order deleted successfully",
    )))
}
