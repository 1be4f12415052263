//! Supplier endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;
use minimart_core::validation::validate_name;
use minimart_core::{Capability, PurchaseOrder, Supplier};
use minimart_db::repository::supplier::{NewSupplier, SupplierPatch};

/// `GET /api/suppliers`
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<ApiResponse<Vec<Supplier>>>, ApiError> {
    let suppliers = state.db.suppliers().list(50).await.map_err(ApiError::from)?;
    Ok(Json(ApiResponse::ok(suppliers)))
}

/// `GET /api/suppliers/:id`
pub async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Supplier>>, ApiError> {
    let supplier = state
        .db
        .suppliers()
        .get_by_id(&id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found("Supplier", &id))?;

    Ok(Json(ApiResponse::ok(supplier)))
}

/// `GET /api/suppliers/:id/purchases`
pub async fn purchases(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<PurchaseOrder>>>, ApiError> {
    // 404 for a bad supplier id rather than an empty list
    state
        .db
        .suppliers()
        .get_by_id(&id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found("Supplier", &id))?;

    let orders = state
        .db
        .suppliers()
        .purchase_orders(&id)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ApiResponse::ok(orders)))
}

/// `POST /api/suppliers`
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<NewSupplier>,
) -> Result<(StatusCode, Json<ApiResponse<Supplier>>), ApiError> {
    user.require(Capability::ManageSuppliers)?;

    validate_name("supplier_name", &req.supplier_name)?;

    let created = state
        .db
        .suppliers()
        .insert(req)
        .await
        .map_err(ApiError::from)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(
            "Supplier created successfully",
            created,
        )),
    ))
}

/// `PUT /api/suppliers/:id`
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(patch): Json<SupplierPatch>,
) -> Result<Json<ApiResponse<Supplier>>, ApiError> {
    user.require(Capability::ManageSuppliers)?;

    if let Some(ref name) = patch.supplier_name {
        validate_name("supplier_name", name)?;
    }

    let updated = state
        .db
        .suppliers()
        .update(&id, patch)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ApiResponse::ok_with_message(
        "Supplier updated successfully",
        updated,
    )))
}

/// `DELETE /api/suppliers/:id`: soft delete, blocked while purchase
/// orders reference the supplier.
pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    user.require(Capability::ManageSuppliers)?;

    state
        .db
        .suppliers()
        .soft_delete(&id)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ApiResponse::message("Supplier deleted successfully")))
}
