//! Product catalog endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;
use minimart_core::validation::{validate_barcode, validate_name, validate_price};
use minimart_core::{Capability, Product};
use minimart_db::repository::product::{
    NewProduct, ProductPatch, ProductStats, ProductWithCategory,
};

/// `GET /api/products`
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<ApiResponse<Vec<ProductWithCategory>>>, ApiError> {
    let products = state.db.products().list(50).await.map_err(ApiError::from)?;
    Ok(Json(ApiResponse::ok(products)))
}

/// `GET /api/products/stats`
pub async fn stats(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<ProductStats>>, ApiError> {
    user.require(Capability::ManageProducts)?;

    let stats = state.db.products().stats().await.map_err(ApiError::from)?;
    Ok(Json(ApiResponse::ok(stats)))
}

/// `GET /api/products/:id`
pub async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ProductWithCategory>>, ApiError> {
    let product = state
        .db
        .products()
        .get_with_category(&id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found("Product", &id))?;

    Ok(Json(ApiResponse::ok(product)))
}

/// `GET /api/products/barcode/:barcode`
pub async fn by_barcode(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(barcode): Path<String>,
) -> Result<Json<ApiResponse<ProductWithCategory>>, ApiError> {
    let product = state
        .db
        .products()
        .get_by_barcode(&barcode)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found("Product", &barcode))?;

    Ok(Json(ApiResponse::ok(product)))
}

/// `POST /api/products`
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<NewProduct>,
) -> Result<(StatusCode, Json<ApiResponse<Product>>), ApiError> {
    user.require(Capability::ManageProducts)?;

    validate_name("product_name", &req.product_name)?;
    if let Some(ref barcode) = req.barcode {
        validate_barcode(barcode)?;
    }
    validate_price("purchase_price", req.purchase_price.amount())?;
    validate_price("sale_price", req.sale_price.amount())?;
    validate_price("min_stock", req.min_stock)?;

    let created = state
        .db
        .products()
        .insert(req)
        .await
        .map_err(ApiError::from)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(
            "Product created successfully",
            created,
        )),
    ))
}

/// `PUT /api/products/:id`
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(patch): Json<ProductPatch>,
) -> Result<Json<ApiResponse<Product>>, ApiError> {
    user.require(Capability::ManageProducts)?;

    if let Some(ref name) = patch.product_name {
        validate_name("product_name", name)?;
    }
    if let Some(ref barcode) = patch.barcode {
        validate_barcode(barcode)?;
    }
    if let Some(price) = patch.sale_price {
        validate_price("sale_price", price.amount())?;
    }
    if let Some(price) = patch.purchase_price {
        validate_price("purchase_price", price.amount())?;
    }

    let updated = state
        .db
        .products()
        .update(&id, patch)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ApiResponse::ok_with_message(
        "Product updated successfully",
        updated,
    )))
}

/// `DELETE /api/products/:id`: soft delete.
pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    user.require(Capability::ManageProducts)?;

    state
        .db
        .products()
        .soft_delete(&id)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ApiResponse::message("Product deleted successfully")))
}
