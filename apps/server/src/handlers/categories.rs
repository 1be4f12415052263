//! Category endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;
use minimart_core::validation::validate_name;
use minimart_core::{Capability, Category};
use minimart_db::repository::category::{CategoryPatch, CategoryWithCount, NewCategory};

/// `GET /api/categories`
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<ApiResponse<Vec<CategoryWithCount>>>, ApiError> {
    let categories = state
        .db
        .categories()
        .list(50)
        .await
        .map_err(ApiError::from)?;
    Ok(Json(ApiResponse::ok(categories)))
}

/// `GET /api/categories/:id`
pub async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Category>>, ApiError> {
    let category = state
        .db
        .categories()
        .get_by_id(&id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found("Category", &id))?;

    Ok(Json(ApiResponse::ok(category)))
}

/// `POST /api/categories`
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<NewCategory>,
) -> Result<(StatusCode, Json<ApiResponse<Category>>), ApiError> {
    user.require(Capability::ManageCategories)?;

    validate_name("category_name", &req.category_name)?;

    let created = state
        .db
        .categories()
        .insert(req)
        .await
        .map_err(ApiError::from)?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(
            "Category created successfully",
            created,
        )),
    ))
}

/// `PUT /api/categories/:id`
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(patch): Json<CategoryPatch>,
) -> Result<Json<ApiResponse<Category>>, ApiError> {
    user.require(Capability::ManageCategories)?;

    if let Some(ref name) = patch.category_name {
        validate_name("category_name", name)?;
    }

    let updated = state
        .db
        .categories()
        .update(&id, patch)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ApiResponse::ok_with_message(
        "Category updated successfully",
        updated,
    )))
}

/// `DELETE /api/categories/:id`: hard delete, blocked while active
/// products reference the category.
pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    user.require(Capability::ManageCategories)?;

    state
        .db
        .categories()
        .delete(&id)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ApiResponse::message("Category deleted successfully")))
}
