//! User management endpoints (admin only).

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;
use minimart_core::validation::validate_name;
use minimart_core::{Capability, Role, User};
use minimart_db::repository::user::UserPatch;

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

/// `GET /api/users`
pub async fn list(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Vec<User>>>, ApiError> {
    user.require(Capability::ManageUsers)?;

    let users = state.db.users().list(50).await.map_err(ApiError::from)?;
    Ok(Json(ApiResponse::ok(users)))
}

/// `GET /api/users/:id`
pub async fn get(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    user.require(Capability::ManageUsers)?;

    let found = state
        .db
        .users()
        .get_by_id(&id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found("User", &id))?;

    Ok(Json(ApiResponse::ok(found)))
}

/// `PUT /api/users/:id`
pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    user.require(Capability::ManageUsers)?;

    if let Some(ref full_name) = req.full_name {
        validate_name("full_name", full_name)?;
    }

    let updated = state
        .db
        .users()
        .update(
            &id,
            UserPatch {
                full_name: req.full_name,
                email: req.email,
                phone: req.phone,
                role: req.role,
                is_active: req.is_active,
            },
        )
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ApiResponse::ok_with_message(
        "User updated successfully",
        updated,
    )))
}

/// `DELETE /api/users/:id`: deactivation, not removal; sales and ledger
/// entries keep their actor reference.
pub async fn remove(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    user.require(Capability::ManageUsers)?;

    state
        .db
        .users()
        .deactivate(&id)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ApiResponse::message("User deactivated successfully")))
}
