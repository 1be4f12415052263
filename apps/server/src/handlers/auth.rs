//! Authentication endpoints: login, registration, current user.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{hash_password, verify_password, AuthUser};
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;
use minimart_core::validation::{validate_name, validate_password, validate_username};
use minimart_core::{Capability, Role, User};
use minimart_db::repository::user::NewUser;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: User,
    pub token: String,
}

/// `POST /api/auth/login`
///
/// Credential failures are deliberately indistinguishable: unknown
/// username and wrong password both answer "Invalid credentials".
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let user = state
        .db
        .users()
        .get_by_username(&req.username)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if !user.is_active {
        return Err(ApiError::unauthorized("Account is deactivated"));
    }

    if !verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let token = state.jwt.generate_token(&user)?;

    info!(user_id = %user.user_id, username = %user.username, "User logged in");

    Ok(Json(ApiResponse::ok_with_message(
        "Login successful",
        LoginResponse { user, token },
    )))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
}

/// `POST /api/auth/register`: admin only.
pub async fn register(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<User>>), ApiError> {
    user.require(Capability::ManageUsers)?;

    validate_username(&req.username)?;
    validate_password(&req.password)?;
    validate_name("full_name", &req.full_name)?;

    let password_hash = hash_password(&req.password)?;

    let created = state
        .db
        .users()
        .insert(NewUser {
            username: req.username,
            password_hash,
            full_name: req.full_name,
            email: req.email,
            phone: req.phone,
            role: req.role,
        })
        .await
        .map_err(ApiError::from)?;

    info!(user_id = %created.user_id, role = %created.role, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(
            "User registered successfully",
            created,
        )),
    ))
}

/// `GET /api/auth/me`
pub async fn me(user: AuthUser) -> Json<ApiResponse<User>> {
    Json(ApiResponse::ok(user.0))
}
