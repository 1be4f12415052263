//! Reporting endpoints (read-only aggregates).

use axum::extract::State;
use axum::Json;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;
use minimart_core::Capability;
use minimart_db::repository::report::Dashboard;

/// `GET /api/reports/dashboard`
pub async fn dashboard(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ApiResponse<Dashboard>>, ApiError> {
    user.require(Capability::ViewReports)?;

    let dashboard = state.db.reports().dashboard().await.map_err(ApiError::from)?;
    Ok(Json(ApiResponse::ok(dashboard)))
}
