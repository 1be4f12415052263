//! # HTTP Handlers
//!
//! One module per resource. Every handler follows the same shape: extract
//! the authenticated user, check the capability the operation needs,
//! validate input, call a repository, wrap the result in the
//! `{success, message?, data?}` envelope.

pub mod auth;
pub mod categories;
pub mod discounts;
pub mod inventory;
pub mod products;
pub mod purchases;
pub mod reports;
pub mod sales;
pub mod suppliers;
pub mod users;

use axum::routing::{get, post, put};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::response::ApiResponse;
use crate::state::AppState;

/// Builds the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        // Auth
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/me", get(auth::me))
        // Users (admin)
        .route("/api/users", get(users::list))
        .route(
            "/api/users/:id",
            get(users::get).put(users::update).delete(users::remove),
        )
        // Products
        .route("/api/products", get(products::list).post(products::create))
        .route("/api/products/stats", get(products::stats))
        .route("/api/products/barcode/:barcode", get(products::by_barcode))
        .route(
            "/api/products/:id",
            get(products::get)
                .put(products::update)
                .delete(products::remove),
        )
        // Categories
        .route(
            "/api/categories",
            get(categories::list).post(categories::create),
        )
        .route(
            "/api/categories/:id",
            get(categories::get)
                .put(categories::update)
                .delete(categories::remove),
        )
        // Suppliers
        .route(
            "/api/suppliers",
            get(suppliers::list).post(suppliers::create),
        )
        .route(
            "/api/suppliers/:id",
            get(suppliers::get)
                .put(suppliers::update)
                .delete(suppliers::remove),
        )
        .route("/api/suppliers/:id/purchases", get(suppliers::purchases))
        // Sales (checkout)
        .route("/api/sales", get(sales::list).post(sales::create))
        .route("/api/sales/stats", get(sales::stats))
        .route("/api/sales/barcode/:barcode", get(sales::pos_barcode))
        .route("/api/sales/:id", get(sales::get))
        // Purchase orders
        .route(
            "/api/purchases",
            get(purchases::list).post(purchases::create),
        )
        .route(
            "/api/purchases/:id",
            get(purchases::get).delete(purchases::remove),
        )
        .route("/api/purchases/:id/status", put(purchases::update_status))
        // Discounts
        .route(
            "/api/discounts",
            get(discounts::list).post(discounts::create),
        )
        .route("/api/discounts/active", get(discounts::active))
        .route("/api/discounts/calculate", post(discounts::calculate))
        .route(
            "/api/discounts/:id",
            get(discounts::get)
                .put(discounts::update)
                .delete(discounts::remove),
        )
        // Inventory ledger
        .route("/api/inventory", get(inventory::list))
        .route("/api/inventory/adjust", post(inventory::adjust))
        .route("/api/inventory/stats", get(inventory::stats))
        .route("/api/inventory/report", get(inventory::report))
        // Reports
        .route("/api/reports/dashboard", get(reports::dashboard))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Liveness probe; no auth.
async fn health() -> Json<ApiResponse<serde_json::Value>> {
    Json(ApiResponse::ok(serde_json::json!({
        "status": "running",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}
