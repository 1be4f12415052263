//! Checkout endpoints.
//!
//! `create` is the entry point into the transactional core: the repository
//! commits the sale atomically, and only then the invoice email is
//! attempted. Email failure is logged and flagged, never propagated.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::auth::AuthUser;
use crate::email::Invoice;
use crate::error::{ApiError, ErrorCode};
use crate::response::ApiResponse;
use crate::state::AppState;
use minimart_core::validation::{validate_item_count, validate_price, validate_quantity};
use minimart_core::{Capability, Money, PaymentMethod};
use minimart_db::repository::product::ProductWithCategory;
use minimart_db::repository::sale::{
    NewSale, NewSaleItem, SaleItemDetail, SaleWithCashier, SalesStats,
};

#[derive(Debug, Deserialize)]
pub struct CreateSaleRequest {
    pub items: Vec<NewSaleItem>,
    pub discount_id: Option<String>,
    pub payment_method: PaymentMethod,
    pub cash_received: Money,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateSaleResponse {
    pub sale_id: String,
    pub invoice_number: String,
    pub total_amount: Money,
    pub change_amount: Money,
    pub email_sent: bool,
}

#[derive(Debug, Serialize)]
pub struct SaleDetailResponse {
    #[serde(flatten)]
    pub sale: SaleWithCashier,
    pub items: Vec<SaleItemDetail>,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// `POST /api/sales`: the checkout workflow.
pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateSaleRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreateSaleResponse>>), ApiError> {
    user.require(Capability::CreateSales)?;

    validate_item_count(req.items.len())?;
    for item in &req.items {
        validate_quantity(item.quantity)?;
    }
    validate_price("cash_received", req.cash_received.amount())?;

    let customer_email = req
        .customer_email
        .clone()
        .filter(|e| !e.trim().is_empty());

    let (sale, _items) = state
        .db
        .sales()
        .create_sale(NewSale {
            user_id: user.0.user_id.clone(),
            items: req.items,
            discount_id: req.discount_id,
            payment_method: req.payment_method,
            cash_received: req.cash_received,
            customer_name: req.customer_name,
            customer_phone: req.customer_phone,
            customer_email,
        })
        .await
        .map_err(ApiError::from)?;

    // The sale is durable at this point. Email is best-effort.
    let mut email_sent = false;
    if let (Some(to), Some(mailer)) = (sale.customer_email.as_deref(), state.mailer.as_ref()) {
        let items = state
            .db
            .sales()
            .get_items(&sale.sale_id)
            .await
            .unwrap_or_default();

        let invoice = Invoice {
            sale: &sale,
            items: &items,
            cashier_name: &user.0.full_name,
        };

        match mailer.send_invoice(to, &invoice).await {
            Ok(()) => email_sent = true,
            Err(e) => {
                warn!(
                    sale_id = %sale.sale_id,
                    error = %e,
                    "Invoice email failed, sale unaffected"
                );
            }
        }
    }

    let response = CreateSaleResponse {
        sale_id: sale.sale_id,
        invoice_number: sale.invoice_number,
        total_amount: sale.total_amount,
        change_amount: sale.change_amount,
        email_sent,
    };

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok_with_message(
            "Sale created successfully",
            response,
        )),
    ))
}

/// `GET /api/sales`
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
) -> Result<Json<ApiResponse<Vec<SaleWithCashier>>>, ApiError> {
    let sales = state.db.sales().list(50).await.map_err(ApiError::from)?;
    Ok(Json(ApiResponse::ok(sales)))
}

/// `GET /api/sales/:id`
pub async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<SaleDetailResponse>>, ApiError> {
    let sale = state
        .db
        .sales()
        .get_by_id(&id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found("Sale", &id))?;

    let items = state.db.sales().get_items(&id).await.map_err(ApiError::from)?;

    Ok(Json(ApiResponse::ok(SaleDetailResponse { sale, items })))
}

/// `GET /api/sales/stats`
pub async fn stats(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<StatsQuery>,
) -> Result<Json<ApiResponse<SalesStats>>, ApiError> {
    user.require(Capability::CreateSales)?;

    let stats = state
        .db
        .sales()
        .stats(query.start_date, query.end_date)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ApiResponse::ok(stats)))
}

/// `GET /api/sales/barcode/:barcode`: POS scanner lookup; rejects
/// out-of-stock products so the cashier finds out before the cart does.
pub async fn pos_barcode(
    State(state): State<AppState>,
    user: AuthUser,
    Path(barcode): Path<String>,
) -> Result<Json<ApiResponse<ProductWithCategory>>, ApiError> {
    user.require(Capability::CreateSales)?;

    let product = state
        .db
        .products()
        .get_by_barcode(&barcode)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| ApiError::not_found("Product", &barcode))?;

    if product.product.current_stock <= 0 {
        return Err(ApiError::new(
            ErrorCode::InsufficientStock,
            format!("{} is out of stock", product.product.product_name),
        ));
    }

    Ok(Json(ApiResponse::ok(product)))
}
