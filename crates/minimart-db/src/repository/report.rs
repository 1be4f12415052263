//! # Report Repository
//!
//! Read-only aggregates for the dashboard. Everything here is derived from
//! the sales tables, the catalog, and the inventory ledger; reports never
//! write.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::DbResult;

/// Repository for dashboard reporting queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

/// A recent sale line for the dashboard.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct RecentSale {
    pub invoice_number: String,
    pub total_amount: i64,
    pub created_at: DateTime<Utc>,
    pub cashier_name: Option<String>,
}

/// A best-selling product line for the dashboard.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct TopProduct {
    pub product_name: Option<String>,
    pub total_sold: i64,
    pub total_revenue: i64,
}

/// A low-stock alert row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct StockAlert {
    pub product_name: String,
    pub current_stock: i64,
    pub min_stock: i64,
}

/// The full dashboard payload.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub today_revenue: i64,
    pub today_sales: i64,
    pub monthly_revenue: i64,
    pub total_products: i64,
    pub low_stock_count: i64,
    pub total_users: i64,
    pub recent_sales: Vec<RecentSale>,
    pub top_products: Vec<TopProduct>,
    pub inventory_alerts: Vec<StockAlert>,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Builds the dashboard for "now".
    pub async fn dashboard(&self) -> DbResult<Dashboard> {
        let now = Utc::now();
        let today = now.date_naive();
        let month = now.format("%Y-%m").to_string();

        let today_revenue: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total_amount), 0) FROM sales WHERE DATE(created_at) = ?1",
        )
        .bind(today)
        .fetch_one(&self.pool)
        .await?;

        let today_sales: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE DATE(created_at) = ?1")
                .bind(today)
                .fetch_one(&self.pool)
                .await?;

        let monthly_revenue: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total_amount), 0) FROM sales WHERE strftime('%Y-%m', created_at) = ?1",
        )
        .bind(&month)
        .fetch_one(&self.pool)
        .await?;

        let total_products: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
                .fetch_one(&self.pool)
                .await?;

        let low_stock_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE is_active = 1 AND current_stock <= min_stock",
        )
        .fetch_one(&self.pool)
        .await?;

        let total_users: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE is_active = 1")
                .fetch_one(&self.pool)
                .await?;

        let recent_sales = sqlx::query_as::<_, RecentSale>(
            r#"
            SELECT s.invoice_number, s.total_amount, s.created_at, u.full_name AS cashier_name
            FROM sales s
            LEFT JOIN users u ON s.user_id = u.user_id
            ORDER BY s.created_at DESC
            LIMIT 5
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let top_products = sqlx::query_as::<_, TopProduct>(
            r#"
            SELECT p.product_name,
                   COALESCE(SUM(si.quantity), 0) AS total_sold,
                   COALESCE(SUM(si.total_price), 0) AS total_revenue
            FROM sale_items si
            LEFT JOIN products p ON si.product_id = p.product_id
            GROUP BY si.product_id, p.product_name
            ORDER BY total_sold DESC
            LIMIT 5
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let inventory_alerts = sqlx::query_as::<_, StockAlert>(
            r#"
            SELECT product_name, current_stock, min_stock
            FROM products
            WHERE is_active = 1 AND current_stock <= min_stock
            ORDER BY (current_stock - min_stock) ASC
            LIMIT 10
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(Dashboard {
            today_revenue,
            today_sales,
            monthly_revenue,
            total_products,
            low_stock_count,
            total_users,
            recent_sales,
            top_products,
            inventory_alerts,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::repository::sale::{NewSale, NewSaleItem};
    use crate::repository::testutil::{seed_product, seed_user, test_db};
    use minimart_core::{Money, PaymentMethod, Role};

    #[tokio::test]
    async fn test_dashboard_counts_todays_sale() {
        let db = test_db().await;
        let cashier = seed_user(&db, Role::Cashier).await;
        let product = seed_product(&db, "Juice", 12_000, 20).await;

        db.sales()
            .create_sale(NewSale {
                user_id: cashier,
                items: vec![NewSaleItem {
                    product_id: product,
                    quantity: 3,
                }],
                discount_id: None,
                payment_method: PaymentMethod::Cash,
                cash_received: Money::new(50_000),
                customer_name: None,
                customer_phone: None,
                customer_email: None,
            })
            .await
            .unwrap();

        let dashboard = db.reports().dashboard().await.unwrap();
        assert_eq!(dashboard.today_sales, 1);
        assert_eq!(dashboard.today_revenue, 36_000);
        assert_eq!(dashboard.monthly_revenue, 36_000);
        assert_eq!(dashboard.total_products, 1);
        assert_eq!(dashboard.recent_sales.len(), 1);
        assert_eq!(dashboard.top_products[0].total_sold, 3);
    }
}
