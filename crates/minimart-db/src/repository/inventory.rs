//! # Inventory Repository
//!
//! The append-only stock movement ledger, plus the manual adjustment
//! workflow and movement aggregates.
//!
//! Nothing in this module (or anywhere else) updates or deletes ledger
//! rows. Corrections are new `adjustment` entries.

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use minimart_core::{CoreError, InventoryLogEntry, Product};

/// Repository for inventory ledger operations.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

/// Ledger entry with product and actor names joined in.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct InventoryLogDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub entry: InventoryLogEntry,
    pub product_name: Option<String>,
    pub barcode: Option<String>,
    pub user_name: Option<String>,
}

/// Result of a manual adjustment, echoed back to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct AdjustmentOutcome {
    pub product_name: String,
    pub previous_stock: i64,
    pub new_stock: i64,
    pub quantity_change: i64,
}

/// Ledger-wide movement totals.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct MovementTotals {
    pub total_products: i64,
    pub total_in: i64,
    pub total_out: i64,
    pub total_adjustments: i64,
}

/// Per-product movement row for the top-movers list.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductMovement {
    pub product_name: Option<String>,
    pub barcode: Option<String>,
    pub total_movement: i64,
    pub total_in: i64,
    pub total_out: i64,
}

/// A product at or below its reorder threshold.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct LowStockProduct {
    pub product_name: String,
    pub barcode: Option<String>,
    pub current_stock: i64,
    pub min_stock: i64,
}

/// Combined stats payload.
#[derive(Debug, Clone, Serialize)]
pub struct InventoryStats {
    pub overall: MovementTotals,
    pub top_products: Vec<ProductMovement>,
    pub low_stock_products: Vec<LowStockProduct>,
}

/// One row of the date-ranged in/out report.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductMovementReport {
    pub product_id: String,
    pub product_name: String,
    pub barcode: Option<String>,
    pub current_stock: i64,
    pub total_transactions: i64,
    pub total_in: i64,
    pub total_out: i64,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Manually adjusts a product's stock by a signed delta.
    ///
    /// Atomic: the stock write and the `adjustment` ledger entry commit
    /// together or not at all.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - product unknown or inactive
    /// * `DbError::Domain(InsufficientStock)` - delta would drive stock
    ///   below zero; stock is left untouched
    pub async fn adjust(
        &self,
        product_id: &str,
        user_id: &str,
        quantity_change: i64,
        notes: Option<String>,
    ) -> DbResult<AdjustmentOutcome> {
        let mut tx = self.pool.begin().await?;

        let product = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE product_id = ?1 AND is_active = 1",
        )
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Product", product_id))?;

        let previous_stock = product.current_stock;
        let new_stock = previous_stock + quantity_change;

        if new_stock < 0 {
            return Err(CoreError::InsufficientStock {
                product: product.product_name,
                available: previous_stock,
                requested: -quantity_change,
            }
            .into());
        }

        let now = Utc::now();

        sqlx::query(
            "UPDATE products SET current_stock = ?2, updated_at = ?3 WHERE product_id = ?1",
        )
        .bind(product_id)
        .bind(new_stock)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO inventory_logs (
                log_id, product_id, user_id, transaction_type,
                quantity_change, previous_stock, new_stock,
                reference_id, reference_type, notes, created_at
            ) VALUES (?1, ?2, ?3, 'adjustment', ?4, ?5, ?6, NULL, 'manual', ?7, ?8)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(product_id)
        .bind(user_id)
        .bind(quantity_change)
        .bind(previous_stock)
        .bind(new_stock)
        .bind(&notes)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            product_id = %product_id,
            change = quantity_change,
            previous = previous_stock,
            new = new_stock,
            "Stock adjusted"
        );

        Ok(AdjustmentOutcome {
            product_name: product.product_name,
            previous_stock,
            new_stock,
            quantity_change,
        })
    }

    /// Lists recent ledger entries with product and actor names.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<InventoryLogDetail>> {
        let logs = sqlx::query_as::<_, InventoryLogDetail>(
            r#"
            SELECT il.*, p.product_name, p.barcode, u.full_name AS user_name
            FROM inventory_logs il
            LEFT JOIN products p ON il.product_id = p.product_id
            LEFT JOIN users u ON il.user_id = u.user_id
            ORDER BY il.created_at DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(logs)
    }

    /// Movement totals, top movers, and low-stock list, optionally filtered
    /// to a date range.
    pub async fn stats(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> DbResult<InventoryStats> {
        let overall = sqlx::query_as::<_, MovementTotals>(
            r#"
            SELECT
                COUNT(DISTINCT product_id) AS total_products,
                COALESCE(SUM(CASE WHEN transaction_type = 'in' THEN quantity_change ELSE 0 END), 0) AS total_in,
                COALESCE(SUM(CASE WHEN transaction_type = 'out' THEN ABS(quantity_change) ELSE 0 END), 0) AS total_out,
                COALESCE(SUM(CASE WHEN transaction_type = 'adjustment' THEN quantity_change ELSE 0 END), 0) AS total_adjustments
            FROM inventory_logs
            WHERE (?1 IS NULL OR DATE(created_at) BETWEEN ?1 AND ?2)
            "#,
        )
        .bind(start_date)
        .bind(end_date)
        .fetch_one(&self.pool)
        .await?;

        let top_products = sqlx::query_as::<_, ProductMovement>(
            r#"
            SELECT
                p.product_name,
                p.barcode,
                COALESCE(SUM(ABS(il.quantity_change)), 0) AS total_movement,
                COALESCE(SUM(CASE WHEN il.transaction_type = 'in' THEN il.quantity_change ELSE 0 END), 0) AS total_in,
                COALESCE(SUM(CASE WHEN il.transaction_type = 'out' THEN ABS(il.quantity_change) ELSE 0 END), 0) AS total_out
            FROM inventory_logs il
            LEFT JOIN products p ON il.product_id = p.product_id
            WHERE (?1 IS NULL OR DATE(il.created_at) BETWEEN ?1 AND ?2)
            GROUP BY il.product_id, p.product_name, p.barcode
            ORDER BY total_movement DESC
            LIMIT 10
            "#,
        )
        .bind(start_date)
        .bind(end_date)
        .fetch_all(&self.pool)
        .await?;

        let low_stock_products = sqlx::query_as::<_, LowStockProduct>(
            r#"
            SELECT product_name, barcode, current_stock, min_stock
            FROM products
            WHERE is_active = 1 AND current_stock <= min_stock
            ORDER BY (current_stock - min_stock) ASC
            LIMIT 10
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(InventoryStats {
            overall,
            top_products,
            low_stock_products,
        })
    }

    /// Per-product in/out report for a date range (both bounds required).
    pub async fn report(
        &self,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> DbResult<Vec<ProductMovementReport>> {
        let rows = sqlx::query_as::<_, ProductMovementReport>(
            r#"
            SELECT
                p.product_id,
                p.product_name,
                p.barcode,
                p.current_stock,
                COUNT(il.log_id) AS total_transactions,
                COALESCE(SUM(CASE WHEN il.transaction_type = 'in' THEN il.quantity_change ELSE 0 END), 0) AS total_in,
                COALESCE(SUM(CASE WHEN il.transaction_type = 'out' THEN ABS(il.quantity_change) ELSE 0 END), 0) AS total_out
            FROM products p
            LEFT JOIN inventory_logs il ON p.product_id = il.product_id
                AND DATE(il.created_at) BETWEEN ?1 AND ?2
            WHERE p.is_active = 1
            GROUP BY p.product_id, p.product_name, p.barcode, p.current_stock
            ORDER BY p.product_name
            "#,
        )
        .bind(start_date)
        .bind(end_date)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testutil::{seed_product, seed_user, stock_of, test_db};
    use minimart_core::Role;

    #[tokio::test]
    async fn test_adjust_up_and_down() {
        let db = test_db().await;
        let staff = seed_user(&db, Role::Staff).await;
        let product = seed_product(&db, "Tea", 7_000, 10).await;

        let up = db
            .inventory()
            .adjust(&product, &staff, 5, Some("Found in back room".to_string()))
            .await
            .unwrap();
        assert_eq!((up.previous_stock, up.new_stock), (10, 15));

        let down = db.inventory().adjust(&product, &staff, -3, None).await.unwrap();
        assert_eq!((down.previous_stock, down.new_stock), (15, 12));

        assert_eq!(stock_of(&db, &product).await, 12);
    }

    #[tokio::test]
    async fn test_adjustment_below_zero_rejected() {
        let db = test_db().await;
        let staff = seed_user(&db, Role::Staff).await;
        let product = seed_product(&db, "Tea", 7_000, 3).await;

        let err = db
            .inventory()
            .adjust(&product, &staff, -5, None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 3, .. })
        ));

        // Stock untouched, no ledger entry written
        assert_eq!(stock_of(&db, &product).await, 3);
        let logs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory_logs")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(logs, 0);
    }

    #[tokio::test]
    async fn test_adjust_unknown_product() {
        let db = test_db().await;
        let staff = seed_user(&db, Role::Staff).await;

        let err = db
            .inventory()
            .adjust("missing", &staff, 1, None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_joins_names() {
        let db = test_db().await;
        let staff = seed_user(&db, Role::Staff).await;
        let product = seed_product(&db, "Tea", 7_000, 10).await;

        db.inventory().adjust(&product, &staff, 2, None).await.unwrap();

        let logs = db.inventory().list(10).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].product_name.as_deref(), Some("Tea"));
        assert_eq!(logs[0].user_name.as_deref(), Some("Test User"));
        assert!(logs[0].entry.is_consistent());
    }

    /// Full stock lifecycle: a product born at zero stock is purchased
    /// into, sold from, and manually corrected; the ledger must hold
    /// exactly one entry per movement with chained snapshots 0→10→6→5.
    #[tokio::test]
    async fn test_full_stock_lifecycle_keeps_ledger_chained() {
        use crate::repository::purchase::{NewPurchaseItem, NewPurchaseOrder};
        use crate::repository::sale::{NewSale, NewSaleItem};
        use minimart_core::PaymentMethod;

        let db = test_db().await;
        let staff = seed_user(&db, Role::Staff).await;
        let cashier = seed_user(&db, Role::Cashier).await;
        let product = seed_product(&db, "Cooking Oil", 40_000, 0).await;

        let supplier_id = {
            let now = Utc::now();
            let id = uuid::Uuid::new_v4().to_string();
            sqlx::query(
                "INSERT INTO suppliers (supplier_id, supplier_name, is_active, created_at, updated_at)
                 VALUES (?1, 'Lifecycle Supplier', 1, ?2, ?2)",
            )
            .bind(&id)
            .bind(now)
            .execute(db.pool())
            .await
            .unwrap();
            id
        };

        // Purchase 10 units: 0 → 10
        db.purchases()
            .create_order(NewPurchaseOrder {
                supplier_id,
                user_id: staff.clone(),
                items: vec![NewPurchaseItem {
                    product_id: product.clone(),
                    quantity: 10,
                    unit_price: minimart_core::Money::new(30_000),
                }],
                notes: None,
            })
            .await
            .unwrap();

        // Sell 4 units: 10 → 6
        db.sales()
            .create_sale(NewSale {
                user_id: cashier,
                items: vec![NewSaleItem {
                    product_id: product.clone(),
                    quantity: 4,
                }],
                discount_id: None,
                payment_method: PaymentMethod::Cash,
                cash_received: minimart_core::Money::new(200_000),
                customer_name: None,
                customer_phone: None,
                customer_email: None,
            })
            .await
            .unwrap();

        // Correct by -1: 6 → 5
        db.inventory()
            .adjust(&product, &staff, -1, Some("Broken bottle".to_string()))
            .await
            .unwrap();

        assert_eq!(stock_of(&db, &product).await, 5);

        let ledger: Vec<(String, i64, i64, i64)> = sqlx::query_as(
            "SELECT transaction_type, quantity_change, previous_stock, new_stock
             FROM inventory_logs WHERE product_id = ?1 ORDER BY created_at",
        )
        .bind(&product)
        .fetch_all(db.pool())
        .await
        .unwrap();

        assert_eq!(ledger.len(), 3);
        assert_eq!(ledger[0], ("in".to_string(), 10, 0, 10));
        assert_eq!(ledger[1], ("out".to_string(), -4, 10, 6));
        assert_eq!(ledger[2], ("adjustment".to_string(), -1, 6, 5));

        // Snapshots chain: each entry starts where the previous ended
        for pair in ledger.windows(2) {
            assert_eq!(pair[0].3, pair[1].2);
        }
    }

    #[tokio::test]
    async fn test_stats_totals() {
        let db = test_db().await;
        let staff = seed_user(&db, Role::Staff).await;
        let product = seed_product(&db, "Tea", 7_000, 10).await;

        db.inventory().adjust(&product, &staff, 5, None).await.unwrap();
        db.inventory().adjust(&product, &staff, -2, None).await.unwrap();

        let stats = db.inventory().stats(None, None).await.unwrap();
        assert_eq!(stats.overall.total_products, 1);
        // Both movements are adjustments: +5 - 2 = +3
        assert_eq!(stats.overall.total_adjustments, 3);
        assert_eq!(stats.overall.total_in, 0);
        assert_eq!(stats.overall.total_out, 0);
    }
}
