//! # Purchase Repository
//!
//! Inbound stock receipts and their reversal.
//!
//! Stock is applied at order **creation** time: receiving goods and logging
//! them is one act. Completing or cancelling an order later only flips its
//! status. Deleting is the true undo: allowed while the order is still
//! pending, it reverses every line's stock increment and writes compensating
//! `adjustment` ledger entries in the same transaction that removes the
//! order.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use minimart_core::validation::validate_item_count;
use minimart_core::{
    CoreError, Money, PurchaseOrder, PurchaseOrderItem, PurchaseStatus, ValidationError,
};

/// Repository for purchase order database operations.
#[derive(Debug, Clone)]
pub struct PurchaseRepository {
    pool: SqlitePool,
}

/// One received line. Unit price is supplied by the caller here; purchase
/// costs come from the supplier, not the catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPurchaseItem {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
}

/// Input for receiving a purchase order. `user_id` is the authenticated
/// staff member, filled in by the handler.
#[derive(Debug, Clone)]
pub struct NewPurchaseOrder {
    pub supplier_id: String,
    pub user_id: String,
    pub items: Vec<NewPurchaseItem>,
    pub notes: Option<String>,
}

/// Purchase order with supplier and staff names joined in.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PurchaseOrderDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub order: PurchaseOrder,
    pub supplier_name: Option<String>,
    pub staff_name: Option<String>,
}

/// Order item with product details.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PurchaseItemDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub item: PurchaseOrderItem,
    pub product_name: Option<String>,
    pub barcode: Option<String>,
    pub unit: Option<String>,
}

impl PurchaseRepository {
    /// Creates a new PurchaseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PurchaseRepository { pool }
    }

    /// Receives a purchase order: header, items, stock increments, and `in`
    /// ledger entries, all in one transaction.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - supplier or any product id unknown/inactive
    pub async fn create_order(&self, new: NewPurchaseOrder) -> DbResult<PurchaseOrder> {
        validate_item_count(new.items.len()).map_err(CoreError::from)?;

        let mut tx = self.pool.begin().await?;

        let supplier_exists: Option<String> =
            sqlx::query_scalar("SELECT supplier_id FROM suppliers WHERE supplier_id = ?1")
                .bind(&new.supplier_id)
                .fetch_optional(&mut *tx)
                .await?;
        if supplier_exists.is_none() {
            return Err(DbError::not_found("Supplier", &new.supplier_id));
        }

        let mut total_amount = Money::zero();
        for item in &new.items {
            if item.quantity <= 0 {
                return Err(CoreError::from(ValidationError::MustBePositive {
                    field: "quantity".to_string(),
                })
                .into());
            }
            total_amount += item.unit_price.multiply_quantity(item.quantity);
        }

        let now = Utc::now();
        let order = PurchaseOrder {
            purchase_order_id: Uuid::new_v4().to_string(),
            order_number: generate_order_number(),
            supplier_id: new.supplier_id,
            user_id: new.user_id.clone(),
            total_amount,
            status: PurchaseStatus::Pending,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %order.purchase_order_id, number = %order.order_number, "Inserting purchase order");

        sqlx::query(
            r#"
            INSERT INTO purchase_orders (
                purchase_order_id, order_number, supplier_id, user_id,
                total_amount, status, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&order.purchase_order_id)
        .bind(&order.order_number)
        .bind(&order.supplier_id)
        .bind(&order.user_id)
        .bind(order.total_amount)
        .bind(order.status)
        .bind(&order.notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for item in &new.items {
            let previous_stock: Option<i64> = sqlx::query_scalar(
                "SELECT current_stock FROM products WHERE product_id = ?1 AND is_active = 1",
            )
            .bind(&item.product_id)
            .fetch_optional(&mut *tx)
            .await?;

            let previous_stock =
                previous_stock.ok_or_else(|| DbError::not_found("Product", &item.product_id))?;
            let new_stock = previous_stock + item.quantity;

            sqlx::query(
                r#"
                INSERT INTO purchase_order_items (
                    purchase_order_item_id, purchase_order_id, product_id,
                    quantity, unit_price, total_price, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&order.purchase_order_id)
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(item.unit_price)
            .bind(item.unit_price.multiply_quantity(item.quantity))
            .bind(now)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                UPDATE products
                SET current_stock = current_stock + ?2, updated_at = ?3
                WHERE product_id = ?1
                "#,
            )
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                INSERT INTO inventory_logs (
                    log_id, product_id, user_id, transaction_type,
                    quantity_change, previous_stock, new_stock,
                    reference_id, reference_type, notes, created_at
                ) VALUES (?1, ?2, ?3, 'in', ?4, ?5, ?6, ?7, 'purchase', ?8, ?9)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&item.product_id)
            .bind(&new.user_id)
            .bind(item.quantity)
            .bind(previous_stock)
            .bind(new_stock)
            .bind(&order.purchase_order_id)
            .bind("Stock received")
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            order_id = %order.purchase_order_id,
            number = %order.order_number,
            total = %order.total_amount,
            "Purchase order committed"
        );

        Ok(order)
    }

    /// Lists recent purchase orders with supplier and staff names.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<PurchaseOrderDetail>> {
        let orders = sqlx::query_as::<_, PurchaseOrderDetail>(
            r#"
            SELECT po.*, s.supplier_name, u.full_name AS staff_name
            FROM purchase_orders po
            LEFT JOIN suppliers s ON po.supplier_id = s.supplier_id
            LEFT JOIN users u ON po.user_id = u.user_id
            ORDER BY po.created_at DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Gets a purchase order by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<PurchaseOrderDetail>> {
        let order = sqlx::query_as::<_, PurchaseOrderDetail>(
            r#"
            SELECT po.*, s.supplier_name, u.full_name AS staff_name
            FROM purchase_orders po
            LEFT JOIN suppliers s ON po.supplier_id = s.supplier_id
            LEFT JOIN users u ON po.user_id = u.user_id
            WHERE po.purchase_order_id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Gets all items for a purchase order.
    pub async fn get_items(&self, order_id: &str) -> DbResult<Vec<PurchaseItemDetail>> {
        let items = sqlx::query_as::<_, PurchaseItemDetail>(
            r#"
            SELECT poi.*, p.product_name, p.barcode, p.unit
            FROM purchase_order_items poi
            LEFT JOIN products p ON poi.product_id = p.product_id
            WHERE poi.purchase_order_id = ?1
            ORDER BY poi.created_at
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Transitions a pending order to completed or cancelled.
    ///
    /// Single-column update; stock was already applied at creation.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - order doesn't exist
    /// * `DbError::Domain(InvalidState)` - order is not pending
    pub async fn update_status(&self, id: &str, status: PurchaseStatus) -> DbResult<()> {
        let current = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Purchase order", id))?;

        if current.order.status != PurchaseStatus::Pending {
            return Err(CoreError::InvalidState {
                entity: "Purchase order".to_string(),
                status: current.order.status.as_str().to_string(),
                operation: "change status".to_string(),
            }
            .into());
        }

        sqlx::query(
            "UPDATE purchase_orders SET status = ?2, updated_at = ?3 WHERE purchase_order_id = ?1",
        )
        .bind(id)
        .bind(status)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        info!(order_id = %id, status = %status.as_str(), "Purchase order status updated");
        Ok(())
    }

    /// Deletes a pending order, reversing its stock effect.
    ///
    /// Each line's quantity is subtracted back out with a compensating
    /// `adjustment` ledger entry; then the order and its items go away.
    /// All of it in one transaction.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - order doesn't exist
    /// * `DbError::Domain(InvalidState)` - order is not pending
    /// * `DbError::Domain(InsufficientStock)` - received stock was already
    ///   sold, so the reversal would drive stock negative
    pub async fn delete_order(&self, id: &str, user_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, PurchaseOrder>(
            "SELECT * FROM purchase_orders WHERE purchase_order_id = ?1",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Purchase order", id))?;

        if order.status != PurchaseStatus::Pending {
            return Err(CoreError::InvalidState {
                entity: "Purchase order".to_string(),
                status: order.status.as_str().to_string(),
                operation: "delete".to_string(),
            }
            .into());
        }

        let items = sqlx::query_as::<_, PurchaseOrderItem>(
            "SELECT * FROM purchase_order_items WHERE purchase_order_id = ?1",
        )
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;

        let now = Utc::now();

        for item in &items {
            let row: Option<(i64, String)> = sqlx::query_as(
                "SELECT current_stock, product_name FROM products WHERE product_id = ?1",
            )
            .bind(&item.product_id)
            .fetch_optional(&mut *tx)
            .await?;

            let (previous_stock, product_name) =
                row.ok_or_else(|| DbError::not_found("Product", &item.product_id))?;

            if previous_stock < item.quantity {
                return Err(CoreError::InsufficientStock {
                    product: product_name,
                    available: previous_stock,
                    requested: item.quantity,
                }
                .into());
            }
            let new_stock = previous_stock - item.quantity;

            sqlx::query(
                r#"
                UPDATE products
                SET current_stock = current_stock - ?2, updated_at = ?3
                WHERE product_id = ?1 AND current_stock >= ?2
                "#,
            )
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                INSERT INTO inventory_logs (
                    log_id, product_id, user_id, transaction_type,
                    quantity_change, previous_stock, new_stock,
                    reference_id, reference_type, notes, created_at
                ) VALUES (?1, ?2, ?3, 'adjustment', ?4, ?5, ?6, ?7, 'purchase', ?8, ?9)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&item.product_id)
            .bind(user_id)
            .bind(-item.quantity)
            .bind(previous_stock)
            .bind(new_stock)
            .bind(id)
            .bind("Purchase order deleted")
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        // Items cascade with the header
        sqlx::query("DELETE FROM purchase_orders WHERE purchase_order_id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(order_id = %id, items = items.len(), "Purchase order deleted, stock reversed");
        Ok(())
    }
}

/// Generates an order number: `PO-YYYY-NNNNNNNN`.
fn generate_order_number() -> String {
    let now = Utc::now();
    let seq = (now.timestamp_micros() % 100_000_000).abs();
    format!("PO-{}-{:08}", now.format("%Y"), seq)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testutil::{seed_product, seed_user, stock_of, test_db};
    use minimart_core::Role;

    async fn seed_supplier(db: &crate::Database) -> String {
        let supplier_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO suppliers (supplier_id, supplier_name, is_active, created_at, updated_at)
             VALUES (?1, ?2, 1, ?3, ?3)",
        )
        .bind(&supplier_id)
        .bind(format!("Supplier {}", &supplier_id[..8]))
        .bind(now)
        .execute(db.pool())
        .await
        .unwrap();
        supplier_id
    }

    fn order(
        supplier_id: &str,
        user_id: &str,
        items: Vec<NewPurchaseItem>,
    ) -> NewPurchaseOrder {
        NewPurchaseOrder {
            supplier_id: supplier_id.to_string(),
            user_id: user_id.to_string(),
            items,
            notes: None,
        }
    }

    fn item(product_id: &str, quantity: i64, unit_price: i64) -> NewPurchaseItem {
        NewPurchaseItem {
            product_id: product_id.to_string(),
            quantity,
            unit_price: Money::new(unit_price),
        }
    }

    #[tokio::test]
    async fn test_create_order_increments_stock_and_logs() {
        let db = test_db().await;
        let staff = seed_user(&db, Role::Staff).await;
        let supplier = seed_supplier(&db).await;
        let product = seed_product(&db, "Flour", 20_000, 5).await;

        let created = db
            .purchases()
            .create_order(order(&supplier, &staff, vec![item(&product, 20, 15_000)]))
            .await
            .unwrap();

        assert_eq!(created.status, PurchaseStatus::Pending);
        assert_eq!(created.total_amount, Money::new(300_000));
        assert!(created.order_number.starts_with("PO-"));

        assert_eq!(stock_of(&db, &product).await, 25);

        let (tx_type, change, prev, new): (String, i64, i64, i64) = sqlx::query_as(
            "SELECT transaction_type, quantity_change, previous_stock, new_stock
             FROM inventory_logs WHERE product_id = ?1",
        )
        .bind(&product)
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(tx_type, "in");
        assert_eq!((change, prev, new), (20, 5, 25));
    }

    #[tokio::test]
    async fn test_delete_pending_order_reverses_stock() {
        let db = test_db().await;
        let staff = seed_user(&db, Role::Staff).await;
        let supplier = seed_supplier(&db).await;
        let product = seed_product(&db, "Flour", 20_000, 5).await;

        let created = db
            .purchases()
            .create_order(order(&supplier, &staff, vec![item(&product, 20, 15_000)]))
            .await
            .unwrap();
        assert_eq!(stock_of(&db, &product).await, 25);

        db.purchases()
            .delete_order(&created.purchase_order_id, &staff)
            .await
            .unwrap();

        // Stock back to where it started
        assert_eq!(stock_of(&db, &product).await, 5);

        // Compensating adjustment entry recorded
        let reversal: (String, i64, i64, i64) = sqlx::query_as(
            "SELECT transaction_type, quantity_change, previous_stock, new_stock
             FROM inventory_logs WHERE product_id = ?1 AND transaction_type = 'adjustment'",
        )
        .bind(&product)
        .fetch_one(db.pool())
        .await
        .unwrap();
        assert_eq!(reversal.0, "adjustment");
        assert_eq!((reversal.1, reversal.2, reversal.3), (-20, 25, 5));

        // Order and items are gone
        assert!(db
            .purchases()
            .get_by_id(&created.purchase_order_id)
            .await
            .unwrap()
            .is_none());
        let orphans: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM purchase_order_items WHERE purchase_order_id = ?1")
                .bind(&created.purchase_order_id)
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert_eq!(orphans, 0);
    }

    #[tokio::test]
    async fn test_delete_non_pending_rejected() {
        let db = test_db().await;
        let staff = seed_user(&db, Role::Staff).await;
        let supplier = seed_supplier(&db).await;
        let product = seed_product(&db, "Flour", 20_000, 5).await;

        let created = db
            .purchases()
            .create_order(order(&supplier, &staff, vec![item(&product, 10, 15_000)]))
            .await
            .unwrap();

        db.purchases()
            .update_status(&created.purchase_order_id, PurchaseStatus::Completed)
            .await
            .unwrap();

        let err = db
            .purchases()
            .delete_order(&created.purchase_order_id, &staff)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InvalidState { .. })
        ));

        // Stock untouched by the failed delete
        assert_eq!(stock_of(&db, &product).await, 15);
    }

    #[tokio::test]
    async fn test_status_change_does_not_touch_stock() {
        let db = test_db().await;
        let staff = seed_user(&db, Role::Staff).await;
        let supplier = seed_supplier(&db).await;
        let product = seed_product(&db, "Sugar", 12_000, 0).await;

        let created = db
            .purchases()
            .create_order(order(&supplier, &staff, vec![item(&product, 8, 9_000)]))
            .await
            .unwrap();
        assert_eq!(stock_of(&db, &product).await, 8);

        db.purchases()
            .update_status(&created.purchase_order_id, PurchaseStatus::Completed)
            .await
            .unwrap();
        assert_eq!(stock_of(&db, &product).await, 8);

        let fetched = db
            .purchases()
            .get_by_id(&created.purchase_order_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(fetched.order.status, PurchaseStatus::Completed);
    }

    #[tokio::test]
    async fn test_unknown_product_rolls_back_order() {
        let db = test_db().await;
        let staff = seed_user(&db, Role::Staff).await;
        let supplier = seed_supplier(&db).await;
        let product = seed_product(&db, "Salt", 4_000, 2).await;

        let err = db
            .purchases()
            .create_order(order(
                &supplier,
                &staff,
                vec![item(&product, 10, 3_000), item("missing", 1, 1_000)],
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        // First line's increment rolled back with the rest
        assert_eq!(stock_of(&db, &product).await, 2);
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM purchase_orders")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_unknown_supplier_rejected() {
        let db = test_db().await;
        let staff = seed_user(&db, Role::Staff).await;
        let product = seed_product(&db, "Salt", 4_000, 2).await;

        let err = db
            .purchases()
            .create_order(order("no-supplier", &staff, vec![item(&product, 1, 1_000)]))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
