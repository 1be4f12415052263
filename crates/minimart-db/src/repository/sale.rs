//! # Sale Repository
//!
//! Checkout persistence and queries.
//!
//! ## Checkout Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  create_sale()                     ── single transaction ──         │
//! │                                                                     │
//! │  1. VALIDATE (no writes yet)                                        │
//! │     └── every product exists, is active, has sufficient stock       │
//! │     └── subtotal priced from the CATALOG sale_price, never from     │
//! │         the request (price tampering is structurally impossible)    │
//! │     └── discount resolved: active AND today inside its window       │
//! │                                                                     │
//! │  2. WRITE                                                           │
//! │     └── insert sale header                                          │
//! │     └── per item: insert sale_item (price snapshot)                 │
//! │                   decrement stock (guarded: stock >= qty)           │
//! │                   append ledger entry (out, -qty, prev → new)       │
//! │                                                                     │
//! │  3. COMMIT, or roll back everything on the first error              │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The ledger's previous/new snapshots are re-read inside the transaction
//! immediately before each decrement, so they agree with the committed
//! value even when one sale lists the same product twice.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use minimart_core::validation::validate_item_count;
use minimart_core::{
    discount::resolve_reduction, CoreError, Discount, Money, PaymentMethod, Product, Sale,
    SaleItem, ValidationError,
};

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

/// One requested line: product and quantity only. Prices come from the
/// catalog at checkout time.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSaleItem {
    pub product_id: String,
    pub quantity: i64,
}

/// Checkout input. `user_id` is the authenticated cashier, filled in by the
/// handler rather than the request body.
#[derive(Debug, Clone)]
pub struct NewSale {
    pub user_id: String,
    pub items: Vec<NewSaleItem>,
    pub discount_id: Option<String>,
    pub payment_method: PaymentMethod,
    pub cash_received: Money,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
}

/// Sale row with the cashier's name joined in.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SaleWithCashier {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub sale: Sale,
    pub cashier_name: Option<String>,
}

/// Sale item with product details for receipts and emails.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SaleItemDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub item: SaleItem,
    pub product_name: Option<String>,
    pub barcode: Option<String>,
    pub unit: Option<String>,
}

/// Aggregates for the sales stats endpoint.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SalesStats {
    pub total_sales: i64,
    pub total_revenue: i64,
    pub avg_sale_amount: f64,
    pub total_discounts: i64,
    pub active_cashiers: i64,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Runs the full checkout workflow in one transaction.
    ///
    /// ## Guarantee
    /// Either the sale header, every line item, every stock decrement, and
    /// every ledger entry are durably committed together, or none of them
    /// are. The first failed precondition rolls everything back.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - a product id is unknown or inactive, or the
    ///   discount id is unknown
    /// * `DbError::Domain(InsufficientStock)` - a line exceeds on-hand stock
    /// * `DbError::Domain(DiscountUnavailable)` - discount expired/inactive
    pub async fn create_sale(&self, new: NewSale) -> DbResult<(Sale, Vec<SaleItem>)> {
        validate_item_count(new.items.len()).map_err(CoreError::from)?;

        let mut tx = self.pool.begin().await?;

        // Pass 1: resolve and price every line before any write.
        let mut subtotal = Money::zero();
        let mut priced: Vec<(NewSaleItem, Product)> = Vec::with_capacity(new.items.len());

        for item in &new.items {
            if item.quantity <= 0 {
                return Err(CoreError::from(ValidationError::MustBePositive {
                    field: "quantity".to_string(),
                })
                .into());
            }

            let product = sqlx::query_as::<_, Product>(
                "SELECT * FROM products WHERE product_id = ?1 AND is_active = 1",
            )
            .bind(&item.product_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Product", &item.product_id))?;

            if !product.can_fulfill(item.quantity) {
                return Err(CoreError::InsufficientStock {
                    product: product.product_name,
                    available: product.current_stock,
                    requested: item.quantity,
                }
                .into());
            }

            subtotal += product.sale_price.multiply_quantity(item.quantity);
            priced.push((item.clone(), product));
        }

        // Discount: must be active and inside its window today, else fail
        // loudly (never silently ignored).
        let discount_amount = match &new.discount_id {
            Some(discount_id) => {
                let discount = sqlx::query_as::<_, Discount>(
                    "SELECT * FROM discounts WHERE discount_id = ?1",
                )
                .bind(discount_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| DbError::not_found("Discount", discount_id))?;

                resolve_reduction(&discount, subtotal, Utc::now().date_naive())
                    .map_err(DbError::from)?
            }
            None => Money::zero(),
        };

        let total_amount = subtotal - discount_amount;
        let change_amount = new.cash_received - total_amount;
        let now = Utc::now();

        let sale = Sale {
            sale_id: Uuid::new_v4().to_string(),
            invoice_number: generate_invoice_number(),
            user_id: new.user_id.clone(),
            customer_name: new.customer_name,
            customer_phone: new.customer_phone,
            customer_email: new.customer_email,
            subtotal,
            discount_amount,
            total_amount,
            cash_received: new.cash_received,
            change_amount,
            payment_method: new.payment_method,
            created_at: now,
        };

        debug!(id = %sale.sale_id, invoice = %sale.invoice_number, "Inserting sale header");

        sqlx::query(
            r#"
            INSERT INTO sales (
                sale_id, invoice_number, user_id,
                customer_name, customer_phone, customer_email,
                subtotal, discount_amount, total_amount,
                cash_received, change_amount, payment_method, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&sale.sale_id)
        .bind(&sale.invoice_number)
        .bind(&sale.user_id)
        .bind(&sale.customer_name)
        .bind(&sale.customer_phone)
        .bind(&sale.customer_email)
        .bind(sale.subtotal)
        .bind(sale.discount_amount)
        .bind(sale.total_amount)
        .bind(sale.cash_received)
        .bind(sale.change_amount)
        .bind(sale.payment_method)
        .bind(sale.created_at)
        .execute(&mut *tx)
        .await?;

        let mut sale_items = Vec::with_capacity(priced.len());

        for (item, product) in priced {
            // Re-read stock right before the decrement so the ledger
            // snapshot matches the committed value, even when the same
            // product appears on two lines.
            let previous_stock: i64 =
                sqlx::query_scalar("SELECT current_stock FROM products WHERE product_id = ?1")
                    .bind(&item.product_id)
                    .fetch_one(&mut *tx)
                    .await?;

            if previous_stock < item.quantity {
                return Err(CoreError::InsufficientStock {
                    product: product.product_name,
                    available: previous_stock,
                    requested: item.quantity,
                }
                .into());
            }
            let new_stock = previous_stock - item.quantity;

            let sale_item = SaleItem {
                sale_item_id: Uuid::new_v4().to_string(),
                sale_id: sale.sale_id.clone(),
                product_id: item.product_id.clone(),
                quantity: item.quantity,
                unit_price: product.sale_price,
                total_price: product.sale_price.multiply_quantity(item.quantity),
                created_at: now,
            };

            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    sale_item_id, sale_id, product_id,
                    quantity, unit_price, total_price, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&sale_item.sale_item_id)
            .bind(&sale_item.sale_id)
            .bind(&sale_item.product_id)
            .bind(sale_item.quantity)
            .bind(sale_item.unit_price)
            .bind(sale_item.total_price)
            .bind(sale_item.created_at)
            .execute(&mut *tx)
            .await?;

            let updated = sqlx::query(
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

            if updated.rows_affected() == 0 {
                return Err(CoreError::InsufficientStock {
                    product: product.product_name.clone(),
                    available: previous_stock,
                    requested: item.quantity,
                }
                .into());
            }

            sqlx::query(
                r#"
                INSERT INTO inventory_logs (
                    log_id, product_id, user_id, transaction_type,
                    quantity_change, previous_stock, new_stock,
                    reference_id, reference_type, notes, created_at
                ) VALUES (?1, ?2, ?3, 'out', ?4, ?5, ?6, ?7, 'sale', ?8, ?9)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&item.product_id)
            .bind(&new.user_id)
            .bind(-item.quantity)
            .bind(previous_stock)
            .bind(new_stock)
            .bind(&sale.sale_id)
            .bind("Checkout")
            .bind(now)
            .execute(&mut *tx)
            .await?;

            sale_items.push(sale_item);
        }

        tx.commit().await?;

        info!(
            sale_id = %sale.sale_id,
            invoice = %sale.invoice_number,
            total = %sale.total_amount,
            items = sale_items.len(),
            "Sale committed"
        );

        Ok((sale, sale_items))
    }

    /// Lists recent sales with cashier names, newest first.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<SaleWithCashier>> {
        let sales = sqlx::query_as::<_, SaleWithCashier>(
            r#"
            SELECT s.*, u.full_name AS cashier_name
            FROM sales s
            LEFT JOIN users u ON s.user_id = u.user_id
            ORDER BY s.created_at DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Gets a sale by ID with the cashier's name.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<SaleWithCashier>> {
        let sale = sqlx::query_as::<_, SaleWithCashier>(
            r#"
            SELECT s.*, u.full_name AS cashier_name
            FROM sales s
            LEFT JOIN users u ON s.user_id = u.user_id
            WHERE s.sale_id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets all items for a sale, with product details joined in.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItemDetail>> {
        let items = sqlx::query_as::<_, SaleItemDetail>(
            r#"
            SELECT si.*, p.product_name, p.barcode, p.unit
            FROM sale_items si
            LEFT JOIN products p ON si.product_id = p.product_id
            WHERE si.sale_id = ?1
            ORDER BY si.created_at
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Sales aggregates, optionally filtered to a date range (inclusive).
    pub async fn stats(
        &self,
        start_date: Option<chrono::NaiveDate>,
        end_date: Option<chrono::NaiveDate>,
    ) -> DbResult<SalesStats> {
        let stats = sqlx::query_as::<_, SalesStats>(
            r#"
            SELECT
                COUNT(*) AS total_sales,
                COALESCE(SUM(total_amount), 0) AS total_revenue,
                COALESCE(AVG(total_amount), 0.0) AS avg_sale_amount,
                COALESCE(SUM(discount_amount), 0) AS total_discounts,
                COUNT(DISTINCT user_id) AS active_cashiers
            FROM sales
            WHERE (?1 IS NULL OR DATE(created_at) BETWEEN ?1 AND ?2)
            "#,
        )
        .bind(start_date)
        .bind(end_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }
}

/// Generates an invoice number: `INV-YYYY-NNNNNNNN`.
///
/// Human-readable, unique enough for a single store; the UNIQUE constraint
/// on the column is the final guard.
fn generate_invoice_number() -> String {
    let now = Utc::now();
    let seq = (now.timestamp_micros() % 100_000_000).abs();
    format!("INV-{}-{:08}", now.format("%Y"), seq)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testutil::{seed_product, seed_user, stock_of, test_db};
    use chrono::Duration;
    use minimart_core::{DiscountType, Role};

    fn checkout(user_id: &str, items: Vec<NewSaleItem>, discount_id: Option<String>) -> NewSale {
        NewSale {
            user_id: user_id.to_string(),
            items,
            discount_id,
            payment_method: PaymentMethod::Cash,
            cash_received: Money::new(200_000),
            customer_name: None,
            customer_phone: None,
            customer_email: None,
        }
    }

    fn line(product_id: &str, quantity: i64) -> NewSaleItem {
        NewSaleItem {
            product_id: product_id.to_string(),
            quantity,
        }
    }

    async fn ledger_entries(db: &crate::Database, product_id: &str) -> Vec<(String, i64, i64, i64)> {
        sqlx::query_as::<_, (String, i64, i64, i64)>(
            "SELECT transaction_type, quantity_change, previous_stock, new_stock
             FROM inventory_logs WHERE product_id = ?1 ORDER BY created_at",
        )
        .bind(product_id)
        .fetch_all(db.pool())
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_checkout_decrements_stock_and_appends_ledger() {
        let db = test_db().await;
        let cashier = seed_user(&db, Role::Cashier).await;
        let product = seed_product(&db, "Noodles", 10_000, 10).await;

        let (sale, items) = db
            .sales()
            .create_sale(checkout(&cashier, vec![line(&product, 4)], None))
            .await
            .unwrap();

        assert_eq!(sale.subtotal, Money::new(40_000));
        assert_eq!(sale.total_amount, Money::new(40_000));
        assert_eq!(sale.change_amount, Money::new(160_000));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].unit_price, Money::new(10_000));

        assert_eq!(stock_of(&db, &product).await, 6);

        let ledger = ledger_entries(&db, &product).await;
        assert_eq!(ledger.len(), 1);
        let (tx_type, change, prev, new) = &ledger[0];
        assert_eq!(tx_type, "out");
        assert_eq!(*change, -4);
        assert_eq!(*prev, 10);
        assert_eq!(*new, 6);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back_everything() {
        let db = test_db().await;
        let cashier = seed_user(&db, Role::Cashier).await;
        let plenty = seed_product(&db, "Water", 5_000, 100).await;
        let scarce = seed_product(&db, "Caviar", 90_000, 2).await;

        let err = db
            .sales()
            .create_sale(checkout(
                &cashier,
                vec![line(&plenty, 10), line(&scarce, 3)],
                None,
            ))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 2, requested: 3, .. })
        ));

        // Atomicity: nothing persisted, stock untouched
        assert_eq!(stock_of(&db, &plenty).await, 100);
        assert_eq!(stock_of(&db, &scarce).await, 2);

        let sales: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(db.pool())
            .await
            .unwrap();
        let sale_items: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sale_items")
            .fetch_one(db.pool())
            .await
            .unwrap();
        let logs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory_logs")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!((sales, sale_items, logs), (0, 0, 0));
    }

    #[tokio::test]
    async fn test_failed_checkout_is_idempotent() {
        let db = test_db().await;
        let cashier = seed_user(&db, Role::Cashier).await;
        let product = seed_product(&db, "Soda", 8_000, 3).await;

        for _ in 0..2 {
            let err = db
                .sales()
                .create_sale(checkout(&cashier, vec![line(&product, 5)], None))
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                DbError::Domain(CoreError::InsufficientStock { .. })
            ));
            assert_eq!(stock_of(&db, &product).await, 3);
        }
    }

    #[tokio::test]
    async fn test_same_product_on_two_lines_keeps_ledger_chained() {
        let db = test_db().await;
        let cashier = seed_user(&db, Role::Cashier).await;
        let product = seed_product(&db, "Eggs", 3_000, 10).await;

        db.sales()
            .create_sale(checkout(&cashier, vec![line(&product, 4), line(&product, 2)], None))
            .await
            .unwrap();

        assert_eq!(stock_of(&db, &product).await, 4);

        let ledger = ledger_entries(&db, &product).await;
        assert_eq!(ledger.len(), 2);
        assert_eq!((ledger[0].2, ledger[0].3), (10, 6));
        assert_eq!((ledger[1].2, ledger[1].3), (6, 4));
    }

    #[tokio::test]
    async fn test_percentage_discount_applied_at_checkout() {
        let db = test_db().await;
        let cashier = seed_user(&db, Role::Cashier).await;
        let product = seed_product(&db, "Rice 5kg", 100_000, 10).await;

        let today = Utc::now().date_naive();
        let discount = db
            .discounts()
            .insert(crate::repository::discount::NewDiscount {
                discount_name: "Ten Percent".to_string(),
                discount_type: DiscountType::Percentage,
                discount_value: 10,
                start_date: today - Duration::days(1),
                end_date: today + Duration::days(1),
                is_active: true,
            })
            .await
            .unwrap();

        let (sale, _) = db
            .sales()
            .create_sale(checkout(
                &cashier,
                vec![line(&product, 1)],
                Some(discount.discount_id),
            ))
            .await
            .unwrap();

        assert_eq!(sale.subtotal, Money::new(100_000));
        assert_eq!(sale.discount_amount, Money::new(10_000));
        assert_eq!(sale.total_amount, Money::new(90_000));
    }

    #[tokio::test]
    async fn test_expired_discount_fails_checkout() {
        let db = test_db().await;
        let cashier = seed_user(&db, Role::Cashier).await;
        let product = seed_product(&db, "Rice 5kg", 100_000, 10).await;

        let today = Utc::now().date_naive();
        let discount = db
            .discounts()
            .insert(crate::repository::discount::NewDiscount {
                discount_name: "Last Year".to_string(),
                discount_type: DiscountType::Amount,
                discount_value: 5_000,
                start_date: today - Duration::days(30),
                end_date: today - Duration::days(10),
                is_active: true,
            })
            .await
            .unwrap();

        let err = db
            .sales()
            .create_sale(checkout(
                &cashier,
                vec![line(&product, 1)],
                Some(discount.discount_id),
            ))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::DiscountUnavailable { .. })
        ));
        assert_eq!(stock_of(&db, &product).await, 10);
    }

    #[tokio::test]
    async fn test_unknown_product_fails_with_not_found() {
        let db = test_db().await;
        let cashier = seed_user(&db, Role::Cashier).await;

        let err = db
            .sales()
            .create_sale(checkout(&cashier, vec![line("no-such-id", 1)], None))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_empty_cart_rejected() {
        let db = test_db().await;
        let cashier = seed_user(&db, Role::Cashier).await;

        let err = db
            .sales()
            .create_sale(checkout(&cashier, vec![], None))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_get_by_id_and_items() {
        let db = test_db().await;
        let cashier = seed_user(&db, Role::Cashier).await;
        let product = seed_product(&db, "Milk", 15_000, 5).await;

        let (sale, _) = db
            .sales()
            .create_sale(checkout(&cashier, vec![line(&product, 2)], None))
            .await
            .unwrap();

        let fetched = db.sales().get_by_id(&sale.sale_id).await.unwrap().unwrap();
        assert_eq!(fetched.sale.invoice_number, sale.invoice_number);
        assert_eq!(fetched.cashier_name.as_deref(), Some("Test User"));

        let items = db.sales().get_items(&sale.sale_id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_name.as_deref(), Some("Milk"));
        assert_eq!(items[0].item.total_price, Money::new(30_000));
    }

    #[tokio::test]
    async fn test_stats() {
        let db = test_db().await;
        let cashier = seed_user(&db, Role::Cashier).await;
        let product = seed_product(&db, "Milk", 15_000, 50).await;

        for qty in [1, 2] {
            db.sales()
                .create_sale(checkout(&cashier, vec![line(&product, qty)], None))
                .await
                .unwrap();
        }

        let stats = db.sales().stats(None, None).await.unwrap();
        assert_eq!(stats.total_sales, 2);
        assert_eq!(stats.total_revenue, 45_000);
        assert_eq!(stats.active_cashiers, 1);
    }
}
