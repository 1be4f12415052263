//! # Product Repository
//!
//! Catalog product operations: lookup, create, typed partial update, soft
//! delete, and stats.
//!
//! Stock is intentionally absent from [`ProductPatch`]: `current_stock` is
//! only ever written by the sale, purchase, and adjustment workflows, which
//! pair every write with an inventory ledger entry in the same transaction.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use minimart_core::{Money, Product};

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

/// Input for creating a product. Stock always starts at zero; the first
/// purchase order brings inventory in through the ledger.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub product_name: String,
    pub barcode: Option<String>,
    pub category_id: Option<String>,
    pub purchase_price: Money,
    pub sale_price: Money,
    pub unit: Option<String>,
    #[serde(default)]
    pub min_stock: i64,
}

/// Typed partial update. A `None` field is left unchanged; clearing a
/// nullable column is not a supported operation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    pub product_name: Option<String>,
    pub barcode: Option<String>,
    pub category_id: Option<String>,
    pub purchase_price: Option<Money>,
    pub sale_price: Option<Money>,
    pub unit: Option<String>,
    pub min_stock: Option<i64>,
    pub is_active: Option<bool>,
}

/// Product row with its category name joined in, for list/detail responses.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductWithCategory {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub product: Product,
    pub category_name: Option<String>,
}

/// Catalog aggregates for the stats endpoint.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ProductStats {
    pub total_products: i64,
    pub active_products: i64,
    pub low_stock_products: i64,
    pub out_of_stock_products: i64,
    /// Σ(current_stock × purchase_price), minor units.
    pub inventory_value: i64,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists active products with category names, newest first.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<ProductWithCategory>> {
        let products = sqlx::query_as::<_, ProductWithCategory>(
            r#"
            SELECT p.*, c.category_name
            FROM products p
            LEFT JOIN categories c ON p.category_id = c.category_id
            WHERE p.is_active = 1
            ORDER BY p.created_at DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Gets a product by its ID (active or not).
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE product_id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets a product with its category name joined in.
    pub async fn get_with_category(&self, id: &str) -> DbResult<Option<ProductWithCategory>> {
        let product = sqlx::query_as::<_, ProductWithCategory>(
            r#"
            SELECT p.*, c.category_name
            FROM products p
            LEFT JOIN categories c ON p.category_id = c.category_id
            WHERE p.product_id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets an active product by barcode (POS scanner lookup).
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<ProductWithCategory>> {
        let product = sqlx::query_as::<_, ProductWithCategory>(
            r#"
            SELECT p.*, c.category_name
            FROM products p
            LEFT JOIN categories c ON p.category_id = c.category_id
            WHERE p.barcode = ?1 AND p.is_active = 1
            "#,
        )
        .bind(barcode)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Inserts a new product with zero stock.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - barcode already taken
    pub async fn insert(&self, new: NewProduct) -> DbResult<Product> {
        if let Some(ref barcode) = new.barcode {
            if self.barcode_in_use(barcode, None).await? {
                return Err(DbError::duplicate("barcode", barcode));
            }
        }

        let product = Product {
            product_id: Uuid::new_v4().to_string(),
            product_name: new.product_name,
            barcode: new.barcode,
            category_id: new.category_id,
            purchase_price: new.purchase_price,
            sale_price: new.sale_price,
            unit: new.unit.unwrap_or_else(|| "pcs".to_string()),
            current_stock: 0,
            min_stock: new.min_stock,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        debug!(id = %product.product_id, name = %product.product_name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                product_id, product_name, barcode, category_id,
                purchase_price, sale_price, unit,
                current_stock, min_stock, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&product.product_id)
        .bind(&product.product_name)
        .bind(&product.barcode)
        .bind(&product.category_id)
        .bind(product.purchase_price)
        .bind(product.sale_price)
        .bind(&product.unit)
        .bind(product.current_stock)
        .bind(product.min_stock)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product)
    }

    /// Applies a typed partial update and returns the updated row.
    ///
    /// The patch is translated to one static COALESCE statement; absent
    /// fields keep their current value.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - product doesn't exist
    /// * `DbError::UniqueViolation` - new barcode taken by another product
    pub async fn update(&self, id: &str, patch: ProductPatch) -> DbResult<Product> {
        if let Some(ref barcode) = patch.barcode {
            if self.barcode_in_use(barcode, Some(id)).await? {
                return Err(DbError::duplicate("barcode", barcode));
            }
        }

        debug!(id = %id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                product_name   = COALESCE(?2, product_name),
                barcode        = COALESCE(?3, barcode),
                category_id    = COALESCE(?4, category_id),
                purchase_price = COALESCE(?5, purchase_price),
                sale_price     = COALESCE(?6, sale_price),
                unit           = COALESCE(?7, unit),
                min_stock      = COALESCE(?8, min_stock),
                is_active      = COALESCE(?9, is_active),
                updated_at     = ?10
            WHERE product_id = ?1
            "#,
        )
        .bind(id)
        .bind(&patch.product_name)
        .bind(&patch.barcode)
        .bind(&patch.category_id)
        .bind(patch.purchase_price)
        .bind(patch.sale_price)
        .bind(&patch.unit)
        .bind(patch.min_stock)
        .bind(patch.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Soft-deletes a product (is_active = false).
    ///
    /// Historical sales and ledger entries keep referencing the row.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query(
            "UPDATE products SET is_active = 0, updated_at = ?2 WHERE product_id = ?1",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Catalog-wide aggregates.
    pub async fn stats(&self) -> DbResult<ProductStats> {
        let stats = sqlx::query_as::<_, ProductStats>(
            r#"
            SELECT
                COUNT(*) AS total_products,
                COALESCE(SUM(CASE WHEN is_active = 1 THEN 1 ELSE 0 END), 0) AS active_products,
                COALESCE(SUM(CASE WHEN is_active = 1 AND current_stock <= min_stock THEN 1 ELSE 0 END), 0) AS low_stock_products,
                COALESCE(SUM(CASE WHEN is_active = 1 AND current_stock = 0 THEN 1 ELSE 0 END), 0) AS out_of_stock_products,
                COALESCE(SUM(current_stock * purchase_price), 0) AS inventory_value
            FROM products
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }

    /// Whether `barcode` is already assigned, optionally excluding one
    /// product (self, on update).
    async fn barcode_in_use(&self, barcode: &str, exclude: Option<&str>) -> DbResult<bool> {
        let existing: Option<String> = sqlx::query_scalar(
            "SELECT product_id FROM products WHERE barcode = ?1 AND product_id != COALESCE(?2, '')",
        )
        .bind(barcode)
        .bind(exclude)
        .fetch_optional(&self.pool)
        .await?;

        Ok(existing.is_some())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::testutil::{seed_product, test_db};

    fn new_product(name: &str, barcode: Option<&str>) -> NewProduct {
        NewProduct {
            product_name: name.to_string(),
            barcode: barcode.map(String::from),
            category_id: None,
            purchase_price: Money::new(3_000),
            sale_price: Money::new(5_000),
            unit: None,
            min_stock: 2,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let repo = db.products();

        let created = repo
            .insert(new_product("Bottled Water", Some("893001")))
            .await
            .unwrap();
        assert_eq!(created.current_stock, 0);

        let fetched = repo.get_by_id(&created.product_id).await.unwrap().unwrap();
        assert_eq!(fetched.product_name, "Bottled Water");
        assert_eq!(fetched.sale_price, Money::new(5_000));
    }

    #[tokio::test]
    async fn test_duplicate_barcode_rejected() {
        let db = test_db().await;
        let repo = db.products();

        repo.insert(new_product("First", Some("893001")))
            .await
            .unwrap();
        let err = repo
            .insert(new_product("Second", Some("893001")))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_patch_updates_only_present_fields() {
        let db = test_db().await;
        let repo = db.products();

        let created = repo
            .insert(new_product("Old Name", Some("893001")))
            .await
            .unwrap();

        let updated = repo
            .update(
                &created.product_id,
                ProductPatch {
                    product_name: Some("New Name".to_string()),
                    sale_price: Some(Money::new(6_000)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.product_name, "New Name");
        assert_eq!(updated.sale_price, Money::new(6_000));
        // Untouched fields survive
        assert_eq!(updated.barcode.as_deref(), Some("893001"));
        assert_eq!(updated.purchase_price, Money::new(3_000));
    }

    #[tokio::test]
    async fn test_update_barcode_excludes_self() {
        let db = test_db().await;
        let repo = db.products();

        let created = repo
            .insert(new_product("Water", Some("893001")))
            .await
            .unwrap();

        // Re-submitting its own barcode is not a conflict
        let patch = ProductPatch {
            barcode: Some("893001".to_string()),
            ..Default::default()
        };
        assert!(repo.update(&created.product_id, patch).await.is_ok());
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_list() {
        let db = test_db().await;
        let repo = db.products();

        let id = seed_product(&db, "Soda", 8_000, 5).await;
        assert_eq!(repo.list(10).await.unwrap().len(), 1);

        repo.soft_delete(&id).await.unwrap();
        assert!(repo.list(10).await.unwrap().is_empty());

        // Still reachable by id for history
        assert!(repo.get_by_id(&id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unknown_product_not_found() {
        let db = test_db().await;
        let err = db.products().soft_delete("missing").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
