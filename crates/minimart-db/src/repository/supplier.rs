//! # Supplier Repository
//!
//! Supplier CRUD. Name is unique; delete is soft and blocked while any
//! purchase order references the supplier (the order history must keep
//! resolving).

use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use minimart_core::{CoreError, PurchaseOrder, Supplier};

/// Repository for supplier database operations.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSupplier {
    pub supplier_name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// Typed partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SupplierPatch {
    pub supplier_name: Option<String>,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub is_active: Option<bool>,
}

impl SupplierRepository {
    /// Creates a new SupplierRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    /// Lists active suppliers, newest first.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<Supplier>> {
        let suppliers = sqlx::query_as::<_, Supplier>(
            "SELECT * FROM suppliers WHERE is_active = 1 ORDER BY created_at DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(suppliers)
    }

    /// Gets a supplier by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Supplier>> {
        let supplier =
            sqlx::query_as::<_, Supplier>("SELECT * FROM suppliers WHERE supplier_id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(supplier)
    }

    /// Inserts a new supplier.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - name already taken
    pub async fn insert(&self, new: NewSupplier) -> DbResult<Supplier> {
        if self.name_in_use(&new.supplier_name, None).await? {
            return Err(DbError::duplicate("supplier_name", &new.supplier_name));
        }

        let now = Utc::now();
        let supplier = Supplier {
            supplier_id: Uuid::new_v4().to_string(),
            supplier_name: new.supplier_name,
            contact_person: new.contact_person,
            phone: new.phone,
            email: new.email,
            address: new.address,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %supplier.supplier_id, name = %supplier.supplier_name, "Inserting supplier");

        sqlx::query(
            r#"
            INSERT INTO suppliers (
                supplier_id, supplier_name, contact_person, phone, email, address,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&supplier.supplier_id)
        .bind(&supplier.supplier_name)
        .bind(&supplier.contact_person)
        .bind(&supplier.phone)
        .bind(&supplier.email)
        .bind(&supplier.address)
        .bind(supplier.is_active)
        .bind(supplier.created_at)
        .bind(supplier.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(supplier)
    }

    /// Applies a typed partial update.
    pub async fn update(&self, id: &str, patch: SupplierPatch) -> DbResult<Supplier> {
        if let Some(ref name) = patch.supplier_name {
            if self.name_in_use(name, Some(id)).await? {
                return Err(DbError::duplicate("supplier_name", name));
            }
        }

        let result = sqlx::query(
            r#"
            UPDATE suppliers SET
                supplier_name  = COALESCE(?2, supplier_name),
                contact_person = COALESCE(?3, contact_person),
                phone          = COALESCE(?4, phone),
                email          = COALESCE(?5, email),
                address        = COALESCE(?6, address),
                is_active      = COALESCE(?7, is_active),
                updated_at     = ?8
            WHERE supplier_id = ?1
            "#,
        )
        .bind(id)
        .bind(&patch.supplier_name)
        .bind(&patch.contact_person)
        .bind(&patch.phone)
        .bind(&patch.email)
        .bind(&patch.address)
        .bind(patch.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Supplier", id))
    }

    /// Soft-deletes a supplier.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - supplier doesn't exist
    /// * `DbError::Domain(HasDependents)` - purchase orders reference it
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        if self.get_by_id(id).await?.is_none() {
            return Err(DbError::not_found("Supplier", id));
        }

        let order_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM purchase_orders WHERE supplier_id = ?1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        if order_count > 0 {
            return Err(CoreError::HasDependents {
                entity: "Supplier".to_string(),
                dependents: format!("{order_count} purchase orders"),
            }
            .into());
        }

        sqlx::query("UPDATE suppliers SET is_active = 0, updated_at = ?2 WHERE supplier_id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Lists a supplier's purchase orders, newest first.
    pub async fn purchase_orders(&self, id: &str) -> DbResult<Vec<PurchaseOrder>> {
        let orders = sqlx::query_as::<_, PurchaseOrder>(
            "SELECT * FROM purchase_orders WHERE supplier_id = ?1 ORDER BY created_at DESC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    async fn name_in_use(&self, name: &str, exclude: Option<&str>) -> DbResult<bool> {
        let existing: Option<String> = sqlx::query_scalar(
            "SELECT supplier_id FROM suppliers WHERE supplier_name = ?1 AND supplier_id != COALESCE(?2, '')",
        )
        .bind(name)
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
    use crate::repository::testutil::{seed_product, seed_user, test_db};
    use minimart_core::{Money, Role};

    fn new_supplier(name: &str) -> NewSupplier {
        NewSupplier {
            supplier_name: name.to_string(),
            contact_person: None,
            phone: None,
            email: None,
            address: None,
        }
    }

    #[tokio::test]
    async fn test_insert_and_duplicate_name() {
        let db = test_db().await;
        let repo = db.suppliers();

        repo.insert(new_supplier("Fresh Farms")).await.unwrap();
        let err = repo.insert(new_supplier("Fresh Farms")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_delete_blocked_by_purchase_orders() {
        let db = test_db().await;
        let staff = seed_user(&db, Role::Staff).await;
        let supplier = db.suppliers().insert(new_supplier("Fresh Farms")).await.unwrap();
        let product = seed_product(&db, "Apples", 10_000, 0).await;

        db.purchases()
            .create_order(crate::repository::purchase::NewPurchaseOrder {
                supplier_id: supplier.supplier_id.clone(),
                user_id: staff,
                items: vec![crate::repository::purchase::NewPurchaseItem {
                    product_id: product,
                    quantity: 5,
                    unit_price: Money::new(8_000),
                }],
                notes: None,
            })
            .await
            .unwrap();

        let err = db
            .suppliers()
            .soft_delete(&supplier.supplier_id)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::HasDependents { .. })));

        let orders = db
            .suppliers()
            .purchase_orders(&supplier.supplier_id)
            .await
            .unwrap();
        assert_eq!(orders.len(), 1);
    }

    #[tokio::test]
    async fn test_soft_delete_without_orders() {
        let db = test_db().await;
        let supplier = db.suppliers().insert(new_supplier("Quiet Co")).await.unwrap();

        db.suppliers().soft_delete(&supplier.supplier_id).await.unwrap();

        let fetched = db
            .suppliers()
            .get_by_id(&supplier.supplier_id)
            .await
            .unwrap()
            .unwrap();
        assert!(!fetched.is_active);
        assert!(db.suppliers().list(10).await.unwrap().is_empty());
    }
}
