//! # Category Repository
//!
//! Category CRUD with name uniqueness and a dependents guard: a category
//! cannot be deleted while active products still reference it.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use minimart_core::{Category, CoreError};

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewCategory {
    pub category_name: String,
    pub description: Option<String>,
}

/// Typed partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryPatch {
    pub category_name: Option<String>,
    pub description: Option<String>,
}

/// Category row with its active product count.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CategoryWithCount {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub category: Category,
    pub product_count: i64,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// Lists categories with their active product counts.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<CategoryWithCount>> {
        let categories = sqlx::query_as::<_, CategoryWithCount>(
            r#"
            SELECT c.*, COUNT(p.product_id) AS product_count
            FROM categories c
            LEFT JOIN products p ON c.category_id = p.category_id AND p.is_active = 1
            GROUP BY c.category_id
            ORDER BY c.created_at DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    /// Gets a category by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Category>> {
        let category =
            sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE category_id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(category)
    }

    /// Inserts a new category.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - name already taken
    pub async fn insert(&self, new: NewCategory) -> DbResult<Category> {
        if self.name_in_use(&new.category_name, None).await? {
            return Err(DbError::duplicate("category_name", &new.category_name));
        }

        let now = Utc::now();
        let category = Category {
            category_id: Uuid::new_v4().to_string(),
            category_name: new.category_name,
            description: new.description,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %category.category_id, name = %category.category_name, "Inserting category");

        sqlx::query(
            "INSERT INTO categories (category_id, category_name, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&category.category_id)
        .bind(&category.category_name)
        .bind(&category.description)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(category)
    }

    /// Applies a typed partial update.
    pub async fn update(&self, id: &str, patch: CategoryPatch) -> DbResult<Category> {
        if let Some(ref name) = patch.category_name {
            if self.name_in_use(name, Some(id)).await? {
                return Err(DbError::duplicate("category_name", name));
            }
        }

        let result = sqlx::query(
            r#"
            UPDATE categories SET
                category_name = COALESCE(?2, category_name),
                description   = COALESCE(?3, description),
                updated_at    = ?4
            WHERE category_id = ?1
            "#,
        )
        .bind(id)
        .bind(&patch.category_name)
        .bind(&patch.description)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id))
    }

    /// Hard-deletes a category.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - category doesn't exist
    /// * `DbError::Domain(HasDependents)` - active products still reference it
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let exists = self.get_by_id(id).await?;
        if exists.is_none() {
            return Err(DbError::not_found("Category", id));
        }

        let product_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE category_id = ?1 AND is_active = 1",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        if product_count > 0 {
            return Err(CoreError::HasDependents {
                entity: "Category".to_string(),
                dependents: format!("{product_count} active products"),
            }
            .into());
        }

        sqlx::query("DELETE FROM categories WHERE category_id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn name_in_use(&self, name: &str, exclude: Option<&str>) -> DbResult<bool> {
        let existing: Option<String> = sqlx::query_scalar(
            "SELECT category_id FROM categories WHERE category_name = ?1 AND category_id != COALESCE(?2, '')",
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
    use crate::repository::testutil::test_db;

    #[tokio::test]
    async fn test_insert_and_duplicate_name() {
        let db = test_db().await;
        let repo = db.categories();

        repo.insert(NewCategory {
            category_name: "Beverages".to_string(),
            description: None,
        })
        .await
        .unwrap();

        let err = repo
            .insert(NewCategory {
                category_name: "Beverages".to_string(),
                description: Some("dupe".to_string()),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_delete_blocked_by_active_products() {
        let db = test_db().await;
        let repo = db.categories();

        let category = repo
            .insert(NewCategory {
                category_name: "Snacks".to_string(),
                description: None,
            })
            .await
            .unwrap();

        // Attach an active product
        let product = db
            .products()
            .insert(crate::repository::product::NewProduct {
                product_name: "Chips".to_string(),
                barcode: None,
                category_id: Some(category.category_id.clone()),
                purchase_price: minimart_core::Money::new(1_000),
                sale_price: minimart_core::Money::new(2_000),
                unit: None,
                min_stock: 0,
            })
            .await
            .unwrap();

        let err = repo.delete(&category.category_id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::HasDependents { .. })));

        // Soft-deleting the product unblocks the category
        db.products().soft_delete(&product.product_id).await.unwrap();
        repo.delete(&category.category_id).await.unwrap();
        assert!(repo.get_by_id(&category.category_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_includes_product_count() {
        let db = test_db().await;
        let repo = db.categories();

        repo.insert(NewCategory {
            category_name: "Dairy".to_string(),
            description: None,
        })
        .await
        .unwrap();

        let listed = repo.list(10).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].product_count, 0);
    }
}
