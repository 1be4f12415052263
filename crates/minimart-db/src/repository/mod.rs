//! # Repository Module
//!
//! One repository per aggregate, each a thin struct over the shared pool.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  handler ──► db.products().get_by_id(id) ──► SQL ──► SQLite        │
//! │                                                                     │
//! │  Repositories own every SQL statement in the system. The three     │
//! │  stock workflows (sale, purchase, inventory) additionally own      │
//! │  their transaction scope: begin → validate → write → commit, with  │
//! │  rollback-on-drop covering every error path.                       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

pub mod category;
pub mod discount;
pub mod inventory;
pub mod product;
pub mod purchase;
pub mod report;
pub mod sale;
pub mod supplier;
pub mod user;

#[cfg(test)]
pub(crate) mod testutil {
    //! Shared fixtures for repository tests: an in-memory database with a
    //! seeded user and category, plus product helpers.

    use chrono::Utc;
    use uuid::Uuid;

    use crate::pool::{Database, DbConfig};
    use minimart_core::{Money, Role};

    /// Fresh in-memory database with migrations applied.
    pub async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// Inserts a user directly and returns its id.
    pub async fn seed_user(db: &Database, role: Role) -> String {
        let user_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO users (user_id, username, password_hash, full_name, role, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6)",
        )
        .bind(&user_id)
        .bind(format!("user-{}", &user_id[..8]))
        .bind("$argon2id$test$hash")
        .bind("Test User")
        .bind(role)
        .bind(now)
        .execute(db.pool())
        .await
        .unwrap();
        user_id
    }

    /// Inserts an active product with the given stock and returns its id.
    pub async fn seed_product(db: &Database, name: &str, sale_price: i64, stock: i64) -> String {
        let product_id = Uuid::new_v4().to_string();
        let now = Utc::now();
        sqlx::query(
            "INSERT INTO products (product_id, product_name, purchase_price, sale_price, unit,
                                   current_stock, min_stock, is_active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, 'pcs', ?5, 0, 1, ?6, ?6)",
        )
        .bind(&product_id)
        .bind(name)
        .bind(Money::new(sale_price.saturating_sub(1_000).max(0)))
        .bind(Money::new(sale_price))
        .bind(stock)
        .bind(now)
        .execute(db.pool())
        .await
        .unwrap();
        product_id
    }

    /// Current stock for a product.
    pub async fn stock_of(db: &Database, product_id: &str) -> i64 {
        sqlx::query_scalar("SELECT current_stock FROM products WHERE product_id = ?1")
            .bind(product_id)
            .fetch_one(db.pool())
            .await
            .unwrap()
    }
}
