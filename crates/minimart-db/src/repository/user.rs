//! # User Repository
//!
//! User accounts for cashiers, staff, and admins. Password hashing happens
//! at the API layer; this module only ever sees the finished hash.

use chrono::Utc;
use serde::Deserialize;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use minimart_core::{Role, User};

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

/// Input for creating a user. `password_hash` is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
}

/// Typed partial update; `None` fields are left unchanged. Username and
/// password changes go through dedicated flows, not this patch.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Lists users, newest first.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<User>> {
        let users =
            sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC LIMIT ?1")
                .bind(limit)
                .fetch_all(&self.pool)
                .await?;

        Ok(users)
    }

    /// Gets a user by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Gets a user by username (login lookup; active check is the caller's).
    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Total number of users. Zero means the admin bootstrap should run.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Inserts a new user.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - username taken
    pub async fn insert(&self, new: NewUser) -> DbResult<User> {
        if self.username_taken(&new.username).await? {
            return Err(DbError::duplicate("username", &new.username));
        }

        let now = Utc::now();
        let user = User {
            user_id: Uuid::new_v4().to_string(),
            username: new.username,
            password_hash: new.password_hash,
            full_name: new.full_name,
            email: new.email,
            phone: new.phone,
            role: new.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %user.user_id, username = %user.username, role = %user.role, "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (
                user_id, username, password_hash, full_name,
                email, phone, role, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&user.user_id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(user.role)
        .bind(user.is_active)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(user)
    }

    /// Applies a typed partial update.
    pub async fn update(&self, id: &str, patch: UserPatch) -> DbResult<User> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                full_name  = COALESCE(?2, full_name),
                email      = COALESCE(?3, email),
                phone      = COALESCE(?4, phone),
                role       = COALESCE(?5, role),
                is_active  = COALESCE(?6, is_active),
                updated_at = ?7
            WHERE user_id = ?1
            "#,
        )
        .bind(id)
        .bind(&patch.full_name)
        .bind(&patch.email)
        .bind(&patch.phone)
        .bind(patch.role)
        .bind(patch.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    /// Deactivates a user (soft delete; history keeps referencing them).
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let result =
            sqlx::query("UPDATE users SET is_active = 0, updated_at = ?2 WHERE user_id = ?1")
                .bind(id)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        Ok(())
    }

    async fn username_taken(&self, username: &str) -> DbResult<bool> {
        let existing: Option<String> =
            sqlx::query_scalar("SELECT user_id FROM users WHERE username = ?1")
                .bind(username)
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

    fn new_user(username: &str, role: Role) -> NewUser {
        NewUser {
            username: username.to_string(),
            password_hash: "$argon2id$test$hash".to_string(),
            full_name: "Pat Doe".to_string(),
            email: None,
            phone: None,
            role,
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let db = test_db().await;
        let repo = db.users();

        assert_eq!(repo.count().await.unwrap(), 0);

        let created = repo.insert(new_user("cashier01", Role::Cashier)).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 1);

        let by_name = repo.get_by_username("cashier01").await.unwrap().unwrap();
        assert_eq!(by_name.user_id, created.user_id);
        assert_eq!(by_name.role, Role::Cashier);
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let db = test_db().await;
        let repo = db.users();

        repo.insert(new_user("admin", Role::Admin)).await.unwrap();
        let err = repo.insert(new_user("admin", Role::Staff)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_patch_role_and_deactivate() {
        let db = test_db().await;
        let repo = db.users();

        let created = repo.insert(new_user("worker", Role::Cashier)).await.unwrap();

        let updated = repo
            .update(
                &created.user_id,
                UserPatch {
                    role: Some(Role::Staff),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.role, Role::Staff);
        assert_eq!(updated.username, "worker");

        repo.deactivate(&created.user_id).await.unwrap();
        let fetched = repo.get_by_id(&created.user_id).await.unwrap().unwrap();
        assert!(!fetched.is_active);
    }
}
