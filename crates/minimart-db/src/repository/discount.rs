//! # Discount Repository
//!
//! Discount CRUD and resolution. The arithmetic itself lives in
//! `minimart_core::discount`; this module owns the rows.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use minimart_core::{CoreError, Discount, DiscountType, ValidationError};

/// Repository for discount database operations.
#[derive(Debug, Clone)]
pub struct DiscountRepository {
    pool: SqlitePool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewDiscount {
    pub discount_name: String,
    pub discount_type: DiscountType,
    pub discount_value: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Typed partial update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DiscountPatch {
    pub discount_name: Option<String>,
    pub discount_type: Option<DiscountType>,
    pub discount_value: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

/// Discount with its window position relative to today.
#[derive(Debug, Clone, Serialize)]
pub struct DiscountWithStatus {
    #[serde(flatten)]
    pub discount: Discount,
    /// "active", "expired", or "upcoming" (date window only).
    pub status_text: &'static str,
}

impl DiscountWithStatus {
    fn from_discount(discount: Discount, today: NaiveDate) -> Self {
        let status_text = if discount.end_date < today {
            "expired"
        } else if discount.start_date > today {
            "upcoming"
        } else {
            "active"
        };
        DiscountWithStatus {
            discount,
            status_text,
        }
    }
}

impl DiscountRepository {
    /// Creates a new DiscountRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DiscountRepository { pool }
    }

    /// Lists discounts, newest first, with window status annotated.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<DiscountWithStatus>> {
        let discounts = sqlx::query_as::<_, Discount>(
            "SELECT * FROM discounts ORDER BY created_at DESC LIMIT ?1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let today = Utc::now().date_naive();
        Ok(discounts
            .into_iter()
            .map(|d| DiscountWithStatus::from_discount(d, today))
            .collect())
    }

    /// Gets a discount by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Discount>> {
        let discount =
            sqlx::query_as::<_, Discount>("SELECT * FROM discounts WHERE discount_id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(discount)
    }

    /// Lists discounts usable today (active flag AND window).
    pub async fn list_active(&self) -> DbResult<Vec<Discount>> {
        let today = Utc::now().date_naive();
        let discounts = sqlx::query_as::<_, Discount>(
            r#"
            SELECT * FROM discounts
            WHERE is_active = 1 AND start_date <= ?1 AND end_date >= ?1
            ORDER BY created_at DESC
            "#,
        )
        .bind(today)
        .fetch_all(&self.pool)
        .await?;

        Ok(discounts)
    }

    /// Inserts a new discount.
    ///
    /// ## Errors
    /// * `DbError::Domain(Validation)` - end date before start date
    /// * `DbError::UniqueViolation` - name already taken
    pub async fn insert(&self, new: NewDiscount) -> DbResult<Discount> {
        validate_window(new.start_date, new.end_date)?;

        if self.name_in_use(&new.discount_name, None).await? {
            return Err(DbError::duplicate("discount_name", &new.discount_name));
        }

        let now = Utc::now();
        let discount = Discount {
            discount_id: Uuid::new_v4().to_string(),
            discount_name: new.discount_name,
            discount_type: new.discount_type,
            discount_value: new.discount_value,
            start_date: new.start_date,
            end_date: new.end_date,
            is_active: new.is_active,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %discount.discount_id, name = %discount.discount_name, "Inserting discount");

        sqlx::query(
            r#"
            INSERT INTO discounts (
                discount_id, discount_name, discount_type, discount_value,
                start_date, end_date, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&discount.discount_id)
        .bind(&discount.discount_name)
        .bind(discount.discount_type)
        .bind(discount.discount_value)
        .bind(discount.start_date)
        .bind(discount.end_date)
        .bind(discount.is_active)
        .bind(discount.created_at)
        .bind(discount.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(discount)
    }

    /// Applies a typed partial update. The merged window is re-validated.
    pub async fn update(&self, id: &str, patch: DiscountPatch) -> DbResult<Discount> {
        let current = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Discount", id))?;

        let start = patch.start_date.unwrap_or(current.start_date);
        let end = patch.end_date.unwrap_or(current.end_date);
        validate_window(start, end)?;

        if let Some(ref name) = patch.discount_name {
            if self.name_in_use(name, Some(id)).await? {
                return Err(DbError::duplicate("discount_name", name));
            }
        }

        sqlx::query(
            r#"
            UPDATE discounts SET
                discount_name  = COALESCE(?2, discount_name),
                discount_type  = COALESCE(?3, discount_type),
                discount_value = COALESCE(?4, discount_value),
                start_date     = ?5,
                end_date       = ?6,
                is_active      = COALESCE(?7, is_active),
                updated_at     = ?8
            WHERE discount_id = ?1
            "#,
        )
        .bind(id)
        .bind(&patch.discount_name)
        .bind(patch.discount_type)
        .bind(patch.discount_value)
        .bind(start)
        .bind(end)
        .bind(patch.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Discount", id))
    }

    /// Hard-deletes a discount. Past sales keep their recorded amounts.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM discounts WHERE discount_id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Discount", id));
        }

        Ok(())
    }

    async fn name_in_use(&self, name: &str, exclude: Option<&str>) -> DbResult<bool> {
        let existing: Option<String> = sqlx::query_scalar(
            "SELECT discount_id FROM discounts WHERE discount_name = ?1 AND discount_id != COALESCE(?2, '')",
        )
        .bind(name)
        .bind(exclude)
        .fetch_optional(&self.pool)
        .await?;

        Ok(existing.is_some())
    }
}

fn validate_window(start: NaiveDate, end: NaiveDate) -> DbResult<()> {
    if end < start {
        return Err(CoreError::from(ValidationError::InvalidFormat {
            field: "end_date".to_string(),
            reason: "must not be before start_date".to_string(),
        })
        .into());
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
