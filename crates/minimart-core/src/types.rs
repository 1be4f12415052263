//! # Domain Types
//!
//! Core domain types for the Minimart backend.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                │
//! │                                                                     │
//! │  Catalog:    Product ── Category      Supplier                      │
//! │                                                                     │
//! │  Checkout:   Sale ──┬── SaleItem            Discount                │
//! │                     └── InventoryLogEntry (type = out)              │
//! │                                                                     │
//! │  Receiving:  PurchaseOrder ──┬── PurchaseOrderItem                  │
//! │                              └── InventoryLogEntry (type = in)      │
//! │                                                                     │
//! │  The Inventory Ledger is append-only: every stock mutation writes   │
//! │  exactly one entry in the same transaction that moves the stock.    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Stock-moving documents have:
//! - `id`: UUID v4, immutable, used for database relations
//! - Business number (`invoice_number`, `order_number`), human-readable

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::role::Role;

// =============================================================================
// Product
// =============================================================================

/// A catalog product.
///
/// `current_stock` is owned by the catalog store but is only ever mutated by
/// the sale, purchase, and adjustment workflows, paired with a ledger entry
/// in the same transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub product_id: String,

    /// Display name shown to cashier and on receipt.
    pub product_name: String,

    /// Barcode (EAN-13, UPC-A, ...). Unique when present.
    pub barcode: Option<String>,

    /// Category reference.
    pub category_id: Option<String>,

    /// Cost from supplier, minor currency units.
    pub purchase_price: Money,

    /// Sell price, minor currency units.
    pub sale_price: Money,

    /// Unit label shown on receipts ("pcs", "kg", "box").
    pub unit: String,

    /// On-hand quantity. Never negative after a committed transaction.
    pub current_stock: i64,

    /// Reorder threshold for low-stock alerts.
    pub min_stock: i64,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Checks whether `quantity` can be taken from stock.
    #[inline]
    pub fn can_fulfill(&self, quantity: i64) -> bool {
        self.current_stock >= quantity
    }

    /// True when on-hand stock has fallen to the reorder threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.current_stock <= self.min_stock
    }
}

// =============================================================================
// Category & Supplier
// =============================================================================

/// A product category. Name is unique; delete is hard but blocked while
/// active products still reference the category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Category {
    pub category_id: String,
    pub category_name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A supplier. Name is unique; delete is soft and blocked while purchase
/// orders reference the supplier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Supplier {
    pub supplier_id: String,
    pub supplier_name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// User
// =============================================================================

/// A system user (cashier, staff, or admin).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub user_id: String,
    pub username: String,

    /// Argon2 hash. Never serialized into API responses.
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Discount
// =============================================================================

/// How a discount reduces the payable amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// `value` percent off the base amount.
    Percentage,
    /// `value` minor units off, capped at the base amount.
    Amount,
}

/// A discount with a date validity window.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Discount {
    pub discount_id: String,
    pub discount_name: String,
    pub discount_type: DiscountType,

    /// Percent (for `percentage`) or minor units (for `amount`).
    pub discount_value: i64,

    /// First day the discount is usable (inclusive).
    pub start_date: NaiveDate,

    /// Last day the discount is usable (inclusive).
    pub end_date: NaiveDate,

    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Sale
// =============================================================================

/// Accepted tender types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
}

/// A completed checkout.
///
/// Invariants: `total_amount = subtotal - discount_amount`,
/// `change_amount = cash_received - total_amount`, and the sum of line
/// totals equals `subtotal`. Created atomically with its items and one
/// `out` ledger entry per item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub sale_id: String,
    pub invoice_number: String,

    /// Cashier who rang up the sale.
    pub user_id: String,

    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,

    pub subtotal: Money,
    pub discount_amount: Money,
    pub total_amount: Money,
    pub cash_received: Money,

    /// May be negative; recorded, not rejected.
    pub change_amount: Money,

    pub payment_method: PaymentMethod,
    pub created_at: DateTime<Utc>,
}

/// A sale line item. `unit_price` is the catalog price frozen at sale time;
/// never client-supplied, so price tampering is structurally impossible.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub sale_item_id: String,
    pub sale_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub total_price: Money,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Purchase Order
// =============================================================================

/// Purchase order lifecycle.
///
/// Stock is applied at creation; completing or cancelling only flips this
/// flag. Deletion is allowed from `Pending` only and reverses stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    Pending,
    Completed,
    Cancelled,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "pending",
            PurchaseStatus::Completed => "completed",
            PurchaseStatus::Cancelled => "cancelled",
        }
    }
}

/// An inbound stock receipt from a supplier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseOrder {
    pub purchase_order_id: String,
    pub order_number: String,
    pub supplier_id: String,

    /// Staff member who received the stock.
    pub user_id: String,

    /// Sum of line totals.
    pub total_amount: Money,

    pub status: PurchaseStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PurchaseOrderItem {
    pub purchase_order_item_id: String,
    pub purchase_order_id: String,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub total_price: Money,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Inventory Ledger
// =============================================================================

/// Direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Stock received (purchase). Positive quantity_change.
    In,
    /// Stock sold (checkout). Negative quantity_change.
    Out,
    /// Manual or compensating correction. Either sign.
    Adjustment,
}

/// What kind of document a ledger entry points back to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum ReferenceType {
    Sale,
    Purchase,
    Manual,
}

/// One entry in the append-only inventory ledger.
///
/// Immutable once written; there is no update or delete path anywhere in
/// the codebase. `new_stock == previous_stock + quantity_change` always.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryLogEntry {
    pub log_id: String,
    pub product_id: String,

    /// Actor who caused the movement.
    pub user_id: String,

    pub transaction_type: TransactionType,
    pub quantity_change: i64,
    pub previous_stock: i64,
    pub new_stock: i64,

    /// Originating sale or purchase order id, if any.
    pub reference_id: Option<String>,

    pub reference_type: ReferenceType,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl InventoryLogEntry {
    /// Snapshot consistency: the recorded before/after pair must agree with
    /// the recorded delta.
    #[inline]
    pub fn is_consistent(&self) -> bool {
        self.new_stock == self.previous_stock + self.quantity_change
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_can_fulfill() {
        let product = sample_product(3);
        assert!(product.can_fulfill(3));
        assert!(!product.can_fulfill(4));
    }

    #[test]
    fn test_low_stock() {
        let mut product = sample_product(5);
        product.min_stock = 5;
        assert!(product.is_low_stock());
        product.current_stock = 6;
        assert!(!product.is_low_stock());
    }

    #[test]
    fn test_ledger_consistency() {
        let entry = InventoryLogEntry {
            log_id: "log-1".to_string(),
            product_id: "p-1".to_string(),
            user_id: "u-1".to_string(),
            transaction_type: TransactionType::Out,
            quantity_change: -4,
            previous_stock: 10,
            new_stock: 6,
            reference_id: Some("s-1".to_string()),
            reference_type: ReferenceType::Sale,
            notes: None,
            created_at: Utc::now(),
        };
        assert!(entry.is_consistent());

        let broken = InventoryLogEntry {
            new_stock: 7,
            ..entry
        };
        assert!(!broken.is_consistent());
    }

    #[test]
    fn test_enum_serde_names() {
        assert_eq!(
            serde_json::to_string(&TransactionType::In).unwrap(),
            "\"in\""
        );
        assert_eq!(
            serde_json::to_string(&PurchaseStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentMethod::Cash).unwrap(),
            "\"cash\""
        );
        let parsed: DiscountType = serde_json::from_str("\"percentage\"").unwrap();
        assert_eq!(parsed, DiscountType::Percentage);
    }

    fn sample_product(stock: i64) -> Product {
        Product {
            product_id: "p-1".to_string(),
            product_name: "Bottled Water 500ml".to_string(),
            barcode: Some("8934588063051".to_string()),
            category_id: None,
            purchase_price: Money::new(3_000),
            sale_price: Money::new(5_000),
            unit: "pcs".to_string(),
            current_stock: stock,
            min_stock: 0,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}
