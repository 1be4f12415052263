//! # Roles & Capabilities
//!
//! Authorization model: a closed role enumeration checked against the
//! capability an operation requires, instead of string comparisons
//! scattered across routes.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Capability            admin   staff   cashier                      │
//! │  ─────────────────────────────────────────────                      │
//! │  ManageUsers             ✓                                          │
//! │  ManageCategories        ✓                                          │
//! │  ManageDiscounts         ✓                                          │
//! │  ManageProducts          ✓       ✓                                  │
//! │  ManageSuppliers         ✓       ✓                                  │
//! │  ManagePurchases         ✓       ✓                                  │
//! │  AdjustInventory         ✓       ✓                                  │
//! │  ViewReports             ✓       ✓                                  │
//! │  CreateSales             ✓               ✓                          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A user's role. Closed set; stored lowercase in the database and in JWT
/// claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
    Cashier,
}

/// An operation class a role may or may not perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ManageUsers,
    ManageCategories,
    ManageDiscounts,
    ManageProducts,
    ManageSuppliers,
    ManagePurchases,
    AdjustInventory,
    ViewReports,
    CreateSales,
}

impl Role {
    /// Whether this role may perform operations requiring `capability`.
    pub fn allows(&self, capability: Capability) -> bool {
        use Capability::*;

        match self {
            Role::Admin => true,
            Role::Staff => matches!(
                capability,
                ManageProducts | ManageSuppliers | ManagePurchases | AdjustInventory | ViewReports
            ),
            Role::Cashier => matches!(capability, CreateSales),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
            Role::Cashier => "cashier",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "staff" => Ok(Role::Staff),
            "cashier" => Ok(Role::Cashier),
            other => Err(format!("unknown role: {other}")),
        }
    }
}
