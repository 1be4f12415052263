//! # minimart-core: Pure Business Logic for the Minimart Backend
//!
//! This crate is the heart of the system. It contains all business rules as
//! pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                     Minimart Architecture                           │
//! │                                                                     │
//! │  HTTP handler (apps/server)                                         │
//! │       │  validates input, checks role capability                    │
//! │       ▼                                                             │
//! │  ★ minimart-core (THIS CRATE) ★                                     │
//! │                                                                     │
//! │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌──────┐ ┌────────────┐     │
//! │   │  types  │ │  money  │ │ discount │ │ role │ │ validation │     │
//! │   └─────────┘ └─────────┘ └──────────┘ └──────┘ └────────────┘     │
//! │                                                                     │
//! │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS                │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  minimart-db (SQLite repositories, atomic stock workflows)          │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: same input, same output; the discount engine and
//!    checkout totals never touch a clock or a connection
//! 2. **Integer Money**: all monetary values are minor currency units in an
//!    i64, never floats
//! 3. **Explicit Errors**: typed error enums, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod discount;
pub mod error;
pub mod money;
pub mod role;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use role::{Capability, Role};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed in a single sale.
///
/// Prevents runaway carts and keeps receipt payloads bounded.
pub const MAX_SALE_ITEMS: usize = 100;

/// Maximum quantity of a single line item.
///
/// Catches fat-finger quantities (e.g. 10000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 9999;
