//! # minimart-db: Database Layer for the Minimart Backend
//!
//! SQLite persistence via sqlx: connection pool, embedded migrations, and
//! one repository per aggregate.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  HTTP handler (apps/server)                                         │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  ┌───────────────────────────────────────────────────────────────┐  │
//! │  │                  minimart-db (THIS CRATE)                     │  │
//! │  │                                                               │  │
//! │  │   ┌────────────┐   ┌────────────────┐   ┌─────────────┐      │  │
//! │  │   │  Database  │   │  Repositories  │   │  Migrations │      │  │
//! │  │   │  (pool.rs) │◄──│ product, sale, │   │  (embedded) │      │  │
//! │  │   │            │   │ purchase, ...  │   │             │      │  │
//! │  │   └────────────┘   └────────────────┘   └─────────────┘      │  │
//! │  └───────────────────────────────────────────────────────────────┘  │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  SQLite (WAL mode, foreign keys ON)                                 │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Transactional workflows
//!
//! The three stock-mutating workflows (checkout via
//! [`repository::sale::SaleRepository::create_sale`], purchase receipt and
//! reversal via [`repository::purchase::PurchaseRepository`], and manual
//! adjustment via [`repository::inventory::InventoryRepository::adjust`])
//! each run inside a single transaction. Stock reads, stock writes, and
//! inventory ledger appends happen together or not at all.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
