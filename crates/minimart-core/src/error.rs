//! # Error Types
//!
//! Domain-specific error types for minimart-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  minimart-core errors (this file)                                   │
//! │  ├── CoreError        - Business rule violations                    │
//! │  └── ValidationError  - Input validation failures                   │
//! │                                                                     │
//! │  minimart-db errors (separate crate)                                │
//! │  └── DbError          - Database operation failures                 │
//! │                                                                     │
//! │  HTTP API errors (in apps/server)                                   │
//! │  └── ApiError         - What the client sees (status + JSON)        │
//! │                                                                     │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (product name, available stock)
//! 3. Errors are enum variants, never String

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule violations raised by the stock and discount workflows.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A checkout or adjustment would drive stock below zero.
    ///
    /// Raised before any write happens, naming the product and how much is
    /// actually on hand so the cashier can correct the quantity.
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// A discount was referenced that is inactive, expired, or not yet
    /// started. Never silently ignored; checkout must fail loudly.
    #[error("Discount '{name}' is not available")]
    DiscountUnavailable { name: String },

    /// An operation was attempted against an entity in the wrong state,
    /// e.g. deleting a completed purchase order.
    #[error("{entity} is {status}, cannot {operation}")]
    InvalidState {
        entity: String,
        status: String,
        operation: String,
    },

    /// Deleting an entity that other rows still reference,
    /// e.g. a category with active products.
    #[error("{entity} still has {dependents}, cannot delete")]
    HasDependents {
        entity: String,
        dependents: String,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors, raised before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. malformed barcode, bad date order).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in the allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message() {
        let err = CoreError::InsufficientStock {
            product: "Instant Noodles".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Instant Noodles: available 3, requested 5"
        );
    }

    #[test]
    fn test_invalid_state_message() {
        let err = CoreError::InvalidState {
            entity: "Purchase order".to_string(),
            status: "completed".to_string(),
            operation: "delete".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Purchase order is completed, cannot delete"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "product_name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
