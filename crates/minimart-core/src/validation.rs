//! # Validation Module
//!
//! Input validation applied at the API boundary, before business logic and
//! before any write. Database constraints (NOT NULL, UNIQUE, CHECK) remain
//! as the last line of defense underneath these checks.

use crate::error::ValidationError;
use crate::{MAX_ITEM_QUANTITY, MAX_SALE_ITEMS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a human-facing name (product, category, supplier, discount).
///
/// ## Example
/// ```rust
/// use minimart_core::validation::validate_name;
///
/// assert!(validate_name("product_name", "Instant Noodles").is_ok());
/// assert!(validate_name("product_name", "   ").is_err());
/// ```
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > 200 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a barcode: digits only, EAN/UPC-ish length.
pub fn validate_barcode(barcode: &str) -> ValidationResult<()> {
    let barcode = barcode.trim();

    if barcode.is_empty() {
        return Err(ValidationError::Required {
            field: "barcode".to_string(),
        });
    }

    if barcode.len() > 32 {
        return Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: 32,
        });
    }

    if !barcode.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must contain only letters and digits".to_string(),
        });
    }

    Ok(())
}

/// Validates a login username.
pub fn validate_username(username: &str) -> ValidationResult<()> {
    let username = username.trim();

    if username.is_empty() {
        return Err(ValidationError::Required {
            field: "username".to_string(),
        });
    }

    if username.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "username".to_string(),
            max: 50,
        });
    }

    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        return Err(ValidationError::InvalidFormat {
            field: "username".to_string(),
            reason: "must contain only letters, digits, underscores, and dots".to_string(),
        });
    }

    Ok(())
}

/// Validates a password meets the minimum length.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.len() < 6 {
        return Err(ValidationError::InvalidFormat {
            field: "password".to_string(),
            reason: "must be at least 6 characters".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line item quantity: positive and within the sanity cap.
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if quantity > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price or monetary input is not negative.
pub fn validate_price(field: &str, amount: i64) -> ValidationResult<()> {
    if amount < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates a sale's item count: at least one, bounded above.
pub fn validate_item_count(count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if count > MAX_SALE_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_SALE_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("product_name", "Instant Noodles").is_ok());
        assert!(validate_name("product_name", "").is_err());
        assert!(validate_name("product_name", "  ").is_err());
        assert!(validate_name("product_name", &"x".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_barcode() {
        assert!(validate_barcode("8934588063051").is_ok());
        assert!(validate_barcode("").is_err());
        assert!(validate_barcode("89345-88063").is_err());
        assert!(validate_barcode(&"9".repeat(33)).is_err());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("cashier_01").is_ok());
        assert!(validate_username("jane.doe").is_ok());
        assert!(validate_username("jane doe").is_err());
        assert!(validate_username("").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-2).is_err());
        assert!(validate_quantity(MAX_ITEM_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_item_count() {
        assert!(validate_item_count(1).is_ok());
        assert!(validate_item_count(0).is_err());
        assert!(validate_item_count(MAX_SALE_ITEMS + 1).is_err());
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price("sale_price", 0).is_ok());
        assert!(validate_price("sale_price", 12_000).is_ok());
        assert!(validate_price("sale_price", -1).is_err());
    }
}
