//! # Validation Module
//!
//! Input validation utilities for Colmado POS.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (axum)                                          │
//! │  ├── Type validation (deserialization)                                 │
//! │  └── THIS MODULE: business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Engine preconditions                                         │
//! │  ├── Status checks inside the write transaction                        │
//! │  └── Stock checks under the write lock                                 │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / UNIQUE / FK constraints                                │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::totals::LineInput;
use crate::{MAX_ITEM_QUANTITY, MAX_SALE_ITEMS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a sale-line quantity (positive, bounded).
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "qty".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "qty".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents (non-negative; zero allows free items).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "unit_price_cents".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a discount amount in cents (non-negative).
pub fn validate_discount_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "discount_cents".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Sale Validators
// =============================================================================

/// Validates the line set of a sale request: non-empty, bounded, and every
/// line individually well-formed.
pub fn validate_sale_lines(lines: &[LineInput]) -> ValidationResult<()> {
    if lines.is_empty() || lines.len() > MAX_SALE_ITEMS {
        return Err(ValidationError::BadCollectionSize {
            field: "items".to_string(),
            min: 1,
            max: MAX_SALE_ITEMS,
        });
    }

    for line in lines {
        validate_quantity(line.qty)?;
        validate_price_cents(line.unit_price_cents)?;
        validate_discount_cents(line.discount_cents)?;
    }

    Ok(())
}

/// Validates a manual stock adjustment: a non-zero delta and a mandatory
/// note for the audit trail.
pub fn validate_adjustment(qty_change: i64, note: &str) -> ValidationResult<()> {
    if qty_change == 0 {
        return Err(ValidationError::MustBeNonZero {
            field: "qty_change".to_string(),
        });
    }

    if note.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "note".to_string(),
        });
    }

    if note.len() > 500 {
        return Err(ValidationError::TooLong {
            field: "note".to_string(),
            max: 500,
        });
    }

    Ok(())
}

// =============================================================================
// Fiscal Validators
// =============================================================================

/// Validates a customer RNC or cedula.
///
/// ## Rules
/// - Digits only (separators are the caller's problem)
/// - 9 digits (RNC) or 11 digits (cedula)
pub fn validate_rnc(rnc: &str) -> ValidationResult<()> {
    let rnc = rnc.trim();

    if rnc.is_empty() {
        return Err(ValidationError::Required {
            field: "customer_rnc".to_string(),
        });
    }

    if !rnc.chars().all(|c| c.is_ascii_digit()) || !(rnc.len() == 9 || rnc.len() == 11) {
        return Err(ValidationError::InvalidFormat {
            field: "customer_rnc".to_string(),
            reason: "must be 9 digits (RNC) or 11 digits (cedula)".to_string(),
        });
    }

    Ok(())
}

/// Validates an NCF doc type, e.g. "B01", "B02": one series letter followed
/// by a two-digit type code.
pub fn validate_doc_type(doc_type: &str) -> ValidationResult<()> {
    let bytes = doc_type.as_bytes();
    let ok = bytes.len() == 3
        && bytes[0].is_ascii_uppercase()
        && bytes[1].is_ascii_digit()
        && bytes[2].is_ascii_digit();

    if !ok {
        return Err(ValidationError::InvalidFormat {
            field: "doc_type".to_string(),
            reason: "must be a series letter followed by two digits, e.g. B02".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string format.
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
