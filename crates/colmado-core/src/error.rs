//! # Error Types
//!
//! Domain-specific error types for colmado-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  colmado-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule / state-conflict errors          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  colmado-db errors (separate crate)                                    │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── EngineError      - CoreError ∪ DbError for engine operations      │
//! │                                                                         │
//! │  HTTP API errors (in server app)                                       │
//! │  └── ApiError         - What callers see (code + message + details)    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → ApiError → caller   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Carry structured detail (shortage lists, remaining quantities) so
//!    callers can resolve conflicts without re-parsing prose
//! 3. Errors are enum variants, never String
//! 4. State-conflict errors are raised before any mutation whenever possible

use thiserror::Error;

use crate::types::{SaleStatus, StockShortage};

// =============================================================================
// Core Error
// =============================================================================

/// Business rule and state-conflict errors.
///
/// Every variant maps 1:1 onto a machine-readable API code; the HTTP layer
/// owns that mapping.
#[derive(Debug, Error)]
pub enum CoreError {
    /// One or more referenced products do not exist for the company.
    #[error("Products not found: {product_ids:?}")]
    ProductsNotFound { product_ids: Vec<String> },

    /// Settlement would oversell one or more products.
    ///
    /// Carries the FULL shortage list so the caller can resolve every line
    /// in one round trip instead of one product at a time.
    #[error("Insufficient stock for {} product(s)", .shortages.len())]
    InsufficientStock { shortages: Vec<StockShortage> },

    /// Sale exists but is not in DRAFT, so it cannot be settled.
    #[error("Sale {sale_id} is {status:?}, expected draft")]
    SaleNotDraft { sale_id: String, status: SaleStatus },

    /// Sale is in a status that never affected stock, so nothing is refundable.
    #[error("Sale {sale_id} is {status:?} and cannot be refunded")]
    SaleNotRefundable { sale_id: String, status: SaleStatus },

    /// A refund request names a product that is not part of the sale.
    #[error("Product {product_id} is not part of this sale")]
    InvalidRefundItem { product_id: String },

    /// A refund request exceeds what remains refundable for a product.
    #[error("Refund of {requested} exceeds remaining {remaining} for product {product_id}")]
    RefundQtyExceedsRemaining {
        product_id: String,
        requested: i64,
        remaining: i64,
    },

    /// A fiscal invoice is being settled without a customer RNC.
    #[error("A customer RNC is required to settle a fiscal invoice")]
    RncRequired,

    /// Non-credit settlement paid less than the sale total.
    #[error("Paid amount {paid_cents} is below the sale total {total_cents}")]
    PaidAmountTooLow { total_cents: i64, paid_cents: i64 },

    /// No active, non-exhausted fiscal sequence exists for the doc type.
    #[error("No NCF sequence available for doc type {doc_type}")]
    NcfSequenceUnavailable { doc_type: String },

    /// A manual adjustment would drive stock negative on a product that
    /// does not allow it.
    #[error("Adjustment of {qty_change} would drive product {product_id} below zero (current {current})")]
    StockWouldGoNegative {
        product_id: String,
        current: i64,
        qty_change: i64,
    },

    /// Purchase order is already received or cancelled.
    #[error("Purchase order {purchase_id} is {status} and cannot be received")]
    PurchaseNotReceivable { purchase_id: String, status: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when caller input doesn't meet requirements, before any
/// business logic runs. No side effects have happened when one is raised.
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

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be zero.
    #[error("{field} must not be zero")]
    MustBeNonZero { field: String },

    /// Invalid format (e.g., invalid UUID, invalid RNC).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A collection is empty or too large.
    #[error("{field} must contain between {min} and {max} entries")]
    BadCollectionSize { field: String, min: usize, max: usize },
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
    fn test_error_messages() {
        let err = CoreError::RefundQtyExceedsRemaining {
            product_id: "p1".to_string(),
            requested: 4,
            remaining: 3,
        };
        assert_eq!(
            err.to_string(),
            "Refund of 4 exceeds remaining 3 for product p1"
        );
    }

    #[test]
    fn test_insufficient_stock_carries_all_shortages() {
        let err = CoreError::InsufficientStock {
            shortages: vec![
                StockShortage {
                    product_id: "p1".to_string(),
                    requested: 2,
                    available: 1,
                },
                StockShortage {
                    product_id: "p2".to_string(),
                    requested: 5,
                    available: 0,
                },
            ],
        };
        assert_eq!(err.to_string(), "Insufficient stock for 2 product(s)");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "note".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
