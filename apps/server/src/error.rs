//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validation errors      → 400, caller-fixable, nothing mutated          │
//! │  state-conflict errors  → 409 (or 400), retryable after the caller     │
//! │                           changes its request                           │
//! │  not-found errors       → 404, entity absent for the company           │
//! │  everything else        → 500, generic message; detail only in logs    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every response body carries a machine-readable `code` plus structured
//! `details` (shortage lists, remaining quantities) so a client can resolve
//! the conflict without re-parsing prose.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use colmado_core::CoreError;
use colmado_db::{DbError, EngineError};

/// API error returned from HTTP handlers.
///
/// ## Serialization
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Insufficient stock for 1 product(s)",
///   "details": { "shortages": [{ "product_id": "…", "requested": 2, "available": 1 }] }
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// Structured detail payload, where the code has one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// One or more referenced products do not exist (400)
    ProductsNotFound,

    /// Settlement would oversell (409)
    InsufficientStock,

    /// Sale is not in DRAFT (409)
    SaleNotDraft,

    /// Sale never affected stock (409)
    SaleNotRefundable,

    /// Refund names a product outside the sale (400)
    InvalidRefundItem,

    /// Refund exceeds what remains (409)
    RefundQtyExceedsRemaining,

    /// Fiscal invoice without a customer RNC (400)
    RncRequired,

    /// Non-credit payment below the total (400)
    PaidAmountTooLow,

    /// No active, non-exhausted fiscal sequence (400)
    NcfSequenceUnavailable,

    /// Adjustment would drive a strict product negative (409)
    StockWouldGoNegative,

    /// Purchase order already received or cancelled (409)
    PurchaseNotReceivable,

    /// Input validation failed (400)
    ValidationError,

    /// Resource not found (404)
    NotFound,

    /// Missing/invalid identity headers (401)
    Unauthorized,

    /// Duplicate resource (409)
    Conflict,

    /// Internal server error (500)
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Attaches a structured detail payload.
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates an unauthorized error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    /// HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self.code {
            ErrorCode::ProductsNotFound
            | ErrorCode::InvalidRefundItem
            | ErrorCode::RncRequired
            | ErrorCode::PaidAmountTooLow
            | ErrorCode::NcfSequenceUnavailable
            | ErrorCode::ValidationError => StatusCode::BAD_REQUEST,

            ErrorCode::InsufficientStock
            | ErrorCode::SaleNotDraft
            | ErrorCode::SaleNotRefundable
            | ErrorCode::RefundQtyExceedsRemaining
            | ErrorCode::StockWouldGoNegative
            | ErrorCode::PurchaseNotReceivable
            | ErrorCode::Conflict => StatusCode::CONFLICT,

            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

/// Converts business rule errors to API errors, attaching the structured
/// detail each code promises.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::ProductsNotFound { product_ids } => {
                ApiError::new(ErrorCode::ProductsNotFound, message)
                    .with_details(json!({ "product_ids": product_ids }))
            }
            CoreError::InsufficientStock { shortages } => {
                ApiError::new(ErrorCode::InsufficientStock, message)
                    .with_details(json!({ "shortages": shortages }))
            }
            CoreError::SaleNotDraft { sale_id, status } => {
                ApiError::new(ErrorCode::SaleNotDraft, message)
                    .with_details(json!({ "sale_id": sale_id, "status": status }))
            }
            CoreError::SaleNotRefundable { sale_id, status } => {
                ApiError::new(ErrorCode::SaleNotRefundable, message)
                    .with_details(json!({ "sale_id": sale_id, "status": status }))
            }
            CoreError::InvalidRefundItem { product_id } => {
                ApiError::new(ErrorCode::InvalidRefundItem, message)
                    .with_details(json!({ "product_id": product_id }))
            }
            CoreError::RefundQtyExceedsRemaining {
                product_id,
                requested,
                remaining,
            } => ApiError::new(ErrorCode::RefundQtyExceedsRemaining, message).with_details(json!({
                "product_id": product_id,
                "requested": requested,
                "remaining": remaining,
            })),
            CoreError::RncRequired => ApiError::new(ErrorCode::RncRequired, message),
            CoreError::PaidAmountTooLow {
                total_cents,
                paid_cents,
            } => ApiError::new(ErrorCode::PaidAmountTooLow, message).with_details(json!({
                "total_cents": total_cents,
                "paid_cents": paid_cents,
            })),
            CoreError::NcfSequenceUnavailable { doc_type } => {
                ApiError::new(ErrorCode::NcfSequenceUnavailable, message)
                    .with_details(json!({ "doc_type": doc_type }))
            }
            CoreError::StockWouldGoNegative {
                product_id,
                current,
                qty_change,
            } => ApiError::new(ErrorCode::StockWouldGoNegative, message).with_details(json!({
                "product_id": product_id,
                "current": current,
                "qty_change": qty_change,
            })),
            CoreError::PurchaseNotReceivable { purchase_id, status } => {
                ApiError::new(ErrorCode::PurchaseNotReceivable, message)
                    .with_details(json!({ "purchase_id": purchase_id, "status": status }))
            }
            CoreError::Validation(e) => ApiError::new(ErrorCode::ValidationError, e.to_string()),
        }
    }
}

/// Converts database errors to API errors.
///
/// Internal detail is logged, never echoed to the caller.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            other => {
                tracing::error!("Database error: {}", other);
                ApiError::new(ErrorCode::Internal, "Internal server error")
            }
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Core(e) => e.into(),
            EngineError::Db(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use colmado_core::{SaleStatus, StockShortage};

    #[test]
    fn test_status_mapping() {
        let err: ApiError = CoreError::InsufficientStock {
            shortages: vec![StockShortage {
                product_id: "p1".into(),
                requested: 2,
                available: 1,
            }],
        }
        .into();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err: ApiError = CoreError::RncRequired.into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: ApiError = CoreError::SaleNotDraft {
            sale_id: "s1".into(),
            status: SaleStatus::Paid,
        }
        .into();
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_code_serializes_screaming_snake() {
        let code = serde_json::to_string(&ErrorCode::RefundQtyExceedsRemaining).unwrap();
        assert_eq!(code, "\"REFUND_QTY_EXCEEDS_REMAINING\"");
    }

    #[test]
    fn test_db_internal_errors_hide_detail() {
        let err: ApiError = DbError::QueryFailed("secret table name".to_string()).into();
        assert_eq!(err.code, ErrorCode::Internal);
        assert!(!err.message.contains("secret"));
    }
}
