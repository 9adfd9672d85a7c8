//! # colmado-core: Pure Business Logic for Colmado POS
//!
//! This crate is the **heart** of Colmado POS. It contains all business logic
//! as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Colmado POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    HTTP API (axum)                              │   │
//! │  │    POST /sales ──► /sales/{id}/pay ──► /sales/{id}/refund      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ colmado-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  totals   │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │ line math │  │   rules   │  │   │
//! │  │   │   Sale    │  │  TaxCalc  │  │ ITBIS 18% │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  colmado-db (Database Layer)                    │   │
//! │  │        SQLite queries, migrations, the transactional engine     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, StockMovement, etc.)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`totals`] - Sale total / line total / settlement arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use colmado_core::Money` instead of
// `use colmado_core::money::Money`

pub use error::{CoreError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// ITBIS (Dominican VAT) rate in basis points: 1800 bps = 18%.
///
/// ## Why a constant?
/// The engine settles under a single fixed rate; per-line or per-category
/// rates are intentionally out of scope. Expressing it in basis points keeps
/// all tax math in integer arithmetic.
pub const ITBIS_RATE_BPS: u32 = 1800;

/// Maximum line items allowed on a single sale.
///
/// ## Business Reason
/// Prevents runaway requests and keeps settlement transactions short-lived.
pub const MAX_SALE_ITEMS: usize = 100;

/// Maximum quantity of a single item on a sale line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Width of the zero-padded numeric part of an NCF (e.g. `B02` + 8 digits).
pub const NCF_NUMBER_WIDTH: usize = 8;

/// Default credit term, in days, when a credit settlement supplies none.
pub const DEFAULT_CREDIT_TERM_DAYS: i64 = 30;
