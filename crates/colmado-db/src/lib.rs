//! # colmado-db: Database Layer + POS Engine for Colmado POS
//!
//! This crate provides database access and the transactional POS engine.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Colmado POS Data Flow                              │
//! │                                                                         │
//! │  HTTP handler (POST /sales/{id}/pay)                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   colmado-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌──────────────┐    │   │
//! │  │   │   Database    │   │   PosEngine   │   │ Repositories │    │   │
//! │  │   │   (pool.rs)   │   │  (engine/)    │   │ (repository/)│    │   │
//! │  │   │               │   │               │   │              │    │   │
//! │  │   │ SqlitePool    │◄──│ settlement    │   │ SaleRepo     │    │   │
//! │  │   │ BEGIN         │   │ refund/cancel │   │ ProductRepo  │    │   │
//! │  │   │ IMMEDIATE     │   │ receive/adjust│   │ CreditRepo…  │    │   │
//! │  │   └───────────────┘   └───────────────┘   └──────────────┘    │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (WAL mode)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and write-transaction helper
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and engine error types
//! - [`repository`] - Read-side repositories (product, sale, credit, ...)
//! - [`engine`] - The POS engine: every state-changing operation as one
//!   `BEGIN IMMEDIATE` transaction
//!
//! ## Usage
//!
//! ```rust,ignore
//! use colmado_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./colmado.db")).await?;
//! let engine = db.engine();
//!
//! let sale = engine.create_sale(&ctx, request).await?;
//! let settled = engine.pay_sale(&ctx, &sale.sale.id, pay_request).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod engine;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use engine::PosEngine;
pub use error::{DbError, EngineError};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::credit::CreditRepository;
pub use repository::fiscal::FiscalRepository;
pub use repository::product::ProductRepository;
pub use repository::purchase::PurchaseRepository;
pub use repository::sale::SaleRepository;
pub use repository::stock::StockMovementRepository;
