//! # Repository Module
//!
//! Read-side database repositories for Colmado POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  Repositories own the plain CRUD and reporting queries:                │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │  db.sales().get_with_items(&company, &id)                      │
//! │       ▼                                                                 │
//! │  SaleRepository ──► SQL ──► SQLite                                     │
//! │                                                                         │
//! │  State-CHANGING operations do not live here: those belong to the       │
//! │  engine, which runs them inside one BEGIN IMMEDIATE transaction.       │
//! │  The only exception is fiscal issuance, which is a single atomic       │
//! │  statement and therefore safe from either entry point.                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Product reads + catalog-side inserts
//! - [`sale::SaleRepository`] - Sale/item reads and sales reporting
//! - [`stock::StockMovementRepository`] - Movement history reads
//! - [`fiscal::FiscalRepository`] - Fiscal sequences and NCF issuance
//! - [`credit::CreditRepository`] - Credit account reads
//! - [`purchase::PurchaseRepository`] - Purchase order reads

pub mod credit;
pub mod fiscal;
pub mod product;
pub mod purchase;
pub mod sale;
pub mod stock;
