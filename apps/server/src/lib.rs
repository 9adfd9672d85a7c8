//! # colmado-server: HTTP API for Colmado POS
//!
//! A thin axum layer over the POS engine. Handlers deserialize requests,
//! extract the actor context from headers, call one engine operation, and
//! map the result (or the typed error) onto the wire.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /sales/{id}/pay                                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Actor extractor (X-Company-ID / X-User-ID headers)                    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  handler → engine.pay_sale(ctx, id, req)  (one write transaction)      │
//! │       │                                                                 │
//! │       ├── Ok(sale)          → 200 JSON                                 │
//! │       └── Err(EngineError)  → ApiError { code, message, details }      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod routes;

use colmado_db::Database;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        AppState { db }
    }
}
