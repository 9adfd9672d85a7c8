//! HTTP routes for the Colmado POS API.

pub mod fiscal;
pub mod inventory;
pub mod purchases;
pub mod reports;
pub mod sales;

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Health check endpoint for liveness probes.
async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "service": "colmado-server",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// Builds the full application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        // Sale lifecycle
        .route("/sales", post(sales::create_sale))
        .route("/sales/:id", get(sales::get_sale))
        .route("/sales/:id/pay", post(sales::pay_sale))
        .route("/sales/:id/cancel", post(sales::cancel_sale))
        .route("/sales/:id/refund", post(sales::refund_sale))
        // Fiscal sequences
        .route("/fiscal/sequences", post(fiscal::create_sequence))
        .route("/fiscal/next-ncf", post(fiscal::next_ncf))
        // Purchasing
        .route("/purchases", post(purchases::create_purchase))
        .route("/purchases/:id/receive", post(purchases::receive_purchase))
        // Inventory
        .route("/inventory/adjust", post(inventory::adjust_stock))
        // Reporting reads (pure queries, no side effects)
        .route("/reports/sales-summary", get(reports::sales_summary))
        .route("/reports/stock-movements", get(reports::stock_movements))
        .route("/reports/low-stock", get(reports::low_stock))
        .route("/credit", get(reports::credit_accounts))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
