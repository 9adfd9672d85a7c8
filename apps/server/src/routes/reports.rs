//! Reporting reads: pure queries over the engine's entities, no side effects.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::context::Actor;
use crate::error::ApiError;
use crate::AppState;
use colmado_core::{CreditAccount, CreditStatus, Product, StockMovement};
use colmado_db::repository::sale::SalesSummaryRow;

const DEFAULT_PAGE: i64 = 100;

/// Date-range filter for the sales summary (RFC 3339 bounds, inclusive).
#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// `GET /reports/sales-summary?from=&to=` - totals grouped by sale status.
pub async fn sales_summary(
    State(state): State<AppState>,
    Actor(ctx): Actor,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<Vec<SalesSummaryRow>>, ApiError> {
    let rows = state
        .db
        .sales()
        .sales_summary(&ctx.company_id, query.from.as_deref(), query.to.as_deref())
        .await?;
    Ok(Json(rows))
}

/// Filter for the stock movement history.
#[derive(Debug, Deserialize)]
pub struct MovementsQuery {
    pub product_id: String,
    pub limit: Option<i64>,
}

/// `GET /reports/stock-movements?product_id=` - movement history for one
/// product, newest first. Feeds external inventory-audit tooling.
pub async fn stock_movements(
    State(state): State<AppState>,
    Actor(ctx): Actor,
    Query(query): Query<MovementsQuery>,
) -> Result<Json<Vec<StockMovement>>, ApiError> {
    let movements = state
        .db
        .stock_movements()
        .list_for_product(
            &ctx.company_id,
            &query.product_id,
            query.limit.unwrap_or(DEFAULT_PAGE),
        )
        .await?;
    Ok(Json(movements))
}

/// `GET /reports/low-stock` - products at or below their reorder threshold.
pub async fn low_stock(
    State(state): State<AppState>,
    Actor(ctx): Actor,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state.db.products().list_low_stock(&ctx.company_id).await?;
    Ok(Json(products))
}

/// Filter for the credit account listing.
#[derive(Debug, Deserialize)]
pub struct CreditQuery {
    pub status: Option<CreditStatus>,
    pub limit: Option<i64>,
}

/// `GET /credit` - credit accounts with balances, feeding aging views.
pub async fn credit_accounts(
    State(state): State<AppState>,
    Actor(ctx): Actor,
    Query(query): Query<CreditQuery>,
) -> Result<Json<Vec<CreditAccount>>, ApiError> {
    let accounts = state
        .db
        .credit()
        .list(
            &ctx.company_id,
            query.status,
            query.limit.unwrap_or(DEFAULT_PAGE),
        )
        .await?;
    Ok(Json(accounts))
}
