//! Sale lifecycle handlers: draft, settle, cancel, refund.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::context::Actor;
use crate::error::ApiError;
use crate::AppState;
use colmado_db::engine::{CreateSaleRequest, PaySaleRequest, RefundSaleRequest};
use colmado_db::repository::sale::SaleWithItems;

/// `POST /sales` - creates a draft sale (a priced quote, no stock effect).
pub async fn create_sale(
    State(state): State<AppState>,
    Actor(ctx): Actor,
    Json(payload): Json<CreateSaleRequest>,
) -> Result<(StatusCode, Json<SaleWithItems>), ApiError> {
    let sale = state.db.engine().create_sale(&ctx, payload).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

/// `GET /sales/{id}` - fetches a sale with its items.
pub async fn get_sale(
    State(state): State<AppState>,
    Actor(ctx): Actor,
    Path(sale_id): Path<String>,
) -> Result<Json<SaleWithItems>, ApiError> {
    let sale = state
        .db
        .sales()
        .get_with_items(&ctx.company_id, &sale_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Sale", &sale_id))?;
    Ok(Json(sale))
}

/// `POST /sales/{id}/pay` - settles a draft sale.
pub async fn pay_sale(
    State(state): State<AppState>,
    Actor(ctx): Actor,
    Path(sale_id): Path<String>,
    Json(payload): Json<PaySaleRequest>,
) -> Result<Json<SaleWithItems>, ApiError> {
    let sale = state.db.engine().pay_sale(&ctx, &sale_id, payload).await?;
    Ok(Json(sale))
}

/// `POST /sales/{id}/cancel` - cancels a sale (idempotent).
pub async fn cancel_sale(
    State(state): State<AppState>,
    Actor(ctx): Actor,
    Path(sale_id): Path<String>,
) -> Result<Json<SaleWithItems>, ApiError> {
    let sale = state.db.engine().cancel_sale(&ctx, &sale_id).await?;
    Ok(Json(sale))
}

/// `POST /sales/{id}/refund` - refunds a sale, fully (no body items) or
/// partially (explicit items).
pub async fn refund_sale(
    State(state): State<AppState>,
    Actor(ctx): Actor,
    Path(sale_id): Path<String>,
    payload: Option<Json<RefundSaleRequest>>,
) -> Result<Json<SaleWithItems>, ApiError> {
    let request = payload.map(|Json(r)| r).unwrap_or_default();
    let sale = state
        .db
        .engine()
        .refund_sale(&ctx, &sale_id, request)
        .await?;
    Ok(Json(sale))
}
