//! Purchase order handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::context::Actor;
use crate::error::ApiError;
use crate::AppState;
use colmado_db::engine::CreatePurchaseRequest;
use colmado_db::repository::purchase::PurchaseWithItems;

/// `POST /purchases` - creates a purchase order with committed lines.
pub async fn create_purchase(
    State(state): State<AppState>,
    Actor(ctx): Actor,
    Json(payload): Json<CreatePurchaseRequest>,
) -> Result<(StatusCode, Json<PurchaseWithItems>), ApiError> {
    let order = state.db.engine().create_purchase(&ctx, payload).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// `POST /purchases/{id}/receive` - receives a pending order exactly once,
/// incrementing stock and updating cost bases.
pub async fn receive_purchase(
    State(state): State<AppState>,
    Actor(ctx): Actor,
    Path(purchase_id): Path<String>,
) -> Result<Json<PurchaseWithItems>, ApiError> {
    let order = state
        .db
        .engine()
        .receive_purchase(&ctx, &purchase_id)
        .await?;
    Ok(Json(order))
}
