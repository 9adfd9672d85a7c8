//! Manual inventory adjustment handler.

use axum::extract::State;
use axum::Json;

use crate::context::Actor;
use crate::error::ApiError;
use crate::AppState;
use colmado_db::engine::{AdjustStockOutcome, AdjustStockRequest};

/// `POST /inventory/adjust` - applies a signed stock correction with a
/// mandatory audit note. Honors the product's `allow_negative_stock` flag.
pub async fn adjust_stock(
    State(state): State<AppState>,
    Actor(ctx): Actor,
    Json(payload): Json<AdjustStockRequest>,
) -> Result<Json<AdjustStockOutcome>, ApiError> {
    let outcome = state.db.engine().adjust_stock(&ctx, payload).await?;
    Ok(Json(outcome))
}
