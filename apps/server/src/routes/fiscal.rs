//! Fiscal sequence handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::context::Actor;
use crate::error::ApiError;
use crate::AppState;
use colmado_core::{validation, FiscalSequence};
use colmado_db::repository::fiscal::NcfIssued;

/// Request to configure a fiscal sequence.
#[derive(Debug, Deserialize)]
pub struct CreateSequenceRequest {
    pub doc_type: String,
    pub max_number: Option<i64>,
}

/// Request for the next NCF of a doc type.
#[derive(Debug, Deserialize)]
pub struct NextNcfRequest {
    pub doc_type: String,
}

/// `POST /fiscal/sequences` - configures a sequence for a doc type.
pub async fn create_sequence(
    State(state): State<AppState>,
    Actor(ctx): Actor,
    Json(payload): Json<CreateSequenceRequest>,
) -> Result<(StatusCode, Json<FiscalSequence>), ApiError> {
    validation::validate_doc_type(&payload.doc_type)
        .map_err(colmado_core::CoreError::from)
        .map_err(ApiError::from)?;

    let sequence = state
        .db
        .fiscal()
        .create_sequence(&ctx.company_id, &payload.doc_type, payload.max_number)
        .await?;
    Ok((StatusCode::CREATED, Json(sequence)))
}

/// `POST /fiscal/next-ncf` - atomically issues the next fiscal number.
///
/// The issued number is never reused, even if the caller abandons it.
pub async fn next_ncf(
    State(state): State<AppState>,
    Actor(ctx): Actor,
    Json(payload): Json<NextNcfRequest>,
) -> Result<Json<NcfIssued>, ApiError> {
    validation::validate_doc_type(&payload.doc_type)
        .map_err(colmado_core::CoreError::from)
        .map_err(ApiError::from)?;

    let issued = state
        .db
        .fiscal()
        .next_ncf(&ctx.company_id, &payload.doc_type)
        .await?;
    Ok(Json(issued))
}
