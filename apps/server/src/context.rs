//! Actor context extraction.
//!
//! Every engine operation runs as an authenticated actor (company id, user
//! id). Authentication itself is external; by the time a request reaches
//! this service, a trusted gateway has validated the session and stamped
//! the identity headers. The extractor only refuses requests that arrive
//! without them.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;
use colmado_core::ActorContext;

/// Extracts the [`ActorContext`] from `X-Company-ID` / `X-User-ID` headers.
#[derive(Debug, Clone)]
pub struct Actor(pub ActorContext);

#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let company_id = parts
            .headers
            .get("X-Company-ID")
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::unauthorized("Missing X-Company-ID header"))?;

        let user_id = parts
            .headers
            .get("X-User-ID")
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| ApiError::unauthorized("Missing X-User-ID header"))?;

        Ok(Actor(ActorContext::new(company_id, user_id)))
    }
}
