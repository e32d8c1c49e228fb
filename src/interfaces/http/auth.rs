//! Authenticated-principal extraction.
//!
//! Real registration and session handling live outside this system; the
//! opaque stand-in is a bearer token carrying the seller id, resolved
//! against the seller store.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use super::AppState;
use super::error::ApiError;
use crate::domain::seller::Seller;

#[derive(Debug, Clone)]
pub struct CurrentSeller(pub Seller);

#[async_trait]
impl FromRequestParts<AppState> for CurrentSeller {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("missing authorization header"))?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("expected a bearer token"))?;
        let seller_id = token
            .trim()
            .parse()
            .map_err(|_| ApiError::unauthorized("malformed bearer token"))?;
        let seller = state
            .sellers
            .get(seller_id)
            .await
            .map_err(ApiError::from)?
            .ok_or_else(|| ApiError::unauthorized("unknown seller"))?;
        Ok(Self(seller))
    }
}
