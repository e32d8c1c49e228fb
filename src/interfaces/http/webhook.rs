//! Processor webhook endpoint.
//!
//! The body must stay raw bytes until the signature is verified; parsing
//! first would both waste work and widen the attack surface.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};

use super::AppState;
use super::error::ApiError;

pub const SIGNATURE_HEADER: &str = "Stripe-Signature";

/// POST /stripe/webhook — 200 with an empty body on success (including
/// intentional no-ops), 400 on signature or payload failures.
pub async fn receive(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::bad_request("missing signature header"))?;
    state.reconciler.handle_event(&body, signature).await?;
    Ok(StatusCode::OK)
}
