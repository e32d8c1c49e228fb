//! Domain error to HTTP response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::{Error, ProcessorErrorKind};

/// A handler failure carrying its HTTP status and a user-facing message,
/// rendered as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::TicketNotFound { .. } => StatusCode::NOT_FOUND,
            Error::NotOwner { .. } => StatusCode::FORBIDDEN,
            Error::PayoutNotReady { .. } => StatusCode::CONFLICT,
            Error::InvalidAmount { .. }
            | Error::TicketLimitReached { .. }
            | Error::InvalidFeePercent { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Error::InvalidSignature(_) | Error::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            Error::OnboardingUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Error::Processor(processor) => match processor.kind {
                ProcessorErrorKind::RateLimited | ProcessorErrorKind::UpstreamUnavailable => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                ProcessorErrorKind::AuthFailure | ProcessorErrorKind::InvalidRequest => {
                    StatusCode::BAD_GATEWAY
                }
            },
            Error::PartialProvisioning { .. }
            | Error::Artifact(_)
            | Error::Storage(_)
            | Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %err, "request failed");
        }
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
