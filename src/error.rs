use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::{SellerId, TicketId};

pub type Result<T> = std::result::Result<T, Error>;

/// Stable classification of upstream payment-processor failures.
///
/// The client maps transport and HTTP-status failures onto these kinds and
/// never retries; callers decide policy per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorErrorKind {
    AuthFailure,
    RateLimited,
    InvalidRequest,
    UpstreamUnavailable,
}

impl std::fmt::Display for ProcessorErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::AuthFailure => "auth failure",
            Self::RateLimited => "rate limited",
            Self::InvalidRequest => "invalid request",
            Self::UpstreamUnavailable => "upstream unavailable",
        };
        f.write_str(name)
    }
}

/// A failed call to the payment processor, wrapped with its kind.
#[derive(Debug, Clone, Error)]
#[error("processor error ({kind}): {message}")]
pub struct ProcessorError {
    pub kind: ProcessorErrorKind,
    pub message: String,
}

impl ProcessorError {
    pub fn new(kind: ProcessorErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Processor(#[from] ProcessorError),

    /// The processor refused to issue an onboarding link for the account.
    #[error("onboarding link unavailable for account {account_id}: {reason}")]
    OnboardingUnavailable { account_id: String, reason: String },

    /// The remote account was created but persisting its id failed. The
    /// dangling remote id is carried so operators can reconcile it instead
    /// of blindly creating a second account.
    #[error("account {account_id} created upstream but not persisted for seller {seller}")]
    PartialProvisioning {
        seller: SellerId,
        account_id: String,
        #[source]
        source: Box<Error>,
    },

    #[error("ticket {ticket} not found")]
    TicketNotFound { ticket: TicketId },

    #[error("ticket {ticket} does not belong to seller {seller}")]
    NotOwner { ticket: TicketId, seller: SellerId },

    #[error("checkout total {amount} is not chargeable")]
    InvalidAmount { amount: Decimal },

    /// Checkout was requested for a seller whose account cannot receive funds.
    #[error("seller {seller} has no payout-ready account")]
    PayoutNotReady { seller: SellerId },

    #[error("webhook signature verification failed: {0}")]
    InvalidSignature(String),

    #[error("malformed webhook payload: {0}")]
    InvalidPayload(String),

    #[error("seller {seller} already has {limit} tickets")]
    TicketLimitReached { seller: SellerId, limit: usize },

    #[error("fee percent {value} is outside 0..=100")]
    InvalidFeePercent { value: Decimal },

    #[error("artifact encoding failed: {0}")]
    Artifact(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn storage(message: impl std::fmt::Display) -> Self {
        Self::Storage(message.to_string())
    }
}
