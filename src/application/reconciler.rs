//! Webhook-driven reconciliation: verify, parse, dispatch.
//!
//! Delivery is at-least-once and unordered, so everything downstream of the
//! signature check has to be a safe no-op when replayed, foreign, or
//! pointing at an account nobody holds.

use std::sync::Arc;

use crate::domain::SellerId;
use crate::domain::ports::SellerStoreArc;
use crate::domain::seller::AccountSnapshot;
use crate::error::{Error, Result};
use crate::stripe::WebhookVerifier;
use crate::stripe::types;

use super::payouts::PayoutLifecycle;

const ACCOUNT_UPDATED: &str = "account.updated";

/// What the reconciler did with a verified event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookDisposition {
    /// An `account.updated` snapshot was merged for this seller.
    Reconciled { seller: SellerId },
    /// The event type is not meaningful here; acknowledged so the processor
    /// stops redelivering it.
    IgnoredEventType,
    /// The account id matches no stored seller; acknowledged as a no-op.
    UnknownAccount,
}

pub struct WebhookReconciler {
    verifier: WebhookVerifier,
    lifecycle: Arc<PayoutLifecycle>,
    sellers: SellerStoreArc,
}

impl WebhookReconciler {
    pub fn new(
        verifier: WebhookVerifier,
        lifecycle: Arc<PayoutLifecycle>,
        sellers: SellerStoreArc,
    ) -> Self {
        Self {
            verifier,
            lifecycle,
            sellers,
        }
    }

    /// Handles one raw webhook delivery.
    ///
    /// Signature failures reject the payload before anything is parsed.
    /// Foreign event types and unknown accounts acknowledge as successful
    /// no-ops; only a verified `account.updated` for a known seller mutates
    /// state, through the idempotent snapshot merge.
    pub async fn handle_event(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<WebhookDisposition> {
        self.verifier.verify(payload, signature_header)?;

        let event: types::Event = serde_json::from_slice(payload)
            .map_err(|err| Error::InvalidPayload(err.to_string()))?;
        if event.event_type != ACCOUNT_UPDATED {
            tracing::debug!(event = %event.id, kind = %event.event_type, "ignoring event type");
            return Ok(WebhookDisposition::IgnoredEventType);
        }

        let account: types::Account = serde_json::from_value(event.data.object)
            .map_err(|err| Error::InvalidPayload(err.to_string()))?;
        let snapshot = AccountSnapshot::from(account);

        let Some(seller) = self.sellers.find_by_account(&snapshot.account_id).await? else {
            tracing::warn!(
                event = %event.id,
                account = %snapshot.account_id,
                "event references an account no seller holds"
            );
            return Ok(WebhookDisposition::UnknownAccount);
        };

        self.lifecycle
            .reconcile_from_snapshot(seller.id, &snapshot)
            .await?;
        Ok(WebhookDisposition::Reconciled { seller: seller.id })
    }
}
