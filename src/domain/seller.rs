use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::SellerId;
use crate::domain::money;
use crate::error::Result;

/// Capability status as tracked by the processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityState {
    Active,
    Pending,
    Inactive,
    #[serde(other)]
    Unknown,
}

impl CapabilityState {
    /// Whether the capability has lapsed and must be re-requested upstream.
    pub fn needs_request(self) -> bool {
        !matches!(self, Self::Active | Self::Pending)
    }
}

/// Point-in-time observation of the remote connected account.
///
/// Flag fields are optional on purpose: a snapshot only speaks for the
/// fields it actually carries, which is what keeps the reconciliation merge
/// safe under at-least-once, out-of-order delivery.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AccountSnapshot {
    pub account_id: String,
    pub charges_enabled: Option<bool>,
    pub details_submitted: Option<bool>,
    pub payouts_enabled: Option<bool>,
    pub card_payments: Option<CapabilityState>,
    pub transfers: Option<CapabilityState>,
    pub currently_due: Vec<String>,
}

impl AccountSnapshot {
    /// True when either requested capability is missing or lapsed, meaning a
    /// stalled or upstream-reset account that needs its capabilities
    /// re-requested rather than a brand new account.
    pub fn needs_capability_request(&self) -> bool {
        fn lapsed(cap: Option<CapabilityState>) -> bool {
            cap.is_none_or(CapabilityState::needs_request)
        }
        lapsed(self.card_payments) || lapsed(self.transfers)
    }
}

/// Onboarding progress of a payout account.
///
/// There is no terminal failure state: a stalled `Pending` account stays
/// retryable through a fresh onboarding link indefinitely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayoutStatus {
    Pending,
    Active,
}

/// Locally persisted view of a seller's connected payout account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutAccount {
    pub account_id: String,
    #[serde(default)]
    pub charges_enabled: bool,
    #[serde(default)]
    pub details_submitted: bool,
}

impl PayoutAccount {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            charges_enabled: false,
            details_submitted: false,
        }
    }

    /// Both flags confirmed: the seller can receive funds.
    pub fn payout_ready(&self) -> bool {
        self.charges_enabled && self.details_submitted
    }

    pub fn status(&self) -> PayoutStatus {
        if self.payout_ready() {
            PayoutStatus::Active
        } else {
            PayoutStatus::Pending
        }
    }

    /// Merges a remote snapshot into the local flags.
    ///
    /// Only fields the snapshot carries are touched (last snapshot wins,
    /// keyed by field presence). Applying the same snapshot twice leaves the
    /// state unchanged. Returns whether anything changed; a `true` after the
    /// account was ready is a legitimate upstream regression.
    pub fn apply_snapshot(&mut self, snapshot: &AccountSnapshot) -> bool {
        let before = (self.charges_enabled, self.details_submitted);
        if let Some(charges) = snapshot.charges_enabled {
            self.charges_enabled = charges;
        }
        if let Some(details) = snapshot.details_submitted {
            self.details_submitted = details;
        }
        (self.charges_enabled, self.details_submitted) != before
    }
}

/// A seller: the authenticated principal that owns tickets and at most one
/// payout account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seller {
    pub id: SellerId,
    pub email: String,
    /// Default commission percentage applied when a ticket carries no
    /// override. Invariant: 0..=100.
    pub fee_percent: Decimal,
    #[serde(default)]
    pub payout_account: Option<PayoutAccount>,
}

impl Seller {
    pub fn new(id: SellerId, email: impl Into<String>, fee_percent: Decimal) -> Result<Self> {
        Ok(Self {
            id,
            email: email.into(),
            fee_percent: money::validate_fee_percent(fee_percent)?,
            payout_account: None,
        })
    }

    pub fn account_id(&self) -> Option<&str> {
        self.payout_account
            .as_ref()
            .map(|account| account.account_id.as_str())
    }

    pub fn payout_ready(&self) -> bool {
        self.payout_account
            .as_ref()
            .is_some_and(PayoutAccount::payout_ready)
    }
}
