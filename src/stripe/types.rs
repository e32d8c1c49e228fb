//! Wire-level payloads, kept separate from the domain types so API drift
//! stays contained here.

use serde::Deserialize;

use crate::domain::seller::{AccountSnapshot, CapabilityState};

/// Connected account object as returned by the `/v1/accounts` endpoints and
/// carried inside `account.updated` events.
///
/// Flag fields deserialize to `None` when absent so partial payloads merge
/// instead of clobbering local state.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub id: String,
    #[serde(default)]
    pub charges_enabled: Option<bool>,
    #[serde(default)]
    pub details_submitted: Option<bool>,
    #[serde(default)]
    pub payouts_enabled: Option<bool>,
    #[serde(default)]
    pub capabilities: Capabilities,
    #[serde(default)]
    pub requirements: Requirements,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Capabilities {
    #[serde(default)]
    pub card_payments: Option<CapabilityState>,
    #[serde(default)]
    pub transfers: Option<CapabilityState>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Requirements {
    #[serde(default)]
    pub currently_due: Vec<String>,
}

impl From<Account> for AccountSnapshot {
    fn from(account: Account) -> Self {
        Self {
            account_id: account.id,
            charges_enabled: account.charges_enabled,
            details_submitted: account.details_submitted,
            payouts_enabled: account.payouts_enabled,
            card_payments: account.capabilities.card_payments,
            transfers: account.capabilities.transfers,
            currently_due: account.requirements.currently_due,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AccountLink {
    pub url: String,
    #[serde(default)]
    pub expires_at: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginLink {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    /// Absent once a session is consumed or expired.
    #[serde(default)]
    pub url: Option<String>,
}

/// Event envelope: only what reconciliation needs. `data.object` stays raw
/// until the event type has been dispatched.
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "type")]
    pub error_type: Option<String>,
}
