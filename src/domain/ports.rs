use std::sync::Arc;

use async_trait::async_trait;

use super::seller::{AccountSnapshot, Seller};
use super::ticket::Ticket;
use super::{SellerId, TicketId};
use crate::error::Result;

/// Outcome of the compare-and-set on a seller's payout account id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountIdClaim {
    /// The id was persisted; the caller's account is the one on record.
    Claimed,
    /// A different id was already on record; it is returned so the caller
    /// can adopt it and treat its own account as an orphan.
    AlreadySet(String),
}

#[async_trait]
pub trait SellerStore: Send + Sync {
    async fn get(&self, seller: SellerId) -> Result<Option<Seller>>;
    /// Reverse lookup by connected account id, used when reconciling
    /// processor events.
    async fn find_by_account(&self, account_id: &str) -> Result<Option<Seller>>;
    async fn upsert(&self, seller: Seller) -> Result<()>;
    /// Atomically records `account_id` for the seller unless one is already
    /// present. Concurrent provisioning attempts resolve here: exactly one
    /// caller observes `Claimed`.
    async fn claim_account_id(&self, seller: SellerId, account_id: &str)
        -> Result<AccountIdClaim>;
}

#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn get(&self, ticket: TicketId) -> Result<Option<Ticket>>;
    /// Persists a ticket, enforcing the per-seller listing cap.
    async fn insert(&self, ticket: Ticket) -> Result<()>;
    async fn list_for_seller(&self, seller: SellerId) -> Result<Vec<Ticket>>;
    /// Allocates the next unused ticket id.
    async fn next_id(&self) -> Result<TicketId>;
}

/// Request to provision a connected account for a seller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub seller: SellerId,
    pub email: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnboardingLink {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginLink {
    pub url: String,
}

/// A destination charge for a single ticket, with the platform commission
/// taken as an application fee. Amounts are minor units, already rounded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionRequest {
    pub product_name: String,
    pub unit_amount_minor: i64,
    pub currency: String,
    pub destination_account: String,
    pub application_fee_minor: i64,
    pub success_url: String,
    pub cancel_url: String,
}

/// A hosted checkout page created by the processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedCheckout {
    pub id: String,
    pub url: String,
}

/// Payment processor operations for connected accounts and checkout.
#[async_trait]
pub trait ConnectGateway: Send + Sync {
    async fn create_account(
        &self,
        account: &NewAccount,
        idempotency_key: Option<&str>,
    ) -> Result<AccountSnapshot>;
    async fn create_onboarding_link(
        &self,
        account_id: &str,
        refresh_url: &str,
        return_url: &str,
    ) -> Result<OnboardingLink>;
    async fn retrieve_account(&self, account_id: &str) -> Result<AccountSnapshot>;
    /// Re-requests the card payments and transfers capabilities for an
    /// account that lost or never gained them.
    async fn request_capabilities(&self, account_id: &str) -> Result<()>;
    async fn create_login_link(&self, account_id: &str) -> Result<LoginLink>;
    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
        idempotency_key: Option<&str>,
    ) -> Result<HostedCheckout>;
}

pub type SellerStoreArc = Arc<dyn SellerStore>;
pub type TicketStoreArc = Arc<dyn TicketStore>;
pub type ConnectGatewayArc = Arc<dyn ConnectGateway>;
