use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::ports::{AccountIdClaim, SellerStore, TicketStore};
use crate::domain::seller::{PayoutAccount, Seller};
use crate::domain::ticket::{self, Ticket};
use crate::domain::{SellerId, TicketId};
use crate::error::{Error, Result};

/// A thread-safe in-memory store for sellers.
///
/// Uses `Arc<RwLock<HashMap>>` for shared concurrent access; the account-id
/// claim runs under the write lock, which is what makes it atomic.
#[derive(Default, Clone)]
pub struct InMemorySellerStore {
    sellers: Arc<RwLock<HashMap<SellerId, Seller>>>,
}

impl InMemorySellerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SellerStore for InMemorySellerStore {
    async fn get(&self, seller: SellerId) -> Result<Option<Seller>> {
        let sellers = self.sellers.read().await;
        Ok(sellers.get(&seller).cloned())
    }

    async fn find_by_account(&self, account_id: &str) -> Result<Option<Seller>> {
        let sellers = self.sellers.read().await;
        Ok(sellers
            .values()
            .find(|seller| seller.account_id() == Some(account_id))
            .cloned())
    }

    async fn upsert(&self, seller: Seller) -> Result<()> {
        let mut sellers = self.sellers.write().await;
        sellers.insert(seller.id, seller);
        Ok(())
    }

    async fn claim_account_id(
        &self,
        seller: SellerId,
        account_id: &str,
    ) -> Result<AccountIdClaim> {
        let mut sellers = self.sellers.write().await;
        let record = sellers
            .get_mut(&seller)
            .ok_or_else(|| Error::storage(format!("seller {seller} not found")))?;
        match &record.payout_account {
            Some(existing) => Ok(AccountIdClaim::AlreadySet(existing.account_id.clone())),
            None => {
                record.payout_account = Some(PayoutAccount::new(account_id));
                Ok(AccountIdClaim::Claimed)
            }
        }
    }
}

/// A thread-safe in-memory store for tickets.
///
/// The per-seller listing cap is enforced under the write lock on insert.
#[derive(Default, Clone)]
pub struct InMemoryTicketStore {
    tickets: Arc<RwLock<HashMap<TicketId, Ticket>>>,
    next_id: Arc<AtomicU32>,
}

impl InMemoryTicketStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TicketStore for InMemoryTicketStore {
    async fn get(&self, ticket: TicketId) -> Result<Option<Ticket>> {
        let tickets = self.tickets.read().await;
        Ok(tickets.get(&ticket).cloned())
    }

    async fn insert(&self, ticket: Ticket) -> Result<()> {
        let mut tickets = self.tickets.write().await;
        let listed = tickets
            .values()
            .filter(|existing| existing.seller == ticket.seller && existing.id != ticket.id)
            .count();
        ticket::ensure_capacity(ticket.seller, listed)?;
        self.next_id.fetch_max(ticket.id, Ordering::Relaxed);
        tickets.insert(ticket.id, ticket);
        Ok(())
    }

    async fn list_for_seller(&self, seller: SellerId) -> Result<Vec<Ticket>> {
        let tickets = self.tickets.read().await;
        let mut listed: Vec<Ticket> = tickets
            .values()
            .filter(|ticket| ticket.seller == seller)
            .cloned()
            .collect();
        listed.sort_by_key(|ticket| ticket.id);
        Ok(listed)
    }

    async fn next_id(&self) -> Result<TicketId> {
        Ok(self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
    }
}
