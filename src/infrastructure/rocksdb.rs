use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options};
use tokio::sync::Mutex;

use crate::domain::ports::{AccountIdClaim, SellerStore, TicketStore};
use crate::domain::seller::{PayoutAccount, Seller};
use crate::domain::ticket::{self, Ticket};
use crate::domain::{SellerId, TicketId};
use crate::error::{Error, Result};

/// Column family for seller records.
pub const CF_SELLERS: &str = "sellers";
/// Column family for ticket listings.
pub const CF_TICKETS: &str = "tickets";

/// A persistent store backed by RocksDB.
///
/// Sellers and tickets live in separate column families, keyed by their
/// big-endian u32 ids with JSON values. Read-modify-write operations (the
/// account-id claim and capped ticket inserts) serialize on a single mutex;
/// RocksDB itself only gives us atomic point writes.
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
    next_ticket_id: Arc<AtomicU32>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at `path`, ensuring both column
    /// families exist and seeding the ticket id counter from stored keys.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_sellers = ColumnFamilyDescriptor::new(CF_SELLERS, Options::default());
        let cf_tickets = ColumnFamilyDescriptor::new(CF_TICKETS, Options::default());

        let db = DB::open_cf_descriptors(&opts, path, vec![cf_sellers, cf_tickets])
            .map_err(Error::storage)?;

        let mut max_id = 0u32;
        if let Some(cf) = db.cf_handle(CF_TICKETS) {
            for item in db.iterator_cf(cf, IteratorMode::Start) {
                let (key, _) = item.map_err(Error::storage)?;
                if let Ok(bytes) = <[u8; 4]>::try_from(key.as_ref()) {
                    max_id = max_id.max(u32::from_be_bytes(bytes));
                }
            }
        }

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
            next_ticket_id: Arc::new(AtomicU32::new(max_id)),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::storage(format!("{name} column family not found")))
    }

    fn get_seller(&self, seller: SellerId) -> Result<Option<Seller>> {
        let cf = self.cf(CF_SELLERS)?;
        match self.db.get_cf(cf, seller.to_be_bytes()).map_err(Error::storage)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes).map_err(Error::storage)?)),
            None => Ok(None),
        }
    }

    fn put_seller(&self, seller: &Seller) -> Result<()> {
        let cf = self.cf(CF_SELLERS)?;
        let value = serde_json::to_vec(seller).map_err(Error::storage)?;
        self.db
            .put_cf(cf, seller.id.to_be_bytes(), value)
            .map_err(Error::storage)
    }
}

#[async_trait]
impl SellerStore for RocksDBStore {
    async fn get(&self, seller: SellerId) -> Result<Option<Seller>> {
        self.get_seller(seller)
    }

    async fn find_by_account(&self, account_id: &str) -> Result<Option<Seller>> {
        let cf = self.cf(CF_SELLERS)?;
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = item.map_err(Error::storage)?;
            let seller: Seller = serde_json::from_slice(&value).map_err(Error::storage)?;
            if seller.account_id() == Some(account_id) {
                return Ok(Some(seller));
            }
        }
        Ok(None)
    }

    async fn upsert(&self, seller: Seller) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.put_seller(&seller)
    }

    async fn claim_account_id(
        &self,
        seller: SellerId,
        account_id: &str,
    ) -> Result<AccountIdClaim> {
        let _guard = self.write_lock.lock().await;
        let mut record = self
            .get_seller(seller)?
            .ok_or_else(|| Error::storage(format!("seller {seller} not found")))?;
        if let Some(existing) = &record.payout_account {
            return Ok(AccountIdClaim::AlreadySet(existing.account_id.clone()));
        }
        record.payout_account = Some(PayoutAccount::new(account_id));
        self.put_seller(&record)?;
        Ok(AccountIdClaim::Claimed)
    }
}

#[async_trait]
impl TicketStore for RocksDBStore {
    async fn get(&self, ticket: TicketId) -> Result<Option<Ticket>> {
        let cf = self.cf(CF_TICKETS)?;
        match self.db.get_cf(cf, ticket.to_be_bytes()).map_err(Error::storage)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes).map_err(Error::storage)?)),
            None => Ok(None),
        }
    }

    async fn insert(&self, ticket: Ticket) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let listed = TicketStore::list_for_seller(self, ticket.seller)
            .await?
            .into_iter()
            .filter(|existing| existing.id != ticket.id)
            .count();
        ticket::ensure_capacity(ticket.seller, listed)?;

        let cf = self.cf(CF_TICKETS)?;
        let value = serde_json::to_vec(&ticket).map_err(Error::storage)?;
        self.db
            .put_cf(cf, ticket.id.to_be_bytes(), value)
            .map_err(Error::storage)?;
        self.next_ticket_id.fetch_max(ticket.id, Ordering::Relaxed);
        Ok(())
    }

    async fn list_for_seller(&self, seller: SellerId) -> Result<Vec<Ticket>> {
        let cf = self.cf(CF_TICKETS)?;
        let mut listed = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = item.map_err(Error::storage)?;
            let ticket: Ticket = serde_json::from_slice(&value).map_err(Error::storage)?;
            if ticket.seller == seller {
                listed.push(ticket);
            }
        }
        listed.sort_by_key(|ticket| ticket.id);
        Ok(listed)
    }

    async fn next_id(&self) -> Result<TicketId> {
        Ok(self.next_ticket_id.fetch_add(1, Ordering::Relaxed) + 1)
    }
}
