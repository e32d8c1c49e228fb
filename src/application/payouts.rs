//! Payout-account lifecycle: provisioning, onboarding handoff, capability
//! tracking, and state reconciliation.
//!
//! The account id on the seller record is the anchor of the whole state
//! machine. It is written exactly once, through a compare-and-set, so
//! concurrent provisioning attempts converge on a single account; the
//! losing side's freshly created remote account is orphaned and never
//! referenced again.

use serde::Serialize;

use crate::domain::SellerId;
use crate::domain::ports::{AccountIdClaim, ConnectGatewayArc, NewAccount, SellerStoreArc};
use crate::domain::seller::{AccountSnapshot, Seller};
use crate::error::{Error, Result};

/// Result of `start_onboarding`: the provisioned account plus the single-use
/// link to hand the seller.
#[derive(Debug, Clone, Serialize)]
pub struct OnboardingHandoff {
    pub account_id: String,
    pub url: String,
}

/// Capability flags as reported to callers, local-first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub ready: bool,
    pub charges_enabled: bool,
    pub details_submitted: bool,
}

impl StatusReport {
    fn of(seller: &Seller) -> Self {
        match &seller.payout_account {
            Some(account) => Self {
                ready: account.payout_ready(),
                charges_enabled: account.charges_enabled,
                details_submitted: account.details_submitted,
            },
            None => Self::unprovisioned(),
        }
    }

    fn unprovisioned() -> Self {
        Self {
            ready: false,
            charges_enabled: false,
            details_submitted: false,
        }
    }
}

pub struct PayoutLifecycle {
    sellers: SellerStoreArc,
    gateway: ConnectGatewayArc,
    base_url: String,
    account_country: String,
}

impl PayoutLifecycle {
    pub fn new(
        sellers: SellerStoreArc,
        gateway: ConnectGatewayArc,
        base_url: impl Into<String>,
        account_country: impl Into<String>,
    ) -> Self {
        Self {
            sellers,
            gateway,
            base_url: base_url.into(),
            account_country: account_country.into(),
        }
    }

    /// Returns the seller's payout account id, provisioning a remote account
    /// only when none is on record.
    ///
    /// The create call carries a per-seller idempotency key, and the id is
    /// persisted through the store's compare-and-set before returning, so
    /// repeated and concurrent calls never leave two persisted ids. When the
    /// persist fails after a successful remote create, the dangling remote
    /// id surfaces inside `PartialProvisioning` instead of disappearing.
    ///
    /// An existing account that is not yet payout-ready gets a remote
    /// re-check, and lapsed capabilities are re-requested; a ready account
    /// is returned without any remote call.
    pub async fn ensure_account(&self, seller: SellerId) -> Result<String> {
        let mut record = self.load(seller).await?;
        if let Some(account) = &record.payout_account {
            let account_id = account.account_id.clone();
            if !account.payout_ready() {
                self.repair_stalled_account(&mut record, &account_id).await?;
            }
            return Ok(account_id);
        }

        let request = NewAccount {
            seller,
            email: record.email.clone(),
            country: self.account_country.clone(),
        };
        let idempotency_key = format!("seller-{seller}-account");
        let created = self
            .gateway
            .create_account(&request, Some(&idempotency_key))
            .await?;

        match self
            .sellers
            .claim_account_id(seller, &created.account_id)
            .await
        {
            Ok(AccountIdClaim::Claimed) => {
                tracing::info!(seller, account = %created.account_id, "provisioned payout account");
                Ok(created.account_id)
            }
            Ok(AccountIdClaim::AlreadySet(existing)) => {
                tracing::warn!(
                    seller,
                    winner = %existing,
                    orphan = %created.account_id,
                    "lost the provisioning race, orphaning the fresh account"
                );
                Ok(existing)
            }
            Err(source) => Err(Error::PartialProvisioning {
                seller,
                account_id: created.account_id,
                source: Box::new(source),
            }),
        }
    }

    /// Ensures an account and returns a single-use onboarding link with
    /// refresh and return targets bound to that account.
    pub async fn start_onboarding(&self, seller: SellerId) -> Result<OnboardingHandoff> {
        let account_id = self.ensure_account(seller).await?;
        let url = self.onboarding_link(&account_id).await?;
        Ok(OnboardingHandoff { account_id, url })
    }

    /// Re-issues an onboarding link after a previous one expired. The
    /// account id resolves from the explicit parameter, then the stored id,
    /// then a full `ensure_account`.
    pub async fn refresh_onboarding_link(
        &self,
        seller: SellerId,
        account_id: Option<&str>,
    ) -> Result<String> {
        let account_id = match account_id {
            Some(id) => id.to_string(),
            None => match self.stored_account_id(seller).await? {
                Some(id) => id,
                None => self.ensure_account(seller).await?,
            },
        };
        self.onboarding_link(&account_id).await
    }

    /// Merges a remote account snapshot into the seller's stored flags.
    ///
    /// Only fields the snapshot carries are applied, so replayed or
    /// out-of-order deliveries converge; an unchanged merge writes nothing.
    /// Snapshots for an account the seller does not hold are ignored.
    pub async fn reconcile_from_snapshot(
        &self,
        seller: SellerId,
        snapshot: &AccountSnapshot,
    ) -> Result<StatusReport> {
        let mut record = self.load(seller).await?;
        let changed = match record.payout_account.as_mut() {
            Some(account) if account.account_id == snapshot.account_id => {
                account.apply_snapshot(snapshot)
            }
            Some(account) => {
                tracing::warn!(
                    seller,
                    stored = %account.account_id,
                    received = %snapshot.account_id,
                    "snapshot references a different account, ignoring"
                );
                false
            }
            None => {
                tracing::warn!(seller, "snapshot for a seller with no payout account, ignoring");
                false
            }
        };
        let report = StatusReport::of(&record);
        if changed {
            self.sellers.upsert(record).await?;
            tracing::info!(
                seller,
                ready = report.ready,
                charges_enabled = report.charges_enabled,
                details_submitted = report.details_submitted,
                "reconciled payout account state"
            );
        }
        Ok(report)
    }

    /// Pulls the remote account state after the seller returns from the
    /// hosted onboarding flow and persists what it shows. Returns `None`
    /// when there is no account to verify.
    pub async fn complete_onboarding(
        &self,
        seller: SellerId,
        account_id: Option<&str>,
    ) -> Result<Option<StatusReport>> {
        let account_id = match account_id {
            Some(id) => id.to_string(),
            None => match self.stored_account_id(seller).await? {
                Some(id) => id,
                None => return Ok(None),
            },
        };
        let snapshot = self.gateway.retrieve_account(&account_id).await?;
        let report = self.reconcile_from_snapshot(seller, &snapshot).await?;
        Ok(Some(report))
    }

    /// One-time login link into the seller's processor-hosted dashboard.
    pub async fn dashboard_link(&self, seller: SellerId) -> Result<String> {
        let account_id = self.ensure_account(seller).await?;
        let link = self.gateway.create_login_link(&account_id).await?;
        Ok(link.url)
    }

    /// Capability flags for the seller, preferring the locally stored view.
    ///
    /// A locally ready account answers without a remote call; a not-ready
    /// or missing local view triggers one live check and folds the result
    /// back into the store. Local flags only ever come from remote
    /// snapshots, so a stored "ready" always had a live confirmation
    /// behind it.
    pub async fn status(&self, seller: SellerId) -> Result<StatusReport> {
        let record = self.load(seller).await?;
        match &record.payout_account {
            Some(account) if account.payout_ready() => Ok(StatusReport::of(&record)),
            Some(account) => {
                let snapshot = self.gateway.retrieve_account(&account.account_id).await?;
                self.reconcile_from_snapshot(seller, &snapshot).await
            }
            None => Ok(StatusReport::of(&record)),
        }
    }

    /// Raw remote account lookup for the unauthenticated health probe.
    pub async fn probe_account(&self, account_id: &str) -> Result<AccountSnapshot> {
        self.gateway.retrieve_account(account_id).await
    }

    async fn load(&self, seller: SellerId) -> Result<Seller> {
        self.sellers
            .get(seller)
            .await?
            .ok_or_else(|| Error::storage(format!("seller {seller} not found")))
    }

    async fn stored_account_id(&self, seller: SellerId) -> Result<Option<String>> {
        Ok(self
            .sellers
            .get(seller)
            .await?
            .and_then(|record| record.account_id().map(str::to_owned)))
    }

    async fn onboarding_link(&self, account_id: &str) -> Result<String> {
        let refresh_url = self.redirect_target("/connect/reauth", account_id)?;
        let return_url = self.redirect_target("/connect/return", account_id)?;
        match self
            .gateway
            .create_onboarding_link(account_id, &refresh_url, &return_url)
            .await
        {
            Ok(link) => Ok(link.url),
            Err(err) => Err(Error::OnboardingUnavailable {
                account_id: account_id.to_string(),
                reason: err.to_string(),
            }),
        }
    }

    /// Retrieves the remote state of a stalled account, re-requests lapsed
    /// capabilities, and folds the snapshot into the stored record.
    async fn repair_stalled_account(&self, record: &mut Seller, account_id: &str) -> Result<()> {
        let snapshot = self.gateway.retrieve_account(account_id).await?;
        if snapshot.needs_capability_request() {
            tracing::warn!(
                seller = record.id,
                account = %account_id,
                "capabilities lapsed upstream, re-requesting"
            );
            self.gateway.request_capabilities(account_id).await?;
        }
        if let Some(account) = record.payout_account.as_mut() {
            if account.account_id == account_id && account.apply_snapshot(&snapshot) {
                self.sellers.upsert(record.clone()).await?;
            }
        }
        Ok(())
    }

    fn redirect_target(&self, path: &str, account_id: &str) -> Result<String> {
        let query = serde_urlencoded::to_string([("account_id", account_id)])
            .map_err(|err| Error::Artifact(err.to_string()))?;
        Ok(format!("{}{}?{}", self.base_url, path, query))
    }
}
