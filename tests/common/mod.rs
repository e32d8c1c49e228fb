#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use axum::Router;
use boxoffice::application::checkout::CheckoutService;
use boxoffice::application::payouts::PayoutLifecycle;
use boxoffice::application::reconciler::WebhookReconciler;
use boxoffice::config::PlatformConfig;
use boxoffice::domain::ports::{
    CheckoutSessionRequest, ConnectGateway, HostedCheckout, LoginLink, NewAccount, OnboardingLink,
    SellerStoreArc, TicketStoreArc,
};
use boxoffice::domain::seller::{AccountSnapshot, CapabilityState, PayoutAccount, Seller};
use boxoffice::domain::ticket::Ticket;
use boxoffice::domain::{SellerId, TicketId};
use boxoffice::error::{ProcessorError, ProcessorErrorKind, Result};
use boxoffice::infrastructure::in_memory::{InMemorySellerStore, InMemoryTicketStore};
use boxoffice::interfaces::http::{AppState, build_router};
use boxoffice::stripe::WebhookVerifier;
use hmac::{Hmac, Mac};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sha2::Sha256;
use tokio::sync::Barrier;

pub const BASE_URL: &str = "http://testhost";
pub const WEBHOOK_SECRET: &str = "whsec_test_secret";
pub const SERVICE_FEE: Decimal = dec!(4.50);
pub const DEFAULT_FEE_PERCENT: Decimal = dec!(12.0);

/// Per-method call counts observed by the mock gateway.
#[derive(Debug, Default, Clone, Copy)]
pub struct CallLog {
    pub create_account: usize,
    pub onboarding_links: usize,
    pub retrieve_account: usize,
    pub request_capabilities: usize,
    pub login_links: usize,
    pub checkout_sessions: usize,
}

/// Scripted stand-in for the payment processor.
///
/// Accounts get ids `acct_mock_1`, `acct_mock_2`, ... in creation order.
/// `retrieve_account` answers from scripted snapshots and falls back to a
/// blank snapshot for unscripted ids.
pub struct MockGateway {
    next_account: AtomicU32,
    snapshots: Mutex<HashMap<String, AccountSnapshot>>,
    calls: Mutex<CallLog>,
    checkout_requests: Mutex<Vec<(CheckoutSessionRequest, Option<String>)>>,
    capability_requests: Mutex<Vec<String>>,
    retrieve_failure: Mutex<Option<ProcessorErrorKind>>,
    link_failure: Mutex<Option<ProcessorErrorKind>>,
    create_gate: Mutex<Option<Arc<Barrier>>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            next_account: AtomicU32::new(0),
            snapshots: Mutex::new(HashMap::new()),
            calls: Mutex::new(CallLog::default()),
            checkout_requests: Mutex::new(Vec::new()),
            capability_requests: Mutex::new(Vec::new()),
            retrieve_failure: Mutex::new(None),
            link_failure: Mutex::new(None),
            create_gate: Mutex::new(None),
        }
    }

    /// Scripts what `retrieve_account` returns for the snapshot's id.
    pub fn set_snapshot(&self, snapshot: AccountSnapshot) {
        self.snapshots
            .lock()
            .unwrap()
            .insert(snapshot.account_id.clone(), snapshot);
    }

    /// Makes every `retrieve_account` call fail with the given kind.
    pub fn fail_retrievals(&self, kind: ProcessorErrorKind) {
        *self.retrieve_failure.lock().unwrap() = Some(kind);
    }

    /// Makes every `create_onboarding_link` call fail with the given kind.
    pub fn fail_onboarding_links(&self, kind: ProcessorErrorKind) {
        *self.link_failure.lock().unwrap() = Some(kind);
    }

    /// Makes `create_account` rendezvous on `barrier` before returning so a
    /// test can hold several provisioning attempts inside the remote call
    /// at the same time.
    pub fn gate_account_creation(&self, barrier: Arc<Barrier>) {
        *self.create_gate.lock().unwrap() = Some(barrier);
    }

    pub fn calls(&self) -> CallLog {
        *self.calls.lock().unwrap()
    }

    pub fn checkout_requests(&self) -> Vec<(CheckoutSessionRequest, Option<String>)> {
        self.checkout_requests.lock().unwrap().clone()
    }

    pub fn capability_requests(&self) -> Vec<String> {
        self.capability_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConnectGateway for MockGateway {
    async fn create_account(
        &self,
        _account: &NewAccount,
        _idempotency_key: Option<&str>,
    ) -> Result<AccountSnapshot> {
        self.calls.lock().unwrap().create_account += 1;
        let gate = self.create_gate.lock().unwrap().clone();
        if let Some(barrier) = gate {
            barrier.wait().await;
        }
        let n = self.next_account.fetch_add(1, Ordering::Relaxed) + 1;
        let snapshot = AccountSnapshot {
            account_id: format!("acct_mock_{n}"),
            ..AccountSnapshot::default()
        };
        self.set_snapshot(snapshot.clone());
        Ok(snapshot)
    }

    async fn create_onboarding_link(
        &self,
        account_id: &str,
        refresh_url: &str,
        return_url: &str,
    ) -> Result<OnboardingLink> {
        self.calls.lock().unwrap().onboarding_links += 1;
        if let Some(kind) = *self.link_failure.lock().unwrap() {
            return Err(ProcessorError::new(kind, "scripted link failure").into());
        }
        Ok(OnboardingLink {
            url: format!(
                "https://connect.test/setup/{account_id}?refresh={refresh_url}&return={return_url}"
            ),
        })
    }

    async fn retrieve_account(&self, account_id: &str) -> Result<AccountSnapshot> {
        self.calls.lock().unwrap().retrieve_account += 1;
        if let Some(kind) = *self.retrieve_failure.lock().unwrap() {
            return Err(ProcessorError::new(kind, "scripted retrieve failure").into());
        }
        Ok(self
            .snapshots
            .lock()
            .unwrap()
            .get(account_id)
            .cloned()
            .unwrap_or_else(|| AccountSnapshot {
                account_id: account_id.to_string(),
                ..AccountSnapshot::default()
            }))
    }

    async fn request_capabilities(&self, account_id: &str) -> Result<()> {
        self.calls.lock().unwrap().request_capabilities += 1;
        self.capability_requests
            .lock()
            .unwrap()
            .push(account_id.to_string());
        Ok(())
    }

    async fn create_login_link(&self, account_id: &str) -> Result<LoginLink> {
        self.calls.lock().unwrap().login_links += 1;
        Ok(LoginLink {
            url: format!("https://connect.test/dashboard/{account_id}"),
        })
    }

    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
        idempotency_key: Option<&str>,
    ) -> Result<HostedCheckout> {
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.checkout_sessions += 1;
            calls.checkout_sessions
        };
        self.checkout_requests
            .lock()
            .unwrap()
            .push((request.clone(), idempotency_key.map(str::to_owned)));
        Ok(HostedCheckout {
            id: format!("cs_test_{n}"),
            url: format!("https://checkout.test/c/cs_test_{n}"),
        })
    }
}

/// In-memory stores plus the full service stack wired to a [`MockGateway`].
pub struct TestHarness {
    pub sellers: SellerStoreArc,
    pub tickets: TicketStoreArc,
    pub gateway: Arc<MockGateway>,
    pub lifecycle: Arc<PayoutLifecycle>,
    pub checkout: Arc<CheckoutService>,
    pub reconciler: Arc<WebhookReconciler>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_gateway(Arc::new(MockGateway::new()))
    }

    pub fn with_gateway(gateway: Arc<MockGateway>) -> Self {
        let sellers: SellerStoreArc = Arc::new(InMemorySellerStore::new());
        let tickets: TicketStoreArc = Arc::new(InMemoryTicketStore::new());
        let lifecycle = Arc::new(PayoutLifecycle::new(
            sellers.clone(),
            gateway.clone(),
            BASE_URL,
            "US",
        ));
        let checkout = Arc::new(CheckoutService::new(
            tickets.clone(),
            gateway.clone(),
            BASE_URL,
            "usd",
            SERVICE_FEE,
        ));
        let reconciler = Arc::new(WebhookReconciler::new(
            WebhookVerifier::new(WEBHOOK_SECRET),
            lifecycle.clone(),
            sellers.clone(),
        ));
        Self {
            sellers,
            tickets,
            gateway,
            lifecycle,
            checkout,
            reconciler,
        }
    }

    pub fn router(&self) -> Router {
        build_router(AppState {
            sellers: self.sellers.clone(),
            tickets: self.tickets.clone(),
            lifecycle: self.lifecycle.clone(),
            checkout: self.checkout.clone(),
            reconciler: self.reconciler.clone(),
            platform: PlatformConfig {
                base_url: BASE_URL.to_string(),
                currency: "usd".to_string(),
                service_fee: SERVICE_FEE,
                default_fee_percent: DEFAULT_FEE_PERCENT,
            },
        })
    }

    pub async fn seed_seller(&self, id: SellerId) -> Seller {
        let seller = Seller::new(id, format!("seller{id}@boxoffice.test"), DEFAULT_FEE_PERCENT)
            .unwrap();
        self.sellers.upsert(seller.clone()).await.unwrap();
        seller
    }

    /// Seeds a seller whose payout account is fully onboarded.
    pub async fn seed_ready_seller(&self, id: SellerId, account_id: &str) -> Seller {
        let mut seller = self.seed_seller(id).await;
        let mut account = PayoutAccount::new(account_id);
        account.charges_enabled = true;
        account.details_submitted = true;
        seller.payout_account = Some(account);
        self.sellers.upsert(seller.clone()).await.unwrap();
        seller
    }

    /// Seeds a seller holding an account that has not finished onboarding.
    pub async fn seed_pending_seller(&self, id: SellerId, account_id: &str) -> Seller {
        let mut seller = self.seed_seller(id).await;
        seller.payout_account = Some(PayoutAccount::new(account_id));
        self.sellers.upsert(seller.clone()).await.unwrap();
        seller
    }

    pub async fn seed_ticket(&self, seller: SellerId, name: &str, price: Decimal) -> Ticket {
        let id = self.tickets.next_id().await.unwrap();
        let ticket = Ticket::new(id, seller, name, price, None).unwrap();
        self.tickets.insert(ticket.clone()).await.unwrap();
        ticket
    }

    pub async fn stored_seller(&self, id: SellerId) -> Seller {
        self.sellers.get(id).await.unwrap().unwrap()
    }

    pub async fn stored_ticket(&self, id: TicketId) -> Ticket {
        self.tickets.get(id).await.unwrap().unwrap()
    }
}

/// Snapshot carrying only the two onboarding flags.
pub fn flags_snapshot(
    account_id: &str,
    charges: Option<bool>,
    details: Option<bool>,
) -> AccountSnapshot {
    AccountSnapshot {
        account_id: account_id.to_string(),
        charges_enabled: charges,
        details_submitted: details,
        ..AccountSnapshot::default()
    }
}

/// Snapshot of a fully onboarded account with live capabilities.
pub fn active_snapshot(account_id: &str) -> AccountSnapshot {
    AccountSnapshot {
        account_id: account_id.to_string(),
        charges_enabled: Some(true),
        details_submitted: Some(true),
        payouts_enabled: Some(true),
        card_payments: Some(CapabilityState::Active),
        transfers: Some(CapabilityState::Active),
        currently_due: Vec::new(),
    }
}

pub fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

/// Signs `payload` the way the processor does, with an explicit timestamp.
pub fn sign_payload(payload: &[u8], timestamp: i64) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes()).unwrap();
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    let signature = hex::encode(mac.finalize().into_bytes());
    format!("t={timestamp},v1={signature}")
}

/// Signs `payload` with the current time, i.e. a fresh delivery.
pub fn signature_for(payload: &[u8]) -> String {
    sign_payload(payload, unix_now())
}

/// Serialized `account.updated` event wrapping the given account object.
pub fn account_updated_event(object: serde_json::Value) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "id": "evt_test_1",
        "type": "account.updated",
        "data": { "object": object }
    }))
    .unwrap()
}

/// Minimal account object as it appears inside an `account.updated` event.
pub fn account_object(account_id: &str, charges: bool, details: bool) -> serde_json::Value {
    serde_json::json!({
        "id": account_id,
        "charges_enabled": charges,
        "details_submitted": details,
        "payouts_enabled": charges,
        "capabilities": { "card_payments": "active", "transfers": "active" },
        "requirements": { "currently_due": [] }
    })
}
