mod common;

use std::sync::Arc;

use async_trait::async_trait;
use boxoffice::application::payouts::PayoutLifecycle;
use boxoffice::domain::SellerId;
use boxoffice::domain::ports::{AccountIdClaim, SellerStore, SellerStoreArc};
use boxoffice::domain::seller::{CapabilityState, Seller};
use boxoffice::error::{Error, ProcessorErrorKind, Result};
use boxoffice::infrastructure::in_memory::InMemorySellerStore;
use common::{MockGateway, TestHarness, active_snapshot, flags_snapshot};
use rust_decimal_macros::dec;
use tokio::sync::Barrier;

#[tokio::test]
async fn provisioning_creates_the_account_once() {
    let h = TestHarness::new();
    h.seed_seller(1).await;

    let first = h.lifecycle.ensure_account(1).await.unwrap();
    assert_eq!(first, "acct_mock_1");
    assert_eq!(h.stored_seller(1).await.account_id(), Some("acct_mock_1"));

    let second = h.lifecycle.ensure_account(1).await.unwrap();
    assert_eq!(second, first);
    assert_eq!(h.gateway.calls().create_account, 1);
}

#[tokio::test]
async fn concurrent_provisioning_converges_on_one_account() {
    let gateway = Arc::new(MockGateway::new());
    // Hold both attempts inside the remote create so neither can see the
    // other's claim beforehand.
    gateway.gate_account_creation(Arc::new(Barrier::new(2)));
    let h = TestHarness::with_gateway(gateway);
    h.seed_seller(1).await;

    let left = tokio::spawn({
        let lifecycle = h.lifecycle.clone();
        async move { lifecycle.ensure_account(1).await }
    });
    let right = tokio::spawn({
        let lifecycle = h.lifecycle.clone();
        async move { lifecycle.ensure_account(1).await }
    });
    let left = left.await.unwrap().unwrap();
    let right = right.await.unwrap().unwrap();

    // Two remote accounts were created, but both callers converge on the
    // single persisted id; the loser's account is orphaned.
    assert_eq!(h.gateway.calls().create_account, 2);
    assert_eq!(left, right);
    assert_eq!(h.stored_seller(1).await.account_id(), Some(left.as_str()));
}

struct FailingClaimStore {
    inner: InMemorySellerStore,
}

#[async_trait]
impl SellerStore for FailingClaimStore {
    async fn get(&self, seller: SellerId) -> Result<Option<Seller>> {
        self.inner.get(seller).await
    }

    async fn find_by_account(&self, account_id: &str) -> Result<Option<Seller>> {
        self.inner.find_by_account(account_id).await
    }

    async fn upsert(&self, seller: Seller) -> Result<()> {
        self.inner.upsert(seller).await
    }

    async fn claim_account_id(
        &self,
        _seller: SellerId,
        _account_id: &str,
    ) -> Result<AccountIdClaim> {
        Err(Error::storage("claim refused"))
    }
}

#[tokio::test]
async fn failed_claim_surfaces_the_dangling_account_id() {
    let sellers: SellerStoreArc = Arc::new(FailingClaimStore {
        inner: InMemorySellerStore::new(),
    });
    let gateway = Arc::new(MockGateway::new());
    let lifecycle = PayoutLifecycle::new(sellers.clone(), gateway, common::BASE_URL, "US");
    let record = Seller::new(1, "seller1@boxoffice.test", dec!(12.0)).unwrap();
    sellers.upsert(record).await.unwrap();

    let err = lifecycle.ensure_account(1).await.unwrap_err();
    match err {
        Error::PartialProvisioning {
            seller, account_id, ..
        } => {
            assert_eq!(seller, 1);
            assert_eq!(account_id, "acct_mock_1");
        }
        other => panic!("unexpected error: {other}"),
    }
    // The local record still has no account; the remote one dangles.
    assert!(sellers.get(1).await.unwrap().unwrap().payout_account.is_none());
}

#[tokio::test]
async fn replayed_snapshots_reconcile_idempotently() {
    let h = TestHarness::new();
    h.seed_pending_seller(1, "acct_a").await;

    let snap = flags_snapshot("acct_a", Some(true), Some(true));
    for _ in 0..3 {
        let report = h.lifecycle.reconcile_from_snapshot(1, &snap).await.unwrap();
        assert!(report.ready);
    }
    assert!(h.stored_seller(1).await.payout_ready());
}

#[tokio::test]
async fn upstream_regression_downgrades_a_ready_account() {
    let h = TestHarness::new();
    h.seed_ready_seller(1, "acct_a").await;

    let report = h
        .lifecycle
        .reconcile_from_snapshot(1, &flags_snapshot("acct_a", Some(false), None))
        .await
        .unwrap();
    assert!(!report.ready);
    assert!(!report.charges_enabled);
    // The partial snapshot did not carry details_submitted, so it survives.
    assert!(report.details_submitted);
    assert!(!h.stored_seller(1).await.payout_ready());
}

#[tokio::test]
async fn out_of_order_partial_snapshots_converge() {
    let h = TestHarness::new();
    h.seed_pending_seller(1, "acct_a").await;

    h.lifecycle
        .reconcile_from_snapshot(1, &flags_snapshot("acct_a", None, Some(true)))
        .await
        .unwrap();
    let report = h
        .lifecycle
        .reconcile_from_snapshot(1, &flags_snapshot("acct_a", Some(true), None))
        .await
        .unwrap();
    assert!(report.ready);
}

#[tokio::test]
async fn snapshot_for_a_foreign_account_is_ignored() {
    let h = TestHarness::new();
    h.seed_ready_seller(1, "acct_a").await;

    let report = h
        .lifecycle
        .reconcile_from_snapshot(1, &flags_snapshot("acct_other", Some(false), Some(false)))
        .await
        .unwrap();
    assert!(report.ready);
    assert!(h.stored_seller(1).await.payout_ready());
}

#[tokio::test]
async fn status_answers_locally_when_ready() {
    let h = TestHarness::new();
    h.seed_ready_seller(1, "acct_a").await;

    let report = h.lifecycle.status(1).await.unwrap();
    assert!(report.ready);
    assert_eq!(h.gateway.calls().retrieve_account, 0);
}

#[tokio::test]
async fn status_checks_live_and_persists_when_pending() {
    let h = TestHarness::new();
    h.seed_pending_seller(1, "acct_a").await;
    h.gateway.set_snapshot(active_snapshot("acct_a"));

    let report = h.lifecycle.status(1).await.unwrap();
    assert!(report.ready);
    assert_eq!(h.gateway.calls().retrieve_account, 1);

    // The confirmation was folded into the store, so the next status call
    // answers without remote traffic.
    let report = h.lifecycle.status(1).await.unwrap();
    assert!(report.ready);
    assert_eq!(h.gateway.calls().retrieve_account, 1);
}

#[tokio::test]
async fn status_for_an_unprovisioned_seller_is_all_false() {
    let h = TestHarness::new();
    h.seed_seller(1).await;

    let report = h.lifecycle.status(1).await.unwrap();
    assert!(!report.ready);
    assert!(!report.charges_enabled);
    assert!(!report.details_submitted);
    assert_eq!(h.gateway.calls().retrieve_account, 0);
}

#[tokio::test]
async fn stalled_account_gets_capabilities_rerequested() {
    let h = TestHarness::new();
    h.seed_pending_seller(1, "acct_a").await;
    let mut snap = active_snapshot("acct_a");
    snap.charges_enabled = Some(false);
    snap.transfers = Some(CapabilityState::Inactive);
    h.gateway.set_snapshot(snap);

    let id = h.lifecycle.ensure_account(1).await.unwrap();
    assert_eq!(id, "acct_a");
    assert_eq!(h.gateway.calls().create_account, 0);
    assert_eq!(h.gateway.capability_requests(), vec!["acct_a".to_string()]);

    // The retrieved flags were folded into the stored record.
    let account = h.stored_seller(1).await.payout_account.unwrap();
    assert!(!account.charges_enabled);
    assert!(account.details_submitted);
}

#[tokio::test]
async fn ready_account_needs_no_remote_traffic() {
    let h = TestHarness::new();
    h.seed_ready_seller(1, "acct_a").await;

    let id = h.lifecycle.ensure_account(1).await.unwrap();
    assert_eq!(id, "acct_a");
    let calls = h.gateway.calls();
    assert_eq!(calls.create_account, 0);
    assert_eq!(calls.retrieve_account, 0);
    assert_eq!(calls.request_capabilities, 0);
}

#[tokio::test]
async fn onboarding_links_carry_refresh_and_return_targets() {
    let h = TestHarness::new();
    h.seed_seller(1).await;

    let handoff = h.lifecycle.start_onboarding(1).await.unwrap();
    assert_eq!(handoff.account_id, "acct_mock_1");
    assert!(handoff.url.contains("/connect/reauth"));
    assert!(handoff.url.contains("/connect/return"));
    assert!(handoff.url.contains("account_id=acct_mock_1"));
}

#[tokio::test]
async fn link_failure_maps_to_onboarding_unavailable() {
    let h = TestHarness::new();
    h.gateway
        .fail_onboarding_links(ProcessorErrorKind::UpstreamUnavailable);
    h.seed_seller(1).await;

    let err = h.lifecycle.start_onboarding(1).await.unwrap_err();
    assert!(matches!(err, Error::OnboardingUnavailable { .. }));
    // The account itself was provisioned and persisted before the link
    // issuance failed; a retry will reuse it.
    assert_eq!(h.stored_seller(1).await.account_id(), Some("acct_mock_1"));
}

#[tokio::test]
async fn refresh_link_prefers_the_explicit_account_id() {
    let h = TestHarness::new();
    h.seed_pending_seller(1, "acct_stored").await;

    let url = h
        .lifecycle
        .refresh_onboarding_link(1, Some("acct_param"))
        .await
        .unwrap();
    assert!(url.contains("/setup/acct_param"));

    let url = h.lifecycle.refresh_onboarding_link(1, None).await.unwrap();
    assert!(url.contains("/setup/acct_stored"));
}

#[tokio::test]
async fn completing_onboarding_pulls_and_persists_remote_state() {
    let h = TestHarness::new();
    h.seed_pending_seller(1, "acct_a").await;
    h.gateway.set_snapshot(active_snapshot("acct_a"));

    let report = h
        .lifecycle
        .complete_onboarding(1, None)
        .await
        .unwrap()
        .unwrap();
    assert!(report.ready);
    assert!(h.stored_seller(1).await.payout_ready());
}

#[tokio::test]
async fn completing_onboarding_without_an_account_is_a_noop() {
    let h = TestHarness::new();
    h.seed_seller(1).await;

    let report = h.lifecycle.complete_onboarding(1, None).await.unwrap();
    assert!(report.is_none());
    assert_eq!(h.gateway.calls().retrieve_account, 0);
}

#[tokio::test]
async fn dashboard_link_reuses_the_stored_account() {
    let h = TestHarness::new();
    h.seed_ready_seller(1, "acct_a").await;

    let url = h.lifecycle.dashboard_link(1).await.unwrap();
    assert_eq!(url, "https://connect.test/dashboard/acct_a");
    assert_eq!(h.gateway.calls().create_account, 0);
}
