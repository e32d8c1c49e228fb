//! HTTP surface: router assembly and shared handler state.

pub mod auth;
pub mod checkout;
pub mod connect;
pub mod error;
pub mod webhook;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::application::checkout::CheckoutService;
use crate::application::payouts::PayoutLifecycle;
use crate::application::reconciler::WebhookReconciler;
use crate::config::PlatformConfig;
use crate::domain::ports::{SellerStoreArc, TicketStoreArc};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub sellers: SellerStoreArc,
    pub tickets: TicketStoreArc,
    pub lifecycle: Arc<PayoutLifecycle>,
    pub checkout: Arc<CheckoutService>,
    pub reconciler: Arc<WebhookReconciler>,
    pub platform: PlatformConfig,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(checkout::storefront).post(checkout::buy))
        .route("/success", get(checkout::success))
        .route("/payouts", get(connect::payouts_page))
        .route("/api/connect/create-account", post(connect::create_account))
        .route("/connect/reauth", get(connect::reauth))
        .route("/connect/return", get(connect::connect_return))
        .route("/api/connect/dashboard", post(connect::dashboard))
        .route("/api/connect/status", get(connect::status))
        .route("/api/connect/health", get(connect::health))
        .route("/stripe/webhook", post(webhook::receive))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
