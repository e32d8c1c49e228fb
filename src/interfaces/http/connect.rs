//! Connected-account endpoints: onboarding, dashboard, status, and the
//! unauthenticated health probe.

use axum::Json;
use axum::extract::{Query, State};
use axum::response::{Html, Redirect};
use serde::{Deserialize, Serialize};

use super::AppState;
use super::auth::CurrentSeller;
use super::error::ApiError;
use crate::application::payouts::{OnboardingHandoff, StatusReport};
use crate::domain::seller::{CapabilityState, PayoutStatus};

#[derive(Debug, Deserialize)]
pub struct AccountIdQuery {
    account_id: Option<String>,
}

/// POST /api/connect/create-account
pub async fn create_account(
    State(state): State<AppState>,
    CurrentSeller(seller): CurrentSeller,
) -> Result<Json<OnboardingHandoff>, ApiError> {
    let handoff = state.lifecycle.start_onboarding(seller.id).await?;
    Ok(Json(handoff))
}

/// GET /connect/reauth — re-issues an expired onboarding link.
///
/// This sits on a browser redirect path, so failures degrade to the
/// payouts page instead of an error body.
pub async fn reauth(
    State(state): State<AppState>,
    CurrentSeller(seller): CurrentSeller,
    Query(query): Query<AccountIdQuery>,
) -> Redirect {
    match state
        .lifecycle
        .refresh_onboarding_link(seller.id, query.account_id.as_deref())
        .await
    {
        Ok(url) => Redirect::to(&url),
        Err(err) => {
            tracing::warn!(seller = seller.id, error = %err, "link refresh failed, falling back");
            Redirect::to("/payouts")
        }
    }
}

/// GET /connect/return — landing target after the hosted onboarding flow.
pub async fn connect_return(
    State(state): State<AppState>,
    CurrentSeller(seller): CurrentSeller,
    Query(query): Query<AccountIdQuery>,
) -> Redirect {
    match state
        .lifecycle
        .complete_onboarding(seller.id, query.account_id.as_deref())
        .await
    {
        Ok(Some(_)) => Redirect::to("/payouts?onboard=done"),
        Ok(None) => Redirect::to("/payouts"),
        Err(err) => {
            tracing::warn!(seller = seller.id, error = %err, "return reconciliation failed");
            Redirect::to("/payouts")
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    url: String,
}

/// POST /api/connect/dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    CurrentSeller(seller): CurrentSeller,
) -> Result<Json<DashboardResponse>, ApiError> {
    let url = state.lifecycle.dashboard_link(seller.id).await?;
    Ok(Json(DashboardResponse { url }))
}

/// GET /api/connect/status
pub async fn status(
    State(state): State<AppState>,
    CurrentSeller(seller): CurrentSeller,
) -> Result<Json<StatusReport>, ApiError> {
    Ok(Json(state.lifecycle.status(seller.id).await?))
}

#[derive(Debug, Deserialize)]
pub struct HealthQuery {
    acct: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    ok: bool,
    id: String,
    charges_enabled: bool,
    payouts_enabled: bool,
    details_submitted: bool,
    capabilities: HealthCapabilities,
    currently_due: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthCapabilities {
    card_payments: Option<CapabilityState>,
    transfers: Option<CapabilityState>,
}

/// GET /api/connect/health?acct= — live remote probe, no auth.
pub async fn health(
    State(state): State<AppState>,
    Query(query): Query<HealthQuery>,
) -> Result<Json<HealthResponse>, ApiError> {
    let snapshot = state.lifecycle.probe_account(&query.acct).await?;
    Ok(Json(HealthResponse {
        ok: true,
        id: snapshot.account_id,
        charges_enabled: snapshot.charges_enabled.unwrap_or(false),
        payouts_enabled: snapshot.payouts_enabled.unwrap_or(false),
        details_submitted: snapshot.details_submitted.unwrap_or(false),
        capabilities: HealthCapabilities {
            card_payments: snapshot.card_payments,
            transfers: snapshot.transfers,
        },
        currently_due: snapshot.currently_due,
    }))
}

#[derive(Debug, Deserialize)]
pub struct PayoutsQuery {
    onboard: Option<String>,
}

/// GET /payouts — the safe landing page for the redirect flows. Renders
/// from the stored record only; no remote calls on this path.
pub async fn payouts_page(
    CurrentSeller(seller): CurrentSeller,
    Query(query): Query<PayoutsQuery>,
) -> Html<String> {
    let banner = if query.onboard.as_deref() == Some("done") {
        "<p><strong>Onboarding complete.</strong> Capability checks may still be in flight.</p>"
    } else {
        ""
    };
    let status_line = match &seller.payout_account {
        Some(account) => match account.status() {
            PayoutStatus::Active => {
                "Payouts are <strong>active</strong>: this account can receive funds.".to_string()
            }
            PayoutStatus::Pending => format!(
                "Payouts are <strong>pending</strong> for account {} \
                 (charges enabled: {}, details submitted: {}).",
                account.account_id, account.charges_enabled, account.details_submitted
            ),
        },
        None => "No payout account yet. Start onboarding to create one.".to_string(),
    };
    Html(format!(
        "<!doctype html><html><head><title>Payouts</title></head><body>\
         <h1>Payouts</h1>{banner}<p>{status_line}</p>\
         <p>POST /api/connect/create-account to start or resume onboarding; \
         POST /api/connect/dashboard for the hosted dashboard.</p>\
         </body></html>"
    ))
}
