//! REST adapter for the processor's Connect and Checkout APIs.
//!
//! The API speaks form-encoded requests with bracketed nested keys and JSON
//! responses. Calls are never retried here; failures map onto
//! `ProcessorError` kinds and callers decide policy.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;

use super::types;
use crate::domain::ports::{
    CheckoutSessionRequest, ConnectGateway, HostedCheckout, LoginLink, NewAccount, OnboardingLink,
};
use crate::domain::seller::AccountSnapshot;
use crate::error::{Error, ProcessorError, ProcessorErrorKind, Result};

const DEFAULT_API_BASE: &str = "https://api.stripe.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone)]
pub struct StripeClient {
    http: Client,
    secret_key: String,
    api_base: String,
}

impl StripeClient {
    pub fn new(secret_key: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| {
                Error::Processor(ProcessorError::new(
                    ProcessorErrorKind::UpstreamUnavailable,
                    err.to_string(),
                ))
            })?;
        Ok(Self {
            http,
            secret_key: secret_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        })
    }

    /// Points the client at a different API host; tests aim it at a local
    /// mock server.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
        idempotency_key: Option<&str>,
    ) -> Result<T> {
        let mut request = self
            .http
            .post(format!("{}{}", self.api_base, path))
            .bearer_auth(&self.secret_key)
            .form(params);
        if let Some(key) = idempotency_key {
            request = request.header("Idempotency-Key", key);
        }
        let response = request.send().await.map_err(transport_error)?;
        Self::decode(response).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .http
            .get(format!("{}{}", self.api_base, path))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(transport_error)?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            return response.json::<T>().await.map_err(|err| {
                Error::Processor(ProcessorError::new(
                    ProcessorErrorKind::InvalidRequest,
                    format!("undecodable response body: {err}"),
                ))
            });
        }
        let message = match response.json::<types::ApiErrorBody>().await {
            Ok(body) => body
                .error
                .message
                .unwrap_or_else(|| format!("http status {status}")),
            Err(_) => format!("http status {status}"),
        };
        Err(Error::Processor(ProcessorError::new(
            kind_for_status(status),
            message,
        )))
    }
}

fn kind_for_status(status: StatusCode) -> ProcessorErrorKind {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProcessorErrorKind::AuthFailure,
        StatusCode::TOO_MANY_REQUESTS => ProcessorErrorKind::RateLimited,
        status if status.is_client_error() => ProcessorErrorKind::InvalidRequest,
        _ => ProcessorErrorKind::UpstreamUnavailable,
    }
}

fn transport_error(err: reqwest::Error) -> Error {
    let kind = if err.is_timeout() || err.is_connect() {
        ProcessorErrorKind::UpstreamUnavailable
    } else {
        ProcessorErrorKind::InvalidRequest
    };
    Error::Processor(ProcessorError::new(kind, err.to_string()))
}

#[async_trait]
impl ConnectGateway for StripeClient {
    async fn create_account(
        &self,
        account: &NewAccount,
        idempotency_key: Option<&str>,
    ) -> Result<AccountSnapshot> {
        let params = [
            ("type", "express".to_string()),
            ("country", account.country.clone()),
            ("email", account.email.clone()),
            ("capabilities[card_payments][requested]", "true".to_string()),
            ("capabilities[transfers][requested]", "true".to_string()),
            ("metadata[seller_id]", account.seller.to_string()),
        ];
        let wire: types::Account = self
            .post_form("/v1/accounts", &params, idempotency_key)
            .await?;
        Ok(wire.into())
    }

    async fn create_onboarding_link(
        &self,
        account_id: &str,
        refresh_url: &str,
        return_url: &str,
    ) -> Result<OnboardingLink> {
        let params = [
            ("account", account_id.to_string()),
            ("refresh_url", refresh_url.to_string()),
            ("return_url", return_url.to_string()),
            ("type", "account_onboarding".to_string()),
        ];
        let wire: types::AccountLink = self.post_form("/v1/account_links", &params, None).await?;
        Ok(OnboardingLink { url: wire.url })
    }

    async fn retrieve_account(&self, account_id: &str) -> Result<AccountSnapshot> {
        let wire: types::Account = self.get_json(&format!("/v1/accounts/{account_id}")).await?;
        Ok(wire.into())
    }

    async fn request_capabilities(&self, account_id: &str) -> Result<()> {
        let params = [
            ("capabilities[card_payments][requested]", "true".to_string()),
            ("capabilities[transfers][requested]", "true".to_string()),
        ];
        let _: types::Account = self
            .post_form(&format!("/v1/accounts/{account_id}"), &params, None)
            .await?;
        Ok(())
    }

    async fn create_login_link(&self, account_id: &str) -> Result<LoginLink> {
        let wire: types::LoginLink = self
            .post_form(&format!("/v1/accounts/{account_id}/login_links"), &[], None)
            .await?;
        Ok(LoginLink { url: wire.url })
    }

    async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
        idempotency_key: Option<&str>,
    ) -> Result<HostedCheckout> {
        let params = [
            ("mode", "payment".to_string()),
            ("payment_method_types[0]", "card".to_string()),
            ("line_items[0][quantity]", "1".to_string()),
            (
                "line_items[0][price_data][currency]",
                request.currency.clone(),
            ),
            (
                "line_items[0][price_data][product_data][name]",
                request.product_name.clone(),
            ),
            (
                "line_items[0][price_data][unit_amount]",
                request.unit_amount_minor.to_string(),
            ),
            (
                "payment_intent_data[application_fee_amount]",
                request.application_fee_minor.to_string(),
            ),
            (
                "payment_intent_data[transfer_data][destination]",
                request.destination_account.clone(),
            ),
            ("success_url", request.success_url.clone()),
            ("cancel_url", request.cancel_url.clone()),
        ];
        let wire: types::CheckoutSession = self
            .post_form("/v1/checkout/sessions", &params, idempotency_key)
            .await?;
        let url = wire.url.ok_or_else(|| {
            Error::Processor(ProcessorError::new(
                ProcessorErrorKind::InvalidRequest,
                "checkout session has no redirect url",
            ))
        })?;
        Ok(HostedCheckout { id: wire.id, url })
    }
}
