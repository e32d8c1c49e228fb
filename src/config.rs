//! Environment-driven configuration.
//!
//! Processor credentials are required; everything else falls back to
//! development defaults.

use std::env;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::domain::money;
use crate::error::{Error, Result};

/// Application configuration loaded once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub stripe: StripeConfig,
    pub platform: PlatformConfig,
}

/// Payment processor credentials and account defaults.
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Secret API key (`STRIPE_SECRET_KEY`).
    pub secret_key: String,
    /// Webhook endpoint signing secret (`STRIPE_WEBHOOK_SECRET`).
    pub webhook_secret: String,
    /// Country for newly provisioned connected accounts.
    pub account_country: String,
}

/// Marketplace-level pricing and addressing.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    /// Public base URL used to build redirect and return links.
    pub base_url: String,
    /// ISO currency code for checkout sessions.
    pub currency: String,
    /// Flat per-order service fee added on top of the ticket price, in
    /// major units.
    pub service_fee: Decimal,
    /// Commission percentage assigned to sellers that carry no explicit
    /// rate.
    pub default_fee_percent: Decimal,
}

impl AppConfig {
    /// Loads configuration from the environment.
    ///
    /// Missing credentials are an error; malformed optional values fall
    /// back to their defaults.
    pub fn from_env() -> Result<Self> {
        let secret_key = require("STRIPE_SECRET_KEY")?;
        let webhook_secret = require("STRIPE_WEBHOOK_SECRET")?;
        let default_fee_percent = money::validate_fee_percent(
            env::var("PLATFORM_DEFAULT_FEE_PERCENT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(dec!(12.0)),
        )?;
        Ok(Self {
            stripe: StripeConfig {
                secret_key,
                webhook_secret,
                account_country: env::var("STRIPE_ACCOUNT_COUNTRY")
                    .unwrap_or_else(|_| "US".to_string()),
            },
            platform: PlatformConfig {
                base_url: env::var("PLATFORM_BASE_URL")
                    .unwrap_or_else(|_| "http://localhost:8080".to_string()),
                currency: env::var("PLATFORM_CURRENCY").unwrap_or_else(|_| "usd".to_string()),
                service_fee: env::var("PLATFORM_SERVICE_FEE")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(dec!(3.20)),
                default_fee_percent,
            },
        })
    }
}

fn require(name: &str) -> Result<String> {
    env::var(name)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| Error::Config(format!("{name} is not set")))
}
