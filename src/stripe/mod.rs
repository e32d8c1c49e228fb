//! Payment processor adapter: a thin REST client, the wire types it speaks,
//! and webhook signature verification.

pub mod client;
pub mod types;
pub mod webhook;

pub use client::StripeClient;
pub use webhook::WebhookVerifier;
