//! Payout-account lifecycle and checkout-session orchestration for a small
//! ticket marketplace: connected accounts are provisioned and tracked per
//! seller, reconciled against processor webhooks, and checkout sessions
//! split each sale between the seller and the platform.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod interfaces;
pub mod stripe;
