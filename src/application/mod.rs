//! Application layer orchestrating the payout-account lifecycle, checkout
//! sessions, and webhook-driven reconciliation.
//!
//! Services own their ports behind trait objects; every operation is a
//! short-lived unit of work with a bounded number of remote calls followed
//! by at most one store write.

pub mod checkout;
pub mod payouts;
pub mod reconciler;
