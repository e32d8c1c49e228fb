//! Webhook signature verification.
//!
//! The `Stripe-Signature` header carries a unix timestamp and one or more
//! `v1` HMAC-SHA256 signatures computed over `"{timestamp}.{payload}"`.
//! Verification is constant time and enforces a replay window on the
//! timestamp.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Acceptance window for the signed timestamp, in seconds.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

#[derive(Clone)]
pub struct WebhookVerifier {
    secret: String,
    tolerance_secs: i64,
}

impl WebhookVerifier {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            tolerance_secs: DEFAULT_TOLERANCE_SECS,
        }
    }

    pub fn with_tolerance(mut self, tolerance_secs: i64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    /// Verifies `payload` against `header` using the system clock.
    pub fn verify(&self, payload: &[u8], header: &str) -> Result<()> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs() as i64)
            .unwrap_or(0);
        self.verify_at(payload, header, now)
    }

    /// Clock-injected verification; `now_unix` stands in for the system
    /// clock.
    pub fn verify_at(&self, payload: &[u8], header: &str, now_unix: i64) -> Result<()> {
        let header = SignatureHeader::parse(header)?;
        if (now_unix - header.timestamp).abs() > self.tolerance_secs {
            return Err(Error::InvalidSignature(format!(
                "timestamp {} outside the {}s tolerance",
                header.timestamp, self.tolerance_secs
            )));
        }

        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|_| Error::InvalidSignature("unusable signing secret".to_string()))?;
        mac.update(header.timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);

        let accepted = header
            .signatures
            .iter()
            .any(|candidate| mac.clone().verify_slice(candidate).is_ok());
        if accepted {
            Ok(())
        } else {
            Err(Error::InvalidSignature(
                "no matching v1 signature".to_string(),
            ))
        }
    }
}

struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    /// Parses `t=<unix>,v1=<hex>[,v1=<hex>...]`. Unknown schemes, such as
    /// `v0`, are skipped.
    fn parse(header: &str) -> Result<Self> {
        let mut timestamp = None;
        let mut signatures = Vec::new();
        for part in header.split(',') {
            let Some((key, value)) = part.trim().split_once('=') else {
                continue;
            };
            match key {
                "t" => timestamp = value.parse::<i64>().ok(),
                "v1" => {
                    if let Ok(decoded) = hex::decode(value) {
                        signatures.push(decoded);
                    }
                }
                _ => {}
            }
        }
        let timestamp = timestamp
            .ok_or_else(|| Error::InvalidSignature("missing or malformed timestamp".to_string()))?;
        if signatures.is_empty() {
            return Err(Error::InvalidSignature(
                "no decodable v1 signature".to_string(),
            ));
        }
        Ok(Self {
            timestamp,
            signatures,
        })
    }
}
