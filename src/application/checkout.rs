//! Checkout orchestration: pricing, session creation, and the scannable
//! redemption artifact.
//!
//! Sessions are never persisted locally; the processor's record is the
//! source of truth and the returned URL is the capability handed to the
//! buyer.

use std::io::Cursor;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{ImageFormat, Luma};
use qrcode::QrCode;
use rust_decimal::Decimal;

use crate::domain::TicketId;
use crate::domain::money;
use crate::domain::ports::{
    CheckoutSessionRequest, ConnectGatewayArc, HostedCheckout, TicketStoreArc,
};
use crate::domain::seller::Seller;
use crate::error::{Error, Result};

/// PNG-encoded scannable form of a checkout URL. Purely derived; carries no
/// session state of its own.
#[derive(Debug, Clone)]
pub struct RedemptionArtifact {
    pub png: Vec<u8>,
}

impl RedemptionArtifact {
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.png)
    }

    pub fn to_data_uri(&self) -> String {
        format!("data:image/png;base64,{}", self.to_base64())
    }
}

/// Encodes a checkout URL as a QR code PNG.
pub fn render_redemption_artifact(url: &str) -> Result<RedemptionArtifact> {
    let code = QrCode::new(url.as_bytes()).map_err(|err| Error::Artifact(err.to_string()))?;
    let image = code.render::<Luma<u8>>().build();
    let mut png = Cursor::new(Vec::new());
    image
        .write_to(&mut png, ImageFormat::Png)
        .map_err(|err| Error::Artifact(err.to_string()))?;
    Ok(RedemptionArtifact {
        png: png.into_inner(),
    })
}

pub struct CheckoutService {
    tickets: TicketStoreArc,
    gateway: ConnectGatewayArc,
    base_url: String,
    currency: String,
    service_fee: Decimal,
}

impl CheckoutService {
    pub fn new(
        tickets: TicketStoreArc,
        gateway: ConnectGatewayArc,
        base_url: impl Into<String>,
        currency: impl Into<String>,
        service_fee: Decimal,
    ) -> Self {
        Self {
            tickets,
            gateway,
            base_url: base_url.into(),
            currency: currency.into(),
            service_fee,
        }
    }

    /// Creates a hosted checkout session for one ticket.
    ///
    /// The buyer pays `round2(price + service_fee)`; the platform keeps the
    /// commission (ticket override or seller default percentage of the
    /// total) as the application fee and the rest lands on the seller's
    /// payout account. Fails before any remote call when the ticket is
    /// missing, owned by someone else, prices to a non-positive total, or
    /// the seller cannot receive funds yet.
    ///
    /// Each call creates a fresh remote session; identical retries are not
    /// deduplicated and no idempotency key is attached.
    pub async fn create_checkout(
        &self,
        seller: &Seller,
        ticket_id: TicketId,
    ) -> Result<HostedCheckout> {
        let ticket = self
            .tickets
            .get(ticket_id)
            .await?
            .ok_or(Error::TicketNotFound { ticket: ticket_id })?;
        if ticket.seller != seller.id {
            return Err(Error::NotOwner {
                ticket: ticket_id,
                seller: seller.id,
            });
        }

        let total = money::round2(ticket.price + self.service_fee);
        if total <= Decimal::ZERO {
            return Err(Error::InvalidAmount { amount: total });
        }

        let Some(account) = seller.payout_account.as_ref().filter(|a| a.payout_ready()) else {
            return Err(Error::PayoutNotReady { seller: seller.id });
        };

        let fee_percent = ticket.effective_fee_percent(seller);
        let commission = money::commission(total, fee_percent);

        let request = CheckoutSessionRequest {
            product_name: ticket.name.clone(),
            unit_amount_minor: money::minor_units(total)?,
            currency: self.currency.clone(),
            destination_account: account.account_id.clone(),
            application_fee_minor: money::minor_units(commission)?,
            success_url: self.success_url(&ticket.name, total)?,
            cancel_url: format!("{}/", self.base_url),
        };

        let checkout = self.gateway.create_checkout_session(&request, None).await?;
        tracing::info!(
            seller = seller.id,
            ticket = ticket_id,
            session = %checkout.id,
            %total,
            %commission,
            "created checkout session"
        );
        Ok(checkout)
    }

    fn success_url(&self, ticket_name: &str, total: Decimal) -> Result<String> {
        let query = serde_urlencoded::to_string([
            ("ticket", ticket_name.to_string()),
            ("price", total.to_string()),
        ])
        .map_err(|err| Error::Artifact(err.to_string()))?;
        Ok(format!("{}/success?{}", self.base_url, query))
    }
}
