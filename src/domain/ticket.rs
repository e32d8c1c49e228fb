use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{SellerId, TicketId};
use crate::domain::money;
use crate::domain::seller::Seller;
use crate::error::{Error, Result};

/// Hard cap on listed tickets per seller.
pub const MAX_TICKETS_PER_SELLER: usize = 5;

/// A ticket listed for sale by exactly one seller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub seller: SellerId,
    pub name: String,
    /// Listed price in major currency units.
    pub price: Decimal,
    /// Per-ticket commission override; falls back to the seller default.
    #[serde(default)]
    pub fee_percent: Option<Decimal>,
}

impl Ticket {
    pub fn new(
        id: TicketId,
        seller: SellerId,
        name: impl Into<String>,
        price: Decimal,
        fee_percent: Option<Decimal>,
    ) -> Result<Self> {
        if price <= Decimal::ZERO {
            return Err(Error::InvalidAmount { amount: price });
        }
        let fee_percent = fee_percent.map(money::validate_fee_percent).transpose()?;
        Ok(Self {
            id,
            seller,
            name: name.into(),
            price,
            fee_percent,
        })
    }

    /// Commission percentage for this ticket: the override when present,
    /// otherwise the owning seller's default.
    pub fn effective_fee_percent(&self, seller: &Seller) -> Decimal {
        self.fee_percent.unwrap_or(seller.fee_percent)
    }
}

/// Guards the per-seller listing cap given the seller's current count.
pub fn ensure_capacity(seller: SellerId, current: usize) -> Result<()> {
    if current >= MAX_TICKETS_PER_SELLER {
        return Err(Error::TicketLimitReached {
            seller,
            limit: MAX_TICKETS_PER_SELLER,
        });
    }
    Ok(())
}
