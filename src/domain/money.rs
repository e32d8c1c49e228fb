use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{Error, Result};

/// Rounds a monetary value to 2 decimal places, half-up.
pub fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Converts a major-unit amount into integer minor units (cents).
///
/// The conversion is a decimal shift, never float math, so `13.00` yields
/// exactly `1300`.
pub fn minor_units(amount: Decimal) -> Result<i64> {
    let shifted = (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    shifted.to_i64().ok_or(Error::InvalidAmount { amount })
}

/// Platform commission on a charged total, as a rounded major-unit amount.
///
/// The percentage decides how the total is split, not its magnitude.
pub fn commission(total: Decimal, fee_percent: Decimal) -> Decimal {
    round2(total * fee_percent / Decimal::ONE_HUNDRED)
}

/// Validates a commission percentage against the 0..=100 invariant.
pub fn validate_fee_percent(value: Decimal) -> Result<Decimal> {
    if value >= Decimal::ZERO && value <= Decimal::ONE_HUNDRED {
        Ok(value)
    } else {
        Err(Error::InvalidFeePercent { value })
    }
}
