//! Monetary rounding helpers.
//!
//! All amounts are `rust_decimal::Decimal` and are rounded to two decimal
//! places, half away from zero, after every arithmetic step.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places kept for every stored amount.
pub const MONEY_SCALE: u32 = 2;

/// Round an amount to 2 dp, half away from zero.
pub fn round2(amount: Decimal) -> Decimal {
    let mut rounded = amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    // Keep a fixed scale so "900" and "900.00" persist identically.
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// `max(0, amount)`, rounded.
pub fn non_negative(amount: Decimal) -> Decimal {
    round2(amount.max(Decimal::ZERO))
}

/// Parse a stored amount.
pub fn parse_amount(text: &str) -> Result<Decimal, rust_decimal::Error> {
    text.trim().parse::<Decimal>().map(round2)
}
