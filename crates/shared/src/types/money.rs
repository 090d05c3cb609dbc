//! Money helpers with centavo precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! All amounts are `rust_decimal::Decimal` values held at two decimal places.

use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places stored for every peso amount.
pub const MONEY_SCALE: u32 = 2;

/// Rounds an amount to centavos, half away from zero.
///
/// The result always carries exactly [`MONEY_SCALE`] decimal places, so
/// `450` and `450.00` render the same way after rounding.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    let mut rounded =
        amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}
