//! Money helpers on top of `rust_decimal`
//!
//! Every amount in the tender flow is a `Decimal` rounded to 2 places,
//! half away from zero.

use rust_decimal::prelude::*;

/// Rounding precision for monetary values
const DECIMAL_PLACES: u32 = 2;

/// Tolerance for monetary comparisons (0.01)
pub const MONEY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Round to cents
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Clamp at zero and round to cents
#[inline]
pub fn non_negative(value: Decimal) -> Decimal {
    round_money(value.max(Decimal::ZERO))
}

/// Whether an amount is zero within tolerance
#[inline]
pub fn is_settled(balance: Decimal) -> bool {
    balance < MONEY_TOLERANCE
}
