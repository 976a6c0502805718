//! Amount arithmetic
//!
//! Minor-unit helpers shared by every discount strategy. All amounts are `i64` minor units of
//! the cart currency; percentages are rounded once per product, half away from zero.

use decimal_percentage::Percentage;
use num_traits::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::MoneyError;
use thiserror::Error;

/// Errors raised by minor-unit arithmetic.
#[derive(Debug, Error)]
pub enum AmountError {
    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// Integer arithmetic on minor units overflowed.
    #[error("minor unit arithmetic overflowed")]
    Overflow,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Convert percentage points (`10` for 10%) into a fractional [`Percentage`].
pub fn percentage_from_points(points: Decimal) -> Percentage {
    Percentage::from(points / Decimal::ONE_HUNDRED)
}

/// Calculate the discount amount in minor units based on a percentage and a minor unit amount.
///
/// # Errors
///
/// Returns [`AmountError::PercentConversion`] if the product overflows or cannot be represented.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, AmountError> {
    let minor = Decimal::from_i64(minor).ok_or(AmountError::PercentConversion)?;

    // `Percentage` only exposes its value through multiplication.
    ((*percent) * Decimal::ONE)
        .checked_mul(minor)
        .ok_or(AmountError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(AmountError::PercentConversion)
}

/// Multiply a minor-unit amount by a count.
///
/// # Errors
///
/// Returns [`AmountError::Overflow`] if the product does not fit in `i64`.
pub fn times(minor: i64, count: u64) -> Result<i64, AmountError> {
    i64::try_from(count)
        .ok()
        .and_then(|count| minor.checked_mul(count))
        .ok_or(AmountError::Overflow)
}

/// Add two minor-unit amounts.
///
/// # Errors
///
/// Returns [`AmountError::Overflow`] if the sum does not fit in `i64`.
pub fn plus(left: i64, right: i64) -> Result<i64, AmountError> {
    left.checked_add(right).ok_or(AmountError::Overflow)
}

/// Subtract one minor-unit amount from another.
///
/// # Errors
///
/// Returns [`AmountError::Overflow`] if the difference does not fit in `i64`.
pub fn minus(left: i64, right: i64) -> Result<i64, AmountError> {
    left.checked_sub(right).ok_or(AmountError::Overflow)
}

/// Percentage of `base` plus a fixed amount, capped to `[0, base]`.
///
/// # Errors
///
/// Returns an [`AmountError`] if the percentage or the addition overflows.
pub fn capped_discount(base: i64, percent: &Percentage, fixed: i64) -> Result<i64, AmountError> {
    let amount = plus(percent_of_minor(percent, base)?, fixed)?;

    Ok(amount.clamp(0, base.max(0)))
}
