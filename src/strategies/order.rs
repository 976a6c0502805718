//! Order discounts

use crate::{
    discounts::{
        OrderExtra,
        amounts::{capped_discount, percentage_from_points},
    },
    filters::OrderView,
    strategies::{StrategyError, StrategyOutcome},
};

/// Percentage of the running subtotal plus the fixed amount, capped at the running subtotal.
///
/// No units are consumed.
///
/// # Errors
///
/// Returns a [`StrategyError`] if the arithmetic overflows.
pub fn apply(
    extra: &OrderExtra<'_>,
    order: &OrderView<'_, '_>,
) -> Result<StrategyOutcome, StrategyError> {
    let discount_minor = capped_discount(
        order.subtotal_minor,
        &percentage_from_points(extra.percent),
        extra.fixed.to_minor_units(),
    )?;

    Ok(StrategyOutcome {
        discount_minor,
        ..StrategyOutcome::default()
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rusty_money::{Money, iso::GBP};
    use testresult::TestResult;

    use super::*;

    fn view(subtotal_minor: i64) -> OrderView<'static, 'static> {
        OrderView {
            lines: &[],
            remaining: &[],
            subtotal_minor,
            quantity_total: 0,
            placed_at: None,
            customer_id: None,
        }
    }

    #[test]
    fn percentage_of_running_subtotal() -> TestResult {
        let extra = OrderExtra {
            percent: Decimal::TEN,
            fixed: Money::from_minor(0, GBP),
        };

        let outcome = apply(&extra, &view(950))?;

        assert_eq!(outcome.discount_minor, 95);
        assert_eq!(outcome.quantity_discounted, 0);
        assert!(outcome.consumed.is_empty());

        Ok(())
    }

    #[test]
    fn fixed_amount_never_exceeds_subtotal() -> TestResult {
        let extra = OrderExtra {
            percent: Decimal::ZERO,
            fixed: Money::from_minor(500, GBP),
        };

        assert_eq!(apply(&extra, &view(300))?.discount_minor, 300);
        assert_eq!(apply(&extra, &view(0))?.discount_minor, 0);

        Ok(())
    }
}
