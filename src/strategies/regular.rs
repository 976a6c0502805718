//! Regular discounts

use crate::{
    config::FixedAmountScope,
    discounts::{
        RegularExtra,
        amounts::{AmountError, percent_of_minor, percentage_from_points, plus, times},
    },
    eligibility::EligibleUnits,
    strategies::{StrategyError, StrategyOutcome},
};

/// Percentage of the eligible subtotal plus the fixed amount, capped at the eligible subtotal.
///
/// Every eligible unit is consumed.
///
/// # Errors
///
/// Returns a [`StrategyError`] if the arithmetic overflows.
pub fn apply(
    extra: &RegularExtra<'_>,
    items: &EligibleUnits,
    fixed_scope: FixedAmountScope,
) -> Result<StrategyOutcome, StrategyError> {
    let mut subtotal = 0_i64;

    for line in items.lines() {
        subtotal = plus(subtotal, times(line.unit_price_minor, u64::from(line.available))?)?;
    }

    let quantity = items.quantity();

    let fixed_count = match fixed_scope {
        FixedAmountScope::PerOrder => 1,
        FixedAmountScope::PerLineItem => {
            u64::try_from(items.line_count()).map_err(|_err| AmountError::Overflow)?
        }
        FixedAmountScope::PerUnit => quantity,
    };

    let percent = percentage_from_points(extra.percent);
    let amount = plus(
        percent_of_minor(&percent, subtotal)?,
        times(extra.fixed.to_minor_units(), fixed_count)?,
    )?;

    Ok(StrategyOutcome {
        discount_minor: amount.clamp(0, subtotal.max(0)),
        quantity_discounted: quantity,
        consumed: items
            .lines()
            .iter()
            .map(|line| (line.line_idx, line.available))
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rusty_money::{Money, iso::GBP};
    use testresult::TestResult;

    use crate::{
        filters::{Filter, OrderView},
        items::LineItem,
        products::ProductSnapshot,
        tags::TagSet,
    };

    use super::*;

    fn cart() -> Vec<LineItem<'static>> {
        [(3, "regular"), (2, "regular"), (5, "other")]
            .into_iter()
            .enumerate()
            .map(|(idx, (qty, tag))| {
                LineItem::new(
                    format!("line_{idx}"),
                    qty,
                    ProductSnapshot::new(format!("prod_{idx}"), "item", Money::from_minor(100, GBP))
                        .with_tags(TagSet::from_strs(&[tag])),
                )
            })
            .collect()
    }

    fn eligible(cart: &[LineItem<'static>]) -> Result<EligibleUnits, crate::filters::FilterError> {
        let order = OrderView {
            lines: cart,
            remaining: &[3, 2, 5],
            subtotal_minor: 1_000,
            quantity_total: 10,
            placed_at: None,
            customer_id: None,
        };

        EligibleUnits::matching(&[Filter::InTags(TagSet::from_strs(&["regular"]))], &order)
    }

    fn extra(percent: i64, fixed: i64) -> RegularExtra<'static> {
        RegularExtra {
            percent: Decimal::from(percent),
            fixed: Money::from_minor(fixed, GBP),
        }
    }

    #[test]
    fn percentage_of_eligible_subtotal() -> TestResult {
        let cart = cart();
        let outcome = apply(&extra(10, 0), &eligible(&cart)?, FixedAmountScope::PerOrder)?;

        assert_eq!(outcome.discount_minor, 50);
        assert_eq!(outcome.quantity_discounted, 5);
        assert_eq!(outcome.consumed.into_vec(), vec![(0, 3), (1, 2)]);

        Ok(())
    }

    #[test]
    fn fixed_amount_scales_with_scope() -> TestResult {
        let cart = cart();
        let items = eligible(&cart)?;
        let fixed = extra(0, 20);

        assert_eq!(apply(&fixed, &items, FixedAmountScope::PerOrder)?.discount_minor, 20);
        assert_eq!(apply(&fixed, &items, FixedAmountScope::PerLineItem)?.discount_minor, 40);
        assert_eq!(apply(&fixed, &items, FixedAmountScope::PerUnit)?.discount_minor, 100);

        Ok(())
    }

    #[test]
    fn discount_is_capped_at_eligible_subtotal() -> TestResult {
        let cart = cart();
        let outcome = apply(&extra(50, 1_000), &eligible(&cart)?, FixedAmountScope::PerOrder)?;

        assert_eq!(outcome.discount_minor, 500);

        Ok(())
    }
}
