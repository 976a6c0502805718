//! Bulk discounts
//!
//! Eligible units are grouped `qty` at a time. Each complete group is discounted down to
//! `fixed × percent`, so `qty: 3, fixed: 1.00, percent: 100` reads "3 for 1.00".

use crate::{
    config::UnitSelection,
    discounts::{
        BulkExtra, unit_count,
        amounts::{minus, percent_of_minor, percentage_from_points, plus, times},
    },
    eligibility::EligibleUnits,
    filters::OrderView,
    strategies::{Role, StrategyError, StrategyOutcome, UnitPool, draw_order},
};

/// Discount complete groups of eligible units, all of them when recursive, otherwise the first.
///
/// # Errors
///
/// Returns a [`StrategyError`] if `qty` is not positive or the arithmetic overflows.
pub fn apply(
    extra: &BulkExtra<'_>,
    items: &EligibleUnits,
    order: &OrderView<'_, '_>,
    selection: UnitSelection,
) -> Result<StrategyOutcome, StrategyError> {
    let group_size = unit_count("qty", extra.qty)?;
    let group_target = percent_of_minor(
        &percentage_from_points(extra.percent),
        extra.fixed.to_minor_units(),
    )?;

    let lines = draw_order(items, selection);
    let mut roles = [Role::new(&lines, group_size)];
    let mut pool = UnitPool::new(order);
    let mut discount_minor = 0_i64;
    let mut groups = 0_u64;

    while extra.recursive || groups == 0 {
        let Some(group) = pool.draw(&mut roles)? else {
            break;
        };

        let mut count = 1_u64;

        if extra.recursive {
            count += u64::from(pool.repeat_unchanged(&group));
        }

        let group_discount = minus(group.total_price()?, group_target)?.max(0);

        discount_minor = plus(discount_minor, times(group_discount, count)?)?;
        groups += count;
    }

    Ok(StrategyOutcome {
        discount_minor,
        quantity_discounted: groups * u64::from(group_size),
        consumed: pool.into_consumed(),
    })
}
