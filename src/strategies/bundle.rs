//! Bundle discounts

use smallvec::SmallVec;

use crate::{
    config::UnitSelection,
    discounts::{
        BundleExtra,
        amounts::{AmountError, capped_discount, percentage_from_points, plus, times},
    },
    eligibility::EligibleUnits,
    filters::OrderView,
    strategies::{Role, StrategyError, StrategyOutcome, UnitPool, draw_order},
};

/// Form bundles of one unit per slot and discount each bundle instance.
///
/// A non-recursive bundle forms at most one instance.
///
/// # Errors
///
/// Returns a [`StrategyError`] if the arithmetic overflows.
pub fn apply(
    extra: &BundleExtra<'_>,
    slots: &[EligibleUnits],
    order: &OrderView<'_, '_>,
    selection: UnitSelection,
) -> Result<StrategyOutcome, StrategyError> {
    let percent = percentage_from_points(extra.percent);
    let fixed = extra.fixed.to_minor_units();
    let slot_lines: SmallVec<[_; 4]> = slots
        .iter()
        .map(|slot| draw_order(slot, selection))
        .collect();

    let mut roles: SmallVec<[Role<'_>; 4]> =
        slot_lines.iter().map(|lines| Role::new(lines, 1)).collect();
    let mut pool = UnitPool::new(order);
    let mut discount_minor = 0_i64;
    let mut instances = 0_u64;

    while extra.recursive || instances == 0 {
        let Some(instance) = pool.draw(&mut roles)? else {
            break;
        };

        let mut count = 1_u64;

        if extra.recursive {
            count += u64::from(pool.repeat_unchanged(&instance));
        }

        let instance_discount = capped_discount(instance.total_price()?, &percent, fixed)?;

        discount_minor = plus(discount_minor, times(instance_discount, count)?)?;
        instances += count;
    }

    let slot_count = u64::try_from(slots.len()).map_err(|_err| AmountError::Overflow)?;

    Ok(StrategyOutcome {
        discount_minor,
        quantity_discounted: instances * slot_count,
        consumed: pool.into_consumed(),
    })
}
