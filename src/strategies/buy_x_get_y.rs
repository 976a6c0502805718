//! Buy X get Y discounts

use crate::{
    config::UnitSelection,
    discounts::{
        BuyXGetYExtra, unit_count,
        amounts::{capped_discount, percentage_from_points, plus, times},
    },
    eligibility::EligibleUnits,
    filters::OrderView,
    strategies::{Role, StrategyError, StrategyOutcome, UnitPool, draw_order},
};

/// Each repeat consumes `qty_x` trigger units at full price and discounts `qty_y` reward units.
///
/// Trigger units are drawn before reward units, so a unit in both sets serves one role only.
/// Non-recursive discounts repeat at most once.
///
/// # Errors
///
/// Returns a [`StrategyError`] if a quantity is not positive or the arithmetic overflows.
pub fn apply(
    extra: &BuyXGetYExtra<'_>,
    trigger: &EligibleUnits,
    reward: &EligibleUnits,
    order: &OrderView<'_, '_>,
    selection: UnitSelection,
) -> Result<StrategyOutcome, StrategyError> {
    let qty_x = unit_count("qty_x", extra.qty_x)?;
    let qty_y = unit_count("qty_y", extra.qty_y)?;
    let percent = percentage_from_points(extra.percent);
    let fixed = extra.fixed.to_minor_units();

    let trigger_lines = draw_order(trigger, selection);
    let reward_lines = draw_order(reward, selection);

    let mut roles = [
        Role::new(&trigger_lines, qty_x),
        Role::new(&reward_lines, qty_y),
    ];
    let mut pool = UnitPool::new(order);
    let mut discount_minor = 0_i64;
    let mut repeats = 0_u64;

    while extra.recursive || repeats == 0 {
        let Some(repeat) = pool.draw(&mut roles)? else {
            break;
        };

        let mut count = 1_u64;

        if extra.recursive {
            count += u64::from(pool.repeat_unchanged(&repeat));
        }

        let reward_discount = capped_discount(repeat.price(1), &percent, fixed)?;

        discount_minor = plus(discount_minor, times(reward_discount, count)?)?;
        repeats += count;
    }

    Ok(StrategyOutcome {
        discount_minor,
        quantity_discounted: repeats * (u64::from(qty_x) + u64::from(qty_y)),
        consumed: pool.into_consumed(),
    })
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rusty_money::{Money, iso::GBP};
    use testresult::TestResult;

    use crate::{
        discounts::DiscountIssue, filters::Filter, items::LineItem, products::ProductSnapshot,
        tags::TagSet,
    };

    use super::*;

    fn cart(legs: u32, arms: u32) -> Vec<LineItem<'static>> {
        let product = |handle: &str| {
            ProductSnapshot::new(format!("prod_{handle}"), handle, Money::from_minor(100, GBP))
        };

        vec![
            LineItem::new("line_legs", legs, product("robot-leg")),
            LineItem::new("line_arms", arms, product("robot-arm")),
        ]
    }

    fn extra(qty_x: i64, qty_y: i64, recursive: bool) -> BuyXGetYExtra<'static> {
        BuyXGetYExtra {
            qty_x,
            qty_y,
            percent: Decimal::from(50),
            fixed: Money::from_minor(0, GBP),
            recursive,
            filters_y: Vec::new(),
        }
    }

    fn run(
        extra: &BuyXGetYExtra<'_>,
        cart: &[LineItem<'static>],
        trigger: &[&str],
        reward: &[&str],
    ) -> Result<StrategyOutcome, StrategyError> {
        let remaining: Vec<u32> = cart.iter().map(LineItem::qty).collect();
        let order = OrderView {
            lines: cart,
            remaining: &remaining,
            subtotal_minor: 0,
            quantity_total: remaining.iter().map(|qty| u64::from(*qty)).sum(),
            placed_at: None,
            customer_id: None,
        };

        let units = |handles: &[&str]| {
            EligibleUnits::matching(&[Filter::InHandles(TagSet::from_strs(handles))], &order)
                .map_err(DiscountIssue::from)
        };

        apply(extra, &units(trigger)?, &units(reward)?, &order, UnitSelection::ListOrder)
    }

    #[test]
    fn buy_two_get_one_half_price_once() -> TestResult {
        let cart = cart(3, 2);
        let outcome = run(&extra(2, 1, false), &cart, &["robot-leg"], &["robot-arm"])?;

        assert_eq!(outcome.discount_minor, 50);
        assert_eq!(outcome.quantity_discounted, 3);
        assert_eq!(outcome.consumed.into_vec(), vec![(0, 2), (1, 1)]);

        Ok(())
    }

    #[test]
    fn recursive_repeats_while_both_sets_allow() -> TestResult {
        let cart = cart(3, 4);
        let outcome = run(&extra(1, 1, true), &cart, &["robot-leg"], &["robot-arm"])?;

        assert_eq!(outcome.discount_minor, 150);
        assert_eq!(outcome.quantity_discounted, 6);

        Ok(())
    }

    #[test]
    fn missing_reward_rolls_back_the_trigger() -> TestResult {
        let cart = cart(4, 1);
        let outcome = run(&extra(2, 1, true), &cart, &["robot-leg"], &["robot-arm"])?;

        assert_eq!(outcome.quantity_discounted, 3);
        assert_eq!(outcome.consumed.into_vec(), vec![(0, 2), (1, 1)]);

        Ok(())
    }

    #[test]
    fn shared_units_serve_one_role() -> TestResult {
        let cart = cart(3, 0);
        let outcome = run(&extra(1, 1, true), &cart, &["robot-leg"], &["robot-leg"])?;

        // Buy one leg, get one leg: the third leg has no partner.
        assert_eq!(outcome.discount_minor, 50);
        assert_eq!(outcome.quantity_discounted, 2);

        Ok(())
    }

    #[test]
    fn large_quantities_repeat_without_walking_every_unit() -> TestResult {
        let cart = cart(u32::MAX, u32::MAX);
        let outcome = run(&extra(1, 1, true), &cart, &["robot-leg"], &["robot-arm"])?;

        assert_eq!(outcome.quantity_discounted, u64::from(u32::MAX) * 2);
        assert_eq!(outcome.discount_minor, i64::from(u32::MAX) * 50);

        let shared = run(&extra(1, 1, true), &cart, &["robot-leg"], &["robot-leg"])?;

        // An odd leg count leaves one leg without a partner.
        assert_eq!(shared.quantity_discounted, u64::from(u32::MAX) - 1);
        assert_eq!(shared.consumed.into_vec(), vec![(0, u32::MAX - 1)]);

        Ok(())
    }

    #[test]
    fn not_enough_triggers_has_no_effect() -> TestResult {
        let cart = cart(1, 2);
        let outcome = run(&extra(2, 1, false), &cart, &["robot-leg"], &["robot-arm"])?;

        assert_eq!(outcome, StrategyOutcome::default());

        Ok(())
    }
}
