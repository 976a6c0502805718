//! Eligibility
//!
//! Resolves which undiscounted units a discount may draw from at the current step.

use smallvec::SmallVec;

use crate::{
    discounts::{Discount, DiscountDetails},
    filters::{
        Filter, FilterError, OrderView,
        evaluation::{all_match_order, all_match_product},
    },
};

/// One line item's contribution to an eligible set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EligibleLine {
    /// Index into the cart's line items
    pub line_idx: usize,

    /// Undiscounted units left on the line
    pub available: u32,

    /// Unit price in minor units
    pub unit_price_minor: i64,
}

/// Eligible lines in cart order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EligibleUnits {
    lines: SmallVec<[EligibleLine; 8]>,
}

impl EligibleUnits {
    /// Collect the open lines whose product matches every filter.
    ///
    /// # Errors
    ///
    /// Returns a [`FilterError`] if a filter cannot be evaluated.
    pub fn matching(filters: &[Filter], order: &OrderView<'_, '_>) -> Result<Self, FilterError> {
        let mut lines = SmallVec::new();

        for (line_idx, product, available) in order.open_products() {
            if all_match_product(filters, product, order)? {
                lines.push(EligibleLine {
                    line_idx,
                    available,
                    unit_price_minor: product.price.to_minor_units(),
                });
            }
        }

        Ok(Self { lines })
    }

    /// Eligible lines
    pub fn lines(&self) -> &[EligibleLine] {
        &self.lines
    }

    /// Number of eligible lines
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Total eligible units
    pub fn quantity(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.available)).sum()
    }

    /// Whether nothing is eligible
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// What a discount may draw from, shaped by its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    /// Regular and bulk discounts: one set selected by all filters
    Items(EligibleUnits),

    /// Bundle discounts: one set per product filter
    Slots(SmallVec<[EligibleUnits; 4]>),

    /// Buy-X-get-Y discounts
    TriggerReward {
        /// Units that qualify as the purchase
        trigger: EligibleUnits,

        /// Units that qualify for the reward
        reward: EligibleUnits,
    },

    /// Order discounts: the order gate passed
    Order,
}

/// Resolve the eligible units of `discount` against the current order state.
///
/// Returns `Ok(None)` when the discount is out of scope: nothing eligible, an empty bundle
/// slot, an empty trigger or reward set, or a failing order gate.
///
/// # Errors
///
/// Returns a [`FilterError`] if a filter cannot be evaluated.
pub fn resolve(
    discount: &Discount<'_>,
    order: &OrderView<'_, '_>,
) -> Result<Option<Eligibility>, FilterError> {
    let filters = discount.filters();

    let eligibility = match discount.details() {
        DiscountDetails::Regular(_) | DiscountDetails::Bulk(_) => {
            let items = EligibleUnits::matching(filters, order)?;

            (!items.is_empty()).then_some(Eligibility::Items(items))
        }
        DiscountDetails::Bundle(_) => {
            let (gates, slot_filters): (Vec<&Filter>, Vec<&Filter>) =
                filters.iter().partition(|filter| filter.is_order_level());

            for gate in gates {
                if !gate.matches_order(order)? {
                    return Ok(None);
                }
            }

            let mut slots = SmallVec::new();

            for filter in slot_filters {
                let slot = EligibleUnits::matching(std::slice::from_ref(filter), order)?;

                if slot.is_empty() {
                    return Ok(None);
                }

                slots.push(slot);
            }

            (!slots.is_empty()).then_some(Eligibility::Slots(slots))
        }
        DiscountDetails::BuyXGetY(extra) => {
            let trigger = EligibleUnits::matching(filters, order)?;
            let reward = EligibleUnits::matching(&extra.filters_y, order)?;

            (!trigger.is_empty() && !reward.is_empty())
                .then_some(Eligibility::TriggerReward { trigger, reward })
        }
        DiscountDetails::Order(_) => {
            all_match_order(filters, order)?.then_some(Eligibility::Order)
        }
    };

    Ok(eligibility)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rusty_money::{Money, iso::GBP};
    use testresult::TestResult;

    use crate::{
        discounts::{BundleExtra, BuyXGetYExtra, OrderExtra, RegularExtra},
        filters::ValueRange,
        items::LineItem,
        products::ProductSnapshot,
        tags::TagSet,
    };

    use super::*;

    fn line(id: &str, qty: u32, handle: &str, tags: &[&str]) -> LineItem<'static> {
        LineItem::new(
            id,
            qty,
            ProductSnapshot::new(format!("prod_{id}"), handle, Money::from_minor(100, GBP))
                .with_tags(TagSet::from_strs(tags)),
        )
    }

    fn cart() -> Vec<LineItem<'static>> {
        vec![
            line("1", 3, "robot-leg", &["leg"]),
            line("2", 2, "robot-arm", &["arm"]),
            line("3", 5, "robot-head", &[]),
        ]
    }

    fn view<'v>(lines: &'v [LineItem<'static>], remaining: &'v [u32]) -> OrderView<'v, 'static> {
        OrderView {
            lines,
            remaining,
            subtotal_minor: 1_000,
            quantity_total: 10,
            placed_at: None,
            customer_id: None,
        }
    }

    fn regular() -> Discount<'static> {
        Discount::new(
            "regular",
            DiscountDetails::Regular(RegularExtra {
                percent: Decimal::TEN,
                fixed: Money::from_minor(0, GBP),
            }),
        )
    }

    fn bundle() -> Discount<'static> {
        Discount::new(
            "bundle",
            DiscountDetails::Bundle(BundleExtra {
                percent: Decimal::from(50),
                fixed: Money::from_minor(0, GBP),
                recursive: false,
            }),
        )
        .with_filters([
            Filter::InTags(TagSet::from_strs(&["leg"])),
            Filter::InTags(TagSet::from_strs(&["arm"])),
        ])
    }

    #[test]
    fn items_require_every_filter() -> TestResult {
        let lines = cart();
        let remaining = [3, 2, 5];
        let discount = regular().with_filters([
            Filter::InTags(TagSet::from_strs(&["leg", "arm"])),
            Filter::NotInHandles(TagSet::from_strs(&["robot-arm"])),
        ]);

        let Some(Eligibility::Items(items)) = resolve(&discount, &view(&lines, &remaining))? else {
            return Err("expected eligible items".into());
        };

        assert_eq!(items.line_count(), 1);
        assert_eq!(items.quantity(), 3);

        Ok(())
    }

    #[test]
    fn consumed_lines_do_not_participate() -> TestResult {
        let lines = cart();
        let remaining = [0, 2, 5];
        let discount = regular().with_filter(Filter::InTags(TagSet::from_strs(&["leg"])));

        assert_eq!(resolve(&discount, &view(&lines, &remaining))?, None);

        Ok(())
    }

    #[test]
    fn order_level_filter_gates_item_discounts() -> TestResult {
        let lines = cart();
        let remaining = [3, 2, 5];
        let discount = regular().with_filters([
            Filter::All,
            Filter::SubtotalInRange(ValueRange::at_least(2_000)),
        ]);

        assert_eq!(resolve(&discount, &view(&lines, &remaining))?, None);

        Ok(())
    }

    #[test]
    fn bundle_has_one_slot_per_product_filter() -> TestResult {
        let lines = cart();
        let remaining = [3, 2, 5];
        let discount = bundle().with_filter(Filter::ItemsCountInRange(ValueRange::at_least(1)));

        let Some(Eligibility::Slots(slots)) = resolve(&discount, &view(&lines, &remaining))? else {
            return Err("expected bundle slots".into());
        };

        assert_eq!(slots.len(), 2);
        assert_eq!(slots.iter().map(EligibleUnits::quantity).collect::<Vec<_>>(), vec![3, 2]);

        Ok(())
    }

    #[test]
    fn bundle_with_empty_slot_is_out_of_scope() -> TestResult {
        let lines = cart();
        let remaining = [3, 0, 5];

        assert_eq!(resolve(&bundle(), &view(&lines, &remaining))?, None);

        Ok(())
    }

    #[test]
    fn buy_x_get_y_needs_trigger_and_reward() -> TestResult {
        let lines = cart();
        let discount = Discount::new(
            "b2g1",
            DiscountDetails::BuyXGetY(BuyXGetYExtra {
                qty_x: 2,
                qty_y: 1,
                percent: Decimal::from(50),
                fixed: Money::from_minor(0, GBP),
                recursive: false,
                filters_y: vec![Filter::InTags(TagSet::from_strs(&["arm"]))],
            }),
        )
        .with_filter(Filter::InTags(TagSet::from_strs(&["leg"])));

        let Some(Eligibility::TriggerReward { trigger, reward }) =
            resolve(&discount, &view(&lines, &[3, 2, 5]))?
        else {
            return Err("expected trigger and reward".into());
        };

        assert_eq!((trigger.quantity(), reward.quantity()), (3, 2));
        assert_eq!(resolve(&discount, &view(&lines, &[3, 0, 5]))?, None);

        Ok(())
    }

    #[test]
    fn order_discount_requires_all_filters() -> TestResult {
        let lines = cart();
        let remaining = [3, 2, 5];
        let order = Discount::new(
            "order",
            DiscountDetails::Order(OrderExtra {
                percent: Decimal::TEN,
                fixed: Money::from_minor(0, GBP),
            }),
        );

        let gated = order
            .clone()
            .with_filter(Filter::SubtotalInRange(ValueRange::at_least(300)));
        let closed = order.with_filter(Filter::SubtotalInRange(ValueRange::at_most(300)));

        assert_eq!(resolve(&gated, &view(&lines, &remaining))?, Some(Eligibility::Order));
        assert_eq!(resolve(&closed, &view(&lines, &remaining))?, None);

        Ok(())
    }
}
