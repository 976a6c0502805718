//! Catalog
//!
//! Splits a discount catalog into the automatic and manual lists a pricing call expects.

use crate::discounts::{Discount, DiscountApplication};

/// Discounts selected for one pricing call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiscountSelection<'a> {
    /// Active automatic discounts
    pub auto: Vec<Discount<'a>>,

    /// Active manual discounts whose code was supplied
    pub manual: Vec<Discount<'a>>,
}

/// Keep active discounts, routing automatic ones to `auto` and manual ones whose handle matches
/// a coupon code, ignoring ASCII case, to `manual`. Catalog order is preserved.
pub fn partition_discounts<'a, S: AsRef<str>>(
    catalog: &[Discount<'a>],
    coupons: &[S],
) -> DiscountSelection<'a> {
    let mut selection = DiscountSelection::default();

    for discount in catalog.iter().filter(|discount| discount.is_active()) {
        match discount.application() {
            DiscountApplication::Auto => selection.auto.push(discount.clone()),
            DiscountApplication::Manual => {
                let redeemed = coupons
                    .iter()
                    .any(|code| code.as_ref().trim().eq_ignore_ascii_case(discount.handle()));

                if redeemed {
                    selection.manual.push(discount.clone());
                }
            }
        }
    }

    selection
}
