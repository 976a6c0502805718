//! Evo
//!
//! The audit trail of a pricing call. Entry 0 is the baseline; every later entry records one
//! applied discount in application order.

use rusty_money::{Money, iso::Currency};

use crate::discounts::DiscountMeta;

/// Units of one line item consumed by a step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvoLine {
    /// Line item id
    pub line_item_id: String,

    /// Units consumed
    pub quantity: u32,
}

/// One step of the audit trail.
#[derive(Debug, Clone, PartialEq)]
pub struct EvoEntry<'a> {
    /// Handle of the applied discount, `None` for the baseline
    pub discount: Option<String>,

    /// Coupon code, set for manual discounts only
    pub discount_code: Option<String>,

    /// Kind of the applied discount
    pub discount_meta: Option<DiscountMeta>,

    /// Discount taken by this step
    pub total_discount: Money<'a, Currency>,

    /// Units still undiscounted after this step
    pub quantity_undiscounted: u64,

    /// Units discounted by this step
    pub quantity_discounted: u64,

    /// Running subtotal after this step
    pub subtotal: Money<'a, Currency>,

    /// Running total after this step, shipping included
    pub total: Money<'a, Currency>,

    /// Units consumed per line item, when recorded
    pub line_items: Option<Vec<EvoLine>>,
}

impl<'a> EvoEntry<'a> {
    /// The baseline entry: nothing discounted yet.
    pub fn baseline(
        quantity_total: u64,
        subtotal: Money<'a, Currency>,
        total: Money<'a, Currency>,
    ) -> Self {
        Self {
            discount: None,
            discount_code: None,
            discount_meta: None,
            total_discount: Money::from_minor(0, subtotal.currency()),
            quantity_undiscounted: quantity_total,
            quantity_discounted: 0,
            subtotal,
            total,
            line_items: None,
        }
    }

    /// Whether this is the baseline entry.
    pub fn is_baseline(&self) -> bool {
        self.discount.is_none()
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::GBP;

    use super::*;

    #[test]
    fn baseline_has_no_discount() {
        let entry = EvoEntry::baseline(
            10,
            Money::from_minor(1_000, GBP),
            Money::from_minor(1_050, GBP),
        );

        assert!(entry.is_baseline());
        assert_eq!(entry.total_discount, Money::from_minor(0, GBP));
        assert_eq!(entry.quantity_undiscounted, 10);
        assert_eq!(entry.quantity_discounted, 0);
        assert_eq!(entry.total, Money::from_minor(1_050, GBP));
        assert!(entry.line_items.is_none());
    }
}
