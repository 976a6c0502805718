//! Stacking
//!
//! Applies discounts one after another against the evolving cart state. Automatic discounts go
//! first, then manual ones, each group in ascending priority with ties in input order.

use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};
use tracing::{debug, trace, warn};

use crate::{
    config::EngineConfig,
    discounts::{
        Discount, DiscountApplication, DiscountError, DiscountIssue,
        amounts::{AmountError, minus, plus},
    },
    eligibility::{self, Eligibility},
    evo::{EvoEntry, EvoLine},
    filters::OrderView,
    items::LineItem,
    strategies::{self, StrategyError, StrategyOutcome},
};

/// A discount scheduled for application, tagged with the list it came from.
#[derive(Debug, Clone, Copy)]
pub struct StackedDiscount<'d, 'a> {
    /// The discount
    pub discount: &'d Discount<'a>,

    /// Whether it came from the automatic or the manual list
    pub source: DiscountApplication,
}

/// Order `auto` then `manual`, each sorted by ascending priority. The sort is stable.
pub fn stacking_order<'d, 'a>(
    auto: &'d [Discount<'a>],
    manual: &'d [Discount<'a>],
) -> Vec<StackedDiscount<'d, 'a>> {
    let by_priority = |discounts: &'d [Discount<'a>], source| {
        let mut stacked: Vec<_> = discounts
            .iter()
            .map(|discount| StackedDiscount { discount, source })
            .collect();

        stacked.sort_by_key(|entry| entry.discount.priority());
        stacked
    };

    let mut ordered = by_priority(auto, DiscountApplication::Auto);
    ordered.extend(by_priority(manual, DiscountApplication::Manual));
    ordered
}

/// Inputs fixed for the whole pricing call.
#[derive(Debug, Clone, Copy)]
pub struct StackContext<'c, 'a> {
    /// Cart line items
    pub lines: &'c [LineItem<'a>],

    /// Cart currency
    pub currency: &'a Currency,

    /// Shipping price in minor units
    pub shipping_minor: i64,

    /// Total units in the cart
    pub quantity_total: u64,

    /// When the order was placed
    pub placed_at: Option<Timestamp>,

    /// Customer placing the order
    pub customer_id: Option<&'c str>,

    /// Engine settings
    pub config: &'c EngineConfig,
}

/// Running state threaded through the stacking fold.
#[derive(Debug, Clone, PartialEq)]
pub struct StackState<'a> {
    remaining: Vec<u32>,
    subtotal_minor: i64,
    evo: Vec<EvoEntry<'a>>,
    errors: Vec<DiscountError>,
}

impl<'a> StackState<'a> {
    /// Seed the state with every unit undiscounted and the baseline evo entry.
    ///
    /// # Errors
    ///
    /// Returns an [`AmountError`] if the subtotal plus shipping overflows.
    pub fn seed(ctx: &StackContext<'_, 'a>, subtotal_minor: i64) -> Result<Self, AmountError> {
        let remaining: Vec<u32> = ctx.lines.iter().map(LineItem::qty).collect();

        let baseline = EvoEntry::baseline(
            ctx.quantity_total,
            Money::from_minor(subtotal_minor, ctx.currency),
            Money::from_minor(plus(subtotal_minor, ctx.shipping_minor)?, ctx.currency),
        );

        Ok(Self {
            remaining,
            subtotal_minor,
            evo: vec![baseline],
            errors: Vec::new(),
        })
    }

    /// Undiscounted units left per line item
    pub fn remaining(&self) -> &[u32] {
        &self.remaining
    }

    /// Running subtotal in minor units
    pub fn subtotal_minor(&self) -> i64 {
        self.subtotal_minor
    }

    /// Audit trail so far
    pub fn evo(&self) -> &[EvoEntry<'a>] {
        &self.evo
    }

    /// Diagnostics so far
    pub fn errors(&self) -> &[DiscountError] {
        &self.errors
    }

    /// Split into the audit trail and the diagnostics.
    pub fn into_parts(self) -> (Vec<EvoEntry<'a>>, Vec<DiscountError>) {
        (self.evo, self.errors)
    }

    fn view<'v>(&'v self, ctx: &StackContext<'v, 'a>) -> OrderView<'v, 'a> {
        OrderView {
            lines: ctx.lines,
            remaining: &self.remaining,
            subtotal_minor: self.subtotal_minor,
            quantity_total: ctx.quantity_total,
            placed_at: ctx.placed_at,
            customer_id: ctx.customer_id,
        }
    }

    /// Apply one discount against the current state.
    ///
    /// A discount that cannot be applied is recorded as a [`DiscountError`] and leaves the
    /// state otherwise untouched. An out-of-scope discount leaves no trace in the evo trail.
    #[must_use]
    pub fn apply(self, ctx: &StackContext<'_, 'a>, stacked: StackedDiscount<'_, '_>) -> Self {
        let discount = stacked.discount;

        if let Err(issue) = discount.validate(ctx.currency) {
            return self.reject(discount, issue);
        }

        let outcome = {
            let order = self.view(ctx);

            let eligibility = match eligibility::resolve(discount, &order) {
                Ok(Some(eligibility)) => eligibility,
                Ok(None) => {
                    trace!(discount = discount.handle(), "discount out of scope");
                    return self;
                }
                Err(err) => return self.reject(discount, err.into()),
            };

            run_strategy(discount, &eligibility, &order, ctx.config)
        };

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(issue) => return self.reject(discount, issue),
        };

        let discount_minor = outcome.discount_minor.clamp(0, self.subtotal_minor.max(0));
        let totals = minus(self.subtotal_minor, discount_minor).and_then(|subtotal_minor| {
            let total_minor = plus(subtotal_minor, ctx.shipping_minor)?;

            Ok((subtotal_minor, total_minor))
        });

        match totals {
            Ok((subtotal_minor, total_minor)) => self.commit(
                ctx,
                stacked,
                outcome,
                Step {
                    discount_minor,
                    subtotal_minor,
                    total_minor,
                },
            ),
            Err(err) => self.reject(discount, DiscountIssue::Amount(err.to_string())),
        }
    }

    fn reject(mut self, discount: &Discount<'_>, issue: DiscountIssue) -> Self {
        warn!(
            discount = discount.handle(),
            error = %issue,
            "discount skipped"
        );

        self.errors.push(DiscountError::new(discount, issue));
        self
    }

    fn commit(
        mut self,
        ctx: &StackContext<'_, 'a>,
        stacked: StackedDiscount<'_, '_>,
        outcome: StrategyOutcome,
        step: Step,
    ) -> Self {
        let discount = stacked.discount;

        for (line_idx, units) in &outcome.consumed {
            if let Some(left) = self.remaining.get_mut(*line_idx) {
                *left = left.saturating_sub(*units);
            }
        }

        self.subtotal_minor = step.subtotal_minor;

        let line_items = ctx.config.record_line_items.then(|| {
            outcome
                .consumed
                .iter()
                .filter_map(|(line_idx, units)| {
                    ctx.lines.get(*line_idx).map(|line| EvoLine {
                        line_item_id: line.id().to_string(),
                        quantity: *units,
                    })
                })
                .collect()
        });

        debug!(
            discount = discount.handle(),
            kind = %discount.meta(),
            amount_minor = step.discount_minor,
            units = outcome.quantity_discounted,
            "discount applied"
        );

        self.evo.push(EvoEntry {
            discount: Some(discount.handle().to_string()),
            discount_code: (stacked.source == DiscountApplication::Manual)
                .then(|| discount.handle().to_string()),
            discount_meta: Some(discount.meta()),
            total_discount: Money::from_minor(step.discount_minor, ctx.currency),
            quantity_undiscounted: self.remaining.iter().map(|units| u64::from(*units)).sum(),
            quantity_discounted: outcome.quantity_discounted,
            subtotal: Money::from_minor(self.subtotal_minor, ctx.currency),
            total: Money::from_minor(step.total_minor, ctx.currency),
            line_items,
        });

        self
    }
}

/// Checked amounts for one applied discount.
#[derive(Debug, Clone, Copy)]
struct Step {
    discount_minor: i64,
    subtotal_minor: i64,
    total_minor: i64,
}

fn run_strategy(
    discount: &Discount<'_>,
    eligibility: &Eligibility,
    order: &OrderView<'_, '_>,
    config: &EngineConfig,
) -> Result<StrategyOutcome, DiscountIssue> {
    strategies::run(discount, eligibility, order, config).map_err(|err| match err {
        StrategyError::Parameter(issue) => issue,
        StrategyError::Amount(source) => DiscountIssue::Amount(source.to_string()),
        StrategyError::EligibilityMismatch => DiscountIssue::InvalidParameter {
            field: "details",
            reason: "eligibility does not match discount kind".to_string(),
        },
    })
}

/// Apply every discount in stacking order, starting from `seed`.
pub fn apply_all<'a>(
    ctx: &StackContext<'_, 'a>,
    seed: StackState<'a>,
    auto: &[Discount<'_>],
    manual: &[Discount<'_>],
) -> StackState<'a> {
    stacking_order(auto, manual)
        .into_iter()
        .fold(seed, |state, stacked| state.apply(ctx, stacked))
}
