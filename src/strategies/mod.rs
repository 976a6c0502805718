//! Discount Strategies
//!
//! One algorithm per discount kind. Each computes the discount for the current step and the
//! units it consumes, without touching the running state.

use smallvec::SmallVec;

use crate::{
    config::{EngineConfig, UnitSelection},
    discounts::{
        Discount, DiscountDetails, DiscountIssue,
        amounts::{AmountError, plus, times},
    },
    eligibility::{EligibleLine, EligibleUnits, Eligibility},
    filters::OrderView,
};

pub mod bulk;
pub mod bundle;
pub mod buy_x_get_y;
pub mod order;
pub mod regular;

/// Units consumed on one line item.
pub type Consumption = SmallVec<[(usize, u32); 8]>;

/// Errors raised while running a strategy.
#[derive(Debug, thiserror::Error)]
pub enum StrategyError {
    /// A parameter could not be used.
    #[error(transparent)]
    Parameter(#[from] DiscountIssue),

    /// Arithmetic failed.
    #[error(transparent)]
    Amount(#[from] AmountError),

    /// The eligibility shape does not belong to the discount kind.
    #[error("eligibility does not match discount kind")]
    EligibilityMismatch,
}

/// Result of running one strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrategyOutcome {
    /// Discount in minor units
    pub discount_minor: i64,

    /// Units counted as discounted
    pub quantity_discounted: u64,

    /// Units consumed per line index, sorted by line index
    pub consumed: Consumption,
}

/// Run the strategy for `discount` against resolved eligibility.
///
/// # Errors
///
/// Returns a [`StrategyError`] if a parameter or the arithmetic fails.
pub fn run(
    discount: &Discount<'_>,
    eligibility: &Eligibility,
    order: &OrderView<'_, '_>,
    config: &EngineConfig,
) -> Result<StrategyOutcome, StrategyError> {
    match (discount.details(), eligibility) {
        (DiscountDetails::Regular(extra), Eligibility::Items(items)) => {
            regular::apply(extra, items, config.regular_fixed)
        }
        (DiscountDetails::Bulk(extra), Eligibility::Items(items)) => {
            bulk::apply(extra, items, order, config.unit_selection)
        }
        (DiscountDetails::Bundle(extra), Eligibility::Slots(slots)) => {
            bundle::apply(extra, slots, order, config.unit_selection)
        }
        (DiscountDetails::BuyXGetY(extra), Eligibility::TriggerReward { trigger, reward }) => {
            buy_x_get_y::apply(extra, trigger, reward, order, config.unit_selection)
        }
        (DiscountDetails::Order(extra), Eligibility::Order) => order::apply(extra, order),
        _ => Err(StrategyError::EligibilityMismatch),
    }
}

/// Eligible lines in draw order.
fn draw_order(units: &EligibleUnits, selection: UnitSelection) -> SmallVec<[EligibleLine; 8]> {
    let mut lines: SmallVec<[EligibleLine; 8]> = units.lines().iter().copied().collect();

    // `sort_by_key` is stable, so ties keep cart order.
    match selection {
        UnitSelection::ListOrder => {}
        UnitSelection::CheapestFirst => lines.sort_by_key(|line| line.unit_price_minor),
        UnitSelection::MostExpensiveFirst => {
            lines.sort_by_key(|line| std::cmp::Reverse(line.unit_price_minor));
        }
    }

    lines
}

/// One role of a repeat: `count` units drawn from `lines` in order.
#[derive(Debug, Clone, Copy)]
struct Role<'l> {
    lines: &'l [EligibleLine],
    count: u32,

    /// Lines before this position are exhausted
    cursor: usize,
}

impl<'l> Role<'l> {
    fn new(lines: &'l [EligibleLine], count: u32) -> Self {
        Self {
            lines,
            count,
            cursor: 0,
        }
    }
}

/// Units taken by one repeat of a draw.
#[derive(Debug, Clone, Default)]
struct Repeat {
    /// Summed unit price per role
    prices: SmallVec<[i64; 4]>,

    /// Units taken per line index, sorted by line index
    taken: Consumption,

    /// Whether every role was served by a single line
    single_line: bool,
}

impl Repeat {
    fn price(&self, role: usize) -> i64 {
        self.prices.get(role).copied().unwrap_or_default()
    }

    fn total_price(&self) -> Result<i64, AmountError> {
        self.prices
            .iter()
            .try_fold(0_i64, |total, price| plus(total, *price))
    }
}

/// Undiscounted units shared by every role of one discount step.
///
/// Roles may overlap (bundle slots, trigger and reward sets), so a unit drawn for one role is
/// no longer available to another.
#[derive(Debug)]
struct UnitPool {
    remaining: SmallVec<[u32; 16]>,
    consumed: Consumption,
}

impl UnitPool {
    fn new(order: &OrderView<'_, '_>) -> Self {
        Self {
            remaining: order.remaining.iter().copied().collect(),
            consumed: SmallVec::new(),
        }
    }

    fn available(&self, line_idx: usize) -> u32 {
        self.remaining.get(line_idx).copied().unwrap_or(0)
    }

    /// Draw one repeat, taking each role's units in turn.
    ///
    /// Nothing is drawn unless every role gets its full count.
    fn draw(&mut self, roles: &mut [Role<'_>]) -> Result<Option<Repeat>, AmountError> {
        if roles.is_empty() {
            return Ok(None);
        }

        let mut repeat = Repeat {
            single_line: true,
            ..Repeat::default()
        };
        let mut cursors: SmallVec<[usize; 4]> = SmallVec::new();

        for role in roles.iter() {
            let Some((price_minor, cursor)) = self.take(role, &mut repeat)? else {
                self.restore(&repeat.taken);
                return Ok(None);
            };

            repeat.prices.push(price_minor);
            cursors.push(cursor);
        }

        for (role, cursor) in roles.iter_mut().zip(cursors) {
            role.cursor = cursor;
        }

        for &(line_idx, units) in &repeat.taken {
            add_units(&mut self.consumed, line_idx, units);
        }

        Ok(Some(repeat))
    }

    /// Take `role.count` units, returning their summed price and the role's next cursor.
    ///
    /// A short draw returns `None` with its partial take left in `repeat.taken`.
    fn take(
        &mut self,
        role: &Role<'_>,
        repeat: &mut Repeat,
    ) -> Result<Option<(i64, usize)>, AmountError> {
        let mut needed = role.count;
        let mut price_minor = 0_i64;
        let mut cursor = role.cursor;
        let mut lines_used = 0_u32;

        for line in role.lines.iter().skip(role.cursor) {
            if needed == 0 {
                break;
            }

            let Some(left) = self.remaining.get_mut(line.line_idx) else {
                cursor += 1;
                continue;
            };

            let taken = needed.min(*left);

            if taken > 0 {
                *left -= taken;
                needed -= taken;
                lines_used += 1;

                price_minor = plus(price_minor, times(line.unit_price_minor, u64::from(taken))?)?;
                add_units(&mut repeat.taken, line.line_idx, taken);
            }

            if *left == 0 {
                cursor += 1;
            }
        }

        if needed > 0 {
            return Ok(None);
        }

        repeat.single_line &= lines_used == 1;

        Ok(Some((price_minor, cursor)))
    }

    fn restore(&mut self, taken: &Consumption) {
        for &(line_idx, units) in taken {
            if let Some(left) = self.remaining.get_mut(line_idx) {
                *left += units;
            }
        }
    }

    /// Take `repeat` again as many times as it fits unchanged, returning how many times.
    ///
    /// A repeat served by one line per role takes the same units at the same price on every
    /// pass, until one of those lines runs short.
    fn repeat_unchanged(&mut self, repeat: &Repeat) -> u32 {
        if !repeat.single_line {
            return 0;
        }

        let Some(extra) = repeat
            .taken
            .iter()
            .map(|&(line_idx, units)| self.available(line_idx) / units)
            .min()
        else {
            return 0;
        };

        if extra == 0 {
            return 0;
        }

        for &(line_idx, units) in &repeat.taken {
            let units = units * extra;

            if let Some(left) = self.remaining.get_mut(line_idx) {
                *left -= units;
            }

            add_units(&mut self.consumed, line_idx, units);
        }

        extra
    }

    fn into_consumed(self) -> Consumption {
        self.consumed
    }
}

/// Add `units` to the entry for `line_idx`, keeping `consumption` sorted by line index.
fn add_units(consumption: &mut Consumption, line_idx: usize, units: u32) {
    match consumption.binary_search_by_key(&line_idx, |(idx, _)| *idx) {
        Ok(pos) => {
            if let Some((_, total)) = consumption.get_mut(pos) {
                *total += units;
            }
        }
        Err(pos) => consumption.insert(pos, (line_idx, units)),
    }
}
