//! Discounts
//!
//! Discount definitions as supplied by the discount catalog, and the per-discount diagnostics
//! recorded when a definition cannot be applied.

use std::fmt;

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use serde::Deserialize;
use thiserror::Error;

use crate::filters::{Filter, FilterError};

pub mod amounts;

/// How a discount enters a pricing call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountApplication {
    /// Applied whenever it is in scope
    #[default]
    Auto,

    /// Applied only when the customer supplies its code
    Manual,
}

/// The closed set of discount kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountMeta {
    /// Percentage and fixed amount off eligible items
    Regular,

    /// Discount per group of `qty` eligible units
    Bulk,

    /// One unit from every slot forms a bundle
    Bundle,

    /// Buy `qty_x` trigger units, get `qty_y` reward units discounted
    BuyXGetY,

    /// Discount on the order subtotal
    Order,
}

impl DiscountMeta {
    /// Wire name of the discount kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            DiscountMeta::Regular => "regular",
            DiscountMeta::Bulk => "bulk",
            DiscountMeta::Bundle => "bundle",
            DiscountMeta::BuyXGetY => "buy_x_get_y",
            DiscountMeta::Order => "order",
        }
    }
}

impl fmt::Display for DiscountMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of a regular discount.
#[derive(Debug, Clone, PartialEq)]
pub struct RegularExtra<'a> {
    /// Percentage points off the eligible subtotal
    pub percent: Decimal,

    /// Fixed amount off
    pub fixed: Money<'a, Currency>,
}

/// Parameters of a bulk discount.
#[derive(Debug, Clone, PartialEq)]
pub struct BulkExtra<'a> {
    /// Group size
    pub qty: i64,

    /// Percentage points applied to `fixed`
    pub percent: Decimal,

    /// Target amount for a group
    pub fixed: Money<'a, Currency>,

    /// Apply to every complete group rather than the first
    pub recursive: bool,
}

/// Parameters of a bundle discount. Slots are the discount's product filters.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleExtra<'a> {
    /// Percentage points off each bundle instance
    pub percent: Decimal,

    /// Fixed amount off each bundle instance
    pub fixed: Money<'a, Currency>,

    /// Form as many bundles as stock allows rather than one
    pub recursive: bool,
}

/// Parameters of a buy-X-get-Y discount.
#[derive(Debug, Clone, PartialEq)]
pub struct BuyXGetYExtra<'a> {
    /// Trigger units required per repeat
    pub qty_x: i64,

    /// Reward units discounted per repeat
    pub qty_y: i64,

    /// Percentage points off the reward units
    pub percent: Decimal,

    /// Fixed amount off the reward units
    pub fixed: Money<'a, Currency>,

    /// Repeat as often as stock allows rather than once
    pub recursive: bool,

    /// Filters selecting the reward units
    pub filters_y: Vec<Filter>,
}

/// Parameters of an order discount.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderExtra<'a> {
    /// Percentage points off the running subtotal
    pub percent: Decimal,

    /// Fixed amount off
    pub fixed: Money<'a, Currency>,
}

/// Kind-specific discount parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscountDetails<'a> {
    /// Regular discount
    Regular(RegularExtra<'a>),

    /// Bulk discount
    Bulk(BulkExtra<'a>),

    /// Bundle discount
    Bundle(BundleExtra<'a>),

    /// Buy-X-get-Y discount
    BuyXGetY(BuyXGetYExtra<'a>),

    /// Order discount
    Order(OrderExtra<'a>),
}

impl<'a> DiscountDetails<'a> {
    /// The discount kind.
    pub fn meta(&self) -> DiscountMeta {
        match self {
            DiscountDetails::Regular(_) => DiscountMeta::Regular,
            DiscountDetails::Bulk(_) => DiscountMeta::Bulk,
            DiscountDetails::Bundle(_) => DiscountMeta::Bundle,
            DiscountDetails::BuyXGetY(_) => DiscountMeta::BuyXGetY,
            DiscountDetails::Order(_) => DiscountMeta::Order,
        }
    }

    fn percent_and_fixed(&self) -> (Decimal, &Money<'a, Currency>) {
        match self {
            DiscountDetails::Regular(extra) => (extra.percent, &extra.fixed),
            DiscountDetails::Bulk(extra) => (extra.percent, &extra.fixed),
            DiscountDetails::Bundle(extra) => (extra.percent, &extra.fixed),
            DiscountDetails::BuyXGetY(extra) => (extra.percent, &extra.fixed),
            DiscountDetails::Order(extra) => (extra.percent, &extra.fixed),
        }
    }
}

/// Discount parameters together with the filters selecting what it applies to.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscountInfo<'a> {
    /// Kind-specific parameters
    pub details: DiscountDetails<'a>,

    /// Product and order filters
    pub filters: Vec<Filter>,
}

/// A discount definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Discount<'a> {
    handle: String,
    active: bool,
    priority: i32,
    application: DiscountApplication,
    info: DiscountInfo<'a>,
}

impl<'a> Discount<'a> {
    /// Create an active, automatic discount with priority 0 and no filters.
    pub fn new(handle: impl Into<String>, details: DiscountDetails<'a>) -> Self {
        Self {
            handle: handle.into(),
            active: true,
            priority: 0,
            application: DiscountApplication::Auto,
            info: DiscountInfo {
                details,
                filters: Vec::new(),
            },
        }
    }

    /// Set the priority. Lower values apply first.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set how the discount is applied.
    #[must_use]
    pub fn with_application(mut self, application: DiscountApplication) -> Self {
        self.application = application;
        self
    }

    /// Add one filter.
    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.info.filters.push(filter);
        self
    }

    /// Add several filters.
    #[must_use]
    pub fn with_filters(mut self, filters: impl IntoIterator<Item = Filter>) -> Self {
        self.info.filters.extend(filters);
        self
    }

    /// Set the active flag.
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Returns the discount handle
    pub fn handle(&self) -> &str {
        &self.handle
    }

    /// Returns whether the discount is active
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns the priority
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Returns how the discount is applied
    pub fn application(&self) -> DiscountApplication {
        self.application
    }

    /// Returns the parameters and filters
    pub fn info(&self) -> &DiscountInfo<'a> {
        &self.info
    }

    /// Returns the kind-specific parameters
    pub fn details(&self) -> &DiscountDetails<'a> {
        &self.info.details
    }

    /// Returns the filters
    pub fn filters(&self) -> &[Filter] {
        &self.info.filters
    }

    /// Returns the discount kind
    pub fn meta(&self) -> DiscountMeta {
        self.info.details.meta()
    }

    /// Check that the definition can be applied to a cart priced in `currency`.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscountIssue`] describing the first problem found.
    pub fn validate(&self, currency: &Currency) -> Result<(), DiscountIssue> {
        for filter in &self.info.filters {
            filter.ensure_supported()?;
        }

        let (percent, fixed) = self.info.details.percent_and_fixed();

        if percent < Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
            return Err(DiscountIssue::InvalidParameter {
                field: "percent",
                reason: format!("{percent} is outside 0..=100"),
            });
        }

        if fixed.currency() != currency {
            return Err(DiscountIssue::CurrencyMismatch {
                expected: currency.iso_alpha_code,
                found: fixed.currency().iso_alpha_code,
            });
        }

        if fixed.to_minor_units() < 0 {
            return Err(DiscountIssue::InvalidParameter {
                field: "fixed",
                reason: format!("{fixed} is negative"),
            });
        }

        match &self.info.details {
            DiscountDetails::Bulk(extra) => {
                unit_count("qty", extra.qty)?;
            }
            DiscountDetails::Bundle(_) => {
                if !self.info.filters.iter().any(|filter| !filter.is_order_level()) {
                    return Err(DiscountIssue::InvalidParameter {
                        field: "filters",
                        reason: "a bundle needs at least one product filter".to_string(),
                    });
                }
            }
            DiscountDetails::BuyXGetY(extra) => {
                unit_count("qty_x", extra.qty_x)?;
                unit_count("qty_y", extra.qty_y)?;

                for filter in &extra.filters_y {
                    filter.ensure_supported()?;
                }
            }
            DiscountDetails::Regular(_) | DiscountDetails::Order(_) => {}
        }

        Ok(())
    }
}

/// Convert a configured unit count into a positive `u32`.
///
/// # Errors
///
/// Returns [`DiscountIssue::InvalidParameter`] if `value` is not positive or too large.
pub fn unit_count(field: &'static str, value: i64) -> Result<u32, DiscountIssue> {
    if value < 1 {
        return Err(DiscountIssue::InvalidParameter {
            field,
            reason: format!("{value} must be at least 1"),
        });
    }

    u32::try_from(value).map_err(|_err| DiscountIssue::InvalidParameter {
        field,
        reason: format!("{value} is too large"),
    })
}

/// Why a discount was skipped.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DiscountIssue {
    /// A filter is unknown or malformed.
    #[error("unsupported filter `{kind}`: {reason}")]
    UnsupportedFilter {
        /// Filter kind as received
        kind: String,

        /// Why the filter could not be used
        reason: String,
    },

    /// A parameter is out of range.
    #[error("invalid `{field}`: {reason}")]
    InvalidParameter {
        /// Parameter name
        field: &'static str,

        /// What is wrong with it
        reason: String,
    },

    /// The fixed amount is in a different currency than the cart.
    #[error("fixed amount is in {found}, cart is in {expected}")]
    CurrencyMismatch {
        /// Cart currency
        expected: &'static str,

        /// Discount currency
        found: &'static str,
    },

    /// Arithmetic failed while computing the discount.
    #[error("amount calculation failed: {0}")]
    Amount(String),
}

impl From<FilterError> for DiscountIssue {
    fn from(err: FilterError) -> Self {
        match err {
            FilterError::Unsupported { kind, reason } => {
                DiscountIssue::UnsupportedFilter { kind, reason }
            }
        }
    }
}

/// Diagnostic recorded when a discount is skipped.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("discount `{discount_code}` skipped: {issue}")]
pub struct DiscountError {
    /// Handle of the skipped discount
    pub discount_code: String,

    /// What went wrong
    pub issue: DiscountIssue,
}

impl DiscountError {
    /// Create a diagnostic for `discount`.
    pub fn new(discount: &Discount<'_>, issue: DiscountIssue) -> Self {
        Self {
            discount_code: discount.handle().to_string(),
            issue,
        }
    }

    /// Human readable message.
    pub fn message(&self) -> String {
        self.issue.to_string()
    }
}
