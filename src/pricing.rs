//! Pricing
//!
//! Seeds the running state from the cart, drives the stacking engine and folds the evo trail
//! into the final [`PricingData`].

use jiff::Timestamp;
use rustc_hash::FxHashSet;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;
use tracing::Span;

use crate::{
    config::EngineConfig,
    discounts::{
        Discount, DiscountError,
        amounts::{AmountError, minus, plus, times},
    },
    evo::EvoEntry,
    items::LineItem,
    stacking::{self, StackContext, StackState},
};

/// Errors that fail a whole pricing call.
#[derive(Debug, Error)]
pub enum PricingError {
    /// Neither line items, shipping nor an explicit currency were provided.
    #[error("no items provided; cannot determine currency")]
    NoItems,

    /// A line item has a zero quantity.
    #[error("line item `{0}` has zero quantity")]
    InvalidQuantity(String),

    /// A line item carries no product snapshot.
    #[error("line item `{0}` has no product data")]
    MissingProductData(String),

    /// A line item is priced in another currency.
    #[error("line item `{line_item}` is priced in {found}, expected {expected}")]
    CurrencyMismatch {
        /// Line item id
        line_item: String,

        /// Currency of the line item
        found: &'static str,

        /// Currency of the cart
        expected: &'static str,
    },

    /// The shipping method is priced in another currency.
    #[error("shipping is priced in {found}, expected {expected}")]
    ShippingCurrencyMismatch {
        /// Currency of the shipping method
        found: &'static str,

        /// Currency of the cart
        expected: &'static str,
    },

    /// Cart totals could not be computed.
    #[error(transparent)]
    Amount(#[from] AmountError),
}

/// The shipping method selected for the order.
#[derive(Debug, Clone, PartialEq)]
pub struct ShippingMethod<'a> {
    /// Shipping method id
    pub id: String,

    /// Display name
    pub name: String,

    /// Shipping price
    pub price: Money<'a, Currency>,
}

impl<'a> ShippingMethod<'a> {
    /// Create a shipping method.
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Money<'a, Currency>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            price,
        }
    }
}

/// Everything a pricing call reads.
#[derive(Debug, Clone, Copy)]
pub struct PricingRequest<'r, 'a> {
    line_items: &'r [LineItem<'a>],
    auto_discounts: &'r [Discount<'a>],
    manual_discounts: &'r [Discount<'a>],
    shipping_method: Option<&'r ShippingMethod<'a>>,
    customer_id: Option<&'r str>,
    placed_at: Option<Timestamp>,
    currency: Option<&'a Currency>,
}

impl<'r, 'a> PricingRequest<'r, 'a> {
    /// Create a request for `line_items` with no discounts.
    pub fn new(line_items: &'r [LineItem<'a>]) -> Self {
        Self {
            line_items,
            auto_discounts: &[],
            manual_discounts: &[],
            shipping_method: None,
            customer_id: None,
            placed_at: None,
            currency: None,
        }
    }

    /// Set the automatic discounts.
    #[must_use]
    pub fn with_auto_discounts(mut self, discounts: &'r [Discount<'a>]) -> Self {
        self.auto_discounts = discounts;
        self
    }

    /// Set the manual discounts whose codes were supplied.
    #[must_use]
    pub fn with_manual_discounts(mut self, discounts: &'r [Discount<'a>]) -> Self {
        self.manual_discounts = discounts;
        self
    }

    /// Set the shipping method.
    #[must_use]
    pub fn with_shipping_method(mut self, shipping_method: Option<&'r ShippingMethod<'a>>) -> Self {
        self.shipping_method = shipping_method;
        self
    }

    /// Set the customer.
    #[must_use]
    pub fn with_customer_id(mut self, customer_id: Option<&'r str>) -> Self {
        self.customer_id = customer_id;
        self
    }

    /// Set the order timestamp.
    #[must_use]
    pub fn with_placed_at(mut self, placed_at: Option<Timestamp>) -> Self {
        self.placed_at = placed_at;
        self
    }

    /// Fix the cart currency, needed only for an empty cart without shipping.
    #[must_use]
    pub fn with_currency(mut self, currency: &'a Currency) -> Self {
        self.currency = Some(currency);
        self
    }

    fn currency(&self) -> Result<&'a Currency, PricingError> {
        self.currency
            .or_else(|| {
                self.line_items
                    .iter()
                    .find_map(LineItem::data)
                    .map(|data| data.price.currency())
            })
            .or_else(|| self.shipping_method.map(|shipping| shipping.price.currency()))
            .ok_or(PricingError::NoItems)
    }
}

/// Result of a pricing call.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingData<'a> {
    evo: Vec<EvoEntry<'a>>,
    shipping_method: Option<ShippingMethod<'a>>,
    subtotal_undiscounted: Money<'a, Currency>,
    subtotal_discount: Money<'a, Currency>,
    subtotal: Money<'a, Currency>,
    total: Money<'a, Currency>,
    quantity_total: u64,
    quantity_discounted: u64,
    errors: Vec<DiscountError>,
}

impl<'a> PricingData<'a> {
    /// The audit trail, baseline first
    pub fn evo(&self) -> &[EvoEntry<'a>] {
        &self.evo
    }

    /// The entries of applied discounts, in application order
    pub fn applied(&self) -> &[EvoEntry<'a>] {
        self.evo.get(1..).unwrap_or_default()
    }

    /// The selected shipping method
    pub fn shipping_method(&self) -> Option<&ShippingMethod<'a>> {
        self.shipping_method.as_ref()
    }

    /// Cart subtotal before discounts
    pub fn subtotal_undiscounted(&self) -> Money<'a, Currency> {
        self.subtotal_undiscounted
    }

    /// Sum of all applied discounts
    pub fn subtotal_discount(&self) -> Money<'a, Currency> {
        self.subtotal_discount
    }

    /// Cart subtotal after discounts
    pub fn subtotal(&self) -> Money<'a, Currency> {
        self.subtotal
    }

    /// Subtotal plus shipping
    pub fn total(&self) -> Money<'a, Currency> {
        self.total
    }

    /// Units in the cart
    pub fn quantity_total(&self) -> u64 {
        self.quantity_total
    }

    /// Units consumed by discounts
    pub fn quantity_discounted(&self) -> u64 {
        self.quantity_discounted
    }

    /// Discounts that were skipped, and why
    pub fn errors(&self) -> &[DiscountError] {
        &self.errors
    }

    /// Search terms for the discounts that reduced the price, as `discount:<handle>`.
    ///
    /// Deduplicated, in application order.
    pub fn search_terms(&self) -> Vec<String> {
        let mut seen = FxHashSet::default();

        self.applied()
            .iter()
            .filter(|entry| entry.total_discount.to_minor_units() > 0)
            .filter_map(|entry| entry.discount.as_deref())
            .filter(|handle| seen.insert(*handle))
            .map(|handle| format!("discount:{handle}"))
            .collect()
    }
}

/// Prices carts against discount lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct PricingEngine {
    config: EngineConfig,
}

impl PricingEngine {
    /// Create an engine with the given settings.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Engine settings
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Price a cart.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] if the cart itself is malformed. Problems with individual
    /// discounts are reported in [`PricingData::errors`] instead.
    #[tracing::instrument(
        name = "pricing.price",
        skip_all,
        fields(
            line_items = request.line_items.len(),
            auto_discounts = request.auto_discounts.len(),
            manual_discounts = request.manual_discounts.len(),
            subtotal_discount = tracing::field::Empty
        ),
        err
    )]
    pub fn price<'a>(
        &self,
        request: &PricingRequest<'_, 'a>,
    ) -> Result<PricingData<'a>, PricingError> {
        let currency = request.currency()?;

        let mut subtotal_minor = 0_i64;
        let mut quantity_total = 0_u64;

        for line in request.line_items {
            if line.qty() == 0 {
                return Err(PricingError::InvalidQuantity(line.id().to_string()));
            }

            let data = line
                .data()
                .ok_or_else(|| PricingError::MissingProductData(line.id().to_string()))?;

            if data.price.currency() != currency {
                return Err(PricingError::CurrencyMismatch {
                    line_item: line.id().to_string(),
                    found: data.price.currency().iso_alpha_code,
                    expected: currency.iso_alpha_code,
                });
            }

            subtotal_minor = plus(
                subtotal_minor,
                times(data.price.to_minor_units(), u64::from(line.qty()))?,
            )?;
            quantity_total += u64::from(line.qty());
        }

        let shipping_minor = match request.shipping_method {
            Some(shipping) if shipping.price.currency() != currency => {
                return Err(PricingError::ShippingCurrencyMismatch {
                    found: shipping.price.currency().iso_alpha_code,
                    expected: currency.iso_alpha_code,
                });
            }
            Some(shipping) => shipping.price.to_minor_units(),
            None => 0,
        };

        let ctx = StackContext {
            lines: request.line_items,
            currency,
            shipping_minor,
            quantity_total,
            placed_at: request.placed_at,
            customer_id: request.customer_id,
            config: &self.config,
        };

        let (evo, errors) = stacking::apply_all(
            &ctx,
            StackState::seed(&ctx, subtotal_minor)?,
            request.auto_discounts,
            request.manual_discounts,
        )
        .into_parts();

        let applied = evo.get(1..).unwrap_or_default();

        let discount_minor = applied
            .iter()
            .try_fold(0, |acc, entry| plus(acc, entry.total_discount.to_minor_units()))?;
        let quantity_discounted = applied.iter().map(|entry| entry.quantity_discounted).sum();

        let discounted_minor = minus(subtotal_minor, discount_minor)?;

        Span::current().record("subtotal_discount", discount_minor);

        Ok(PricingData {
            shipping_method: request.shipping_method.cloned(),
            subtotal_undiscounted: Money::from_minor(subtotal_minor, currency),
            subtotal_discount: Money::from_minor(discount_minor, currency),
            subtotal: Money::from_minor(discounted_minor, currency),
            total: Money::from_minor(plus(discounted_minor, shipping_minor)?, currency),
            quantity_total,
            quantity_discounted,
            errors,
            evo,
        })
    }
}

/// Price a cart with the default engine settings.
///
/// # Errors
///
/// Returns a [`PricingError`] if the cart itself is malformed.
pub fn calculate_pricing<'a>(
    line_items: &[LineItem<'a>],
    auto_discounts: &[Discount<'a>],
    manual_discounts: &[Discount<'a>],
    shipping_method: Option<&ShippingMethod<'a>>,
    customer_id: Option<&str>,
) -> Result<PricingData<'a>, PricingError> {
    let request = PricingRequest::new(line_items)
        .with_auto_discounts(auto_discounts)
        .with_manual_discounts(manual_discounts)
        .with_shipping_method(shipping_method)
        .with_customer_id(customer_id);

    PricingEngine::default().price(&request)
}
