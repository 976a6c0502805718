//! Fixtures
//!
//! YAML fixture sets describing products, a cart and a discount catalog, loaded into the
//! inputs a pricing call expects.

use std::{fs, path::PathBuf};

use jiff::Timestamp;
use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use slotmap::SlotMap;
use thiserror::Error;

use crate::{
    catalog::{DiscountSelection, partition_discounts},
    discounts::Discount,
    fixtures::{carts::CartFixture, discounts::DiscountsFixture, products::ProductsFixture},
    items::LineItem,
    pricing::{PricingData, PricingEngine, PricingError, PricingRequest, ShippingMethod},
    products::{ProductKey, ProductSnapshot},
};

pub mod carts;
pub mod discounts;
pub mod filters;
pub mod products;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Product not found
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Currency mismatch between products or shipping
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// No products loaded yet
    #[error("No products loaded yet; currency unknown")]
    NoCurrency,

    /// Pricing the fixture failed
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Fixture
#[derive(Debug)]
pub struct Fixture<'a> {
    /// Base path for fixture files
    base_path: PathBuf,

    /// Products stored under generated keys
    products: SlotMap<ProductKey, ProductSnapshot<'a>>,

    /// String key -> `SlotMap` key mappings for lookups
    product_keys: FxHashMap<String, ProductKey>,

    /// Cart line items
    line_items: Vec<LineItem<'a>>,

    /// Discount catalog, in file order
    discounts: Vec<Discount<'a>>,

    /// Selected shipping method
    shipping: Option<ShippingMethod<'a>>,

    customer_id: Option<String>,

    placed_at: Option<Timestamp>,

    /// Coupon codes entered in the cart
    coupons: Vec<String>,

    /// Currency for the fixture set
    currency: Option<&'static Currency>,
}

impl<'a> Fixture<'a> {
    /// Create a new empty fixture with default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a new empty fixture with custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            products: SlotMap::with_key(),
            product_keys: FxHashMap::default(),
            line_items: Vec::new(),
            discounts: Vec::new(),
            shipping: None,
            customer_id: None,
            placed_at: None,
            coupons: Vec::new(),
            currency: None,
        }
    }

    /// Load products from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or if there are currency mismatches.
    pub fn load_products(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let contents = self.read("products", name)?;
        let fixture: ProductsFixture = serde_norway::from_str(&contents)?;

        for (key, product_fixture) in fixture.products {
            let (_minor_units, currency) = products::parse_price(&product_fixture.price)?;

            self.check_currency(currency)?;

            let product: ProductSnapshot<'a> = product_fixture.try_into()?;
            let product_key = self.products.insert(product);

            self.product_keys.insert(key, product_key);
        }

        Ok(self)
    }

    /// Load the cart from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, if referenced products don't exist,
    /// or if the shipping price is invalid.
    pub fn load_cart(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let contents = self.read("carts", name)?;
        let fixture: CartFixture = serde_norway::from_str(&contents)?;

        for item in fixture.items {
            let product = self.product(&item.product)?.clone();

            self.line_items.push(LineItem::new(item.id, item.qty, product));
        }

        if let Some(shipping) = fixture.shipping {
            let (minor_units, currency) = products::parse_price(&shipping.price)?;

            self.check_currency(currency)?;
            self.shipping = Some(ShippingMethod::new(
                shipping.id,
                shipping.name,
                Money::from_minor(minor_units, currency),
            ));
        }

        self.customer_id = fixture.customer;
        self.placed_at = fixture.placed_at;
        self.coupons = fixture.coupons;

        Ok(self)
    }

    /// Load the discount catalog from a YAML fixture file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, if no currency is known yet, or if a
    /// discount carries an invalid amount.
    pub fn load_discounts(&mut self, name: &str) -> Result<&mut Self, FixtureError> {
        let currency = self.currency.ok_or(FixtureError::NoCurrency)?;
        let contents = self.read("discounts", name)?;
        let fixture: DiscountsFixture = serde_norway::from_str(&contents)?;

        for (_key, discount_fixture) in fixture.discounts {
            self.discounts.push(discount_fixture.try_into_discount(currency)?);
        }

        Ok(self)
    }

    /// Load a complete fixture set (products, cart, and discounts with the same name)
    ///
    /// # Errors
    ///
    /// Returns an error if any of the fixture files cannot be loaded.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        let mut fixture = Self::new();

        fixture
            .load_products(name)?
            .load_cart(name)?
            .load_discounts(name)?;

        Ok(fixture)
    }

    /// Get a product by its string key
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found.
    pub fn product(&self, key: &str) -> Result<&ProductSnapshot<'a>, FixtureError> {
        let product_key = self
            .product_keys
            .get(key)
            .ok_or_else(|| FixtureError::ProductNotFound(key.to_string()))?;

        self.products
            .get(*product_key)
            .ok_or_else(|| FixtureError::ProductNotFound(key.to_string()))
    }

    /// Get all line items
    pub fn line_items(&self) -> &[LineItem<'a>] {
        &self.line_items
    }

    /// Get the whole discount catalog
    pub fn discounts(&self) -> &[Discount<'a>] {
        &self.discounts
    }

    /// Get the selected shipping method
    pub fn shipping_method(&self) -> Option<&ShippingMethod<'a>> {
        self.shipping.as_ref()
    }

    /// Get the customer id
    pub fn customer_id(&self) -> Option<&str> {
        self.customer_id.as_deref()
    }

    /// Get the order timestamp
    pub fn placed_at(&self) -> Option<Timestamp> {
        self.placed_at
    }

    /// Get the coupon codes entered in the cart
    pub fn coupons(&self) -> &[String] {
        &self.coupons
    }

    /// Get the fixture currency
    pub fn currency(&self) -> Option<&'static Currency> {
        self.currency
    }

    /// Split the catalog using the cart's coupons plus `extra_coupons`.
    pub fn selection<S: AsRef<str>>(&self, extra_coupons: &[S]) -> DiscountSelection<'a> {
        let codes: Vec<&str> = self
            .coupons
            .iter()
            .map(String::as_str)
            .chain(extra_coupons.iter().map(AsRef::as_ref))
            .collect();

        partition_discounts(&self.discounts, &codes)
    }

    /// Price the cart with `engine`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pricing call fails.
    pub fn price<S: AsRef<str>>(
        &self,
        engine: &PricingEngine,
        extra_coupons: &[S],
    ) -> Result<PricingData<'a>, FixtureError> {
        let selection = self.selection(extra_coupons);

        let mut request = PricingRequest::new(&self.line_items)
            .with_auto_discounts(&selection.auto)
            .with_manual_discounts(&selection.manual)
            .with_shipping_method(self.shipping.as_ref())
            .with_customer_id(self.customer_id.as_deref())
            .with_placed_at(self.placed_at);

        if let Some(currency) = self.currency {
            request = request.with_currency(currency);
        }

        Ok(engine.price(&request)?)
    }

    fn read(&self, category: &str, name: &str) -> Result<String, FixtureError> {
        let file_path = self.base_path.join(category).join(format!("{name}.yml"));

        Ok(fs::read_to_string(file_path)?)
    }

    fn check_currency(&mut self, currency: &'static Currency) -> Result<(), FixtureError> {
        match self.currency {
            Some(existing) if existing != currency => Err(FixtureError::CurrencyMismatch(
                existing.iso_alpha_code.to_string(),
                currency.iso_alpha_code.to_string(),
            )),
            Some(_) => Ok(()),
            None => {
                self.currency = Some(currency);

                Ok(())
            }
        }
    }
}

impl Default for Fixture<'_> {
    fn default() -> Self {
        Self::new()
    }
}
