//! Product Fixtures

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rustc_hash::FxHashMap;
use rusty_money::{
    Money,
    iso::{Currency, EUR, GBP, USD},
};
use serde::Deserialize;

use crate::{
    fixtures::FixtureError,
    products::{CollectionRef, ProductSnapshot},
    tags::TagSet,
};

/// Wrapper for products in YAML
#[derive(Debug, Deserialize)]
pub struct ProductsFixture {
    /// Map of product key -> product fixture
    pub products: FxHashMap<String, ProductFixture>,
}

/// Product Fixture
#[derive(Debug, Deserialize)]
pub struct ProductFixture {
    /// Product id
    pub id: String,

    /// Product handle
    pub handle: String,

    /// Product price (e.g., "2.99 GBP")
    pub price: String,

    /// Product tags
    #[serde(default)]
    pub tags: TagSet,

    /// Collections the product belongs to
    #[serde(default)]
    pub collections: Vec<CollectionFixture>,
}

/// Collection reference in YAML
#[derive(Debug, Deserialize)]
pub struct CollectionFixture {
    /// Collection id
    pub id: String,

    /// Collection handle
    pub handle: String,
}

impl TryFrom<ProductFixture> for ProductSnapshot<'_> {
    type Error = FixtureError;

    fn try_from(fixture: ProductFixture) -> Result<Self, Self::Error> {
        let price = parse_money(&fixture.price)?;

        Ok(ProductSnapshot::new(fixture.id, fixture.handle, price)
            .with_tags(fixture.tags)
            .with_collections(
                fixture
                    .collections
                    .into_iter()
                    .map(|collection| CollectionRef::new(collection.id, collection.handle)),
            ))
    }
}

/// Parse price string (e.g., "2.99 GBP") into minor units and currency
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount cannot be parsed as a decimal, or if the currency code
/// is not recognized.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), FixtureError> {
    let mut parts = s.split_whitespace();

    let (Some(amount), Some(currency_code), None) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(FixtureError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    let currency = match currency_code {
        "GBP" => GBP,
        "USD" => USD,
        "EUR" => EUR,
        other => return Err(FixtureError::UnknownCurrency(other.to_string())),
    };

    let minor_units = amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|value| value.round_dp(0).to_i64())
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    Ok((minor_units, currency))
}

/// Parse price string (e.g., "2.99 GBP") into [`Money`].
///
/// # Errors
///
/// Returns an error if [`parse_price`] fails.
pub fn parse_money(s: &str) -> Result<Money<'static, Currency>, FixtureError> {
    let (minor_units, currency) = parse_price(s)?;

    Ok(Money::from_minor(minor_units, currency))
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn parse_price_reads_amount_and_currency() -> TestResult {
        assert_eq!(parse_price("2.99 GBP")?, (299, GBP));
        assert_eq!(parse_price("1 USD")?, (100, USD));
        assert_eq!(parse_price("0.50 EUR")?, (50, EUR));

        Ok(())
    }

    #[test]
    fn parse_price_rejects_invalid_format() {
        assert!(matches!(parse_price("2.99GBP"), Err(FixtureError::InvalidPrice(_))));
        assert!(matches!(parse_price("2.99 GBP extra"), Err(FixtureError::InvalidPrice(_))));
        assert!(matches!(parse_price("two GBP"), Err(FixtureError::InvalidPrice(_))));
    }

    #[test]
    fn parse_price_rejects_unknown_currency() {
        let result = parse_price("2.99 ABC");

        assert!(matches!(result, Err(FixtureError::UnknownCurrency(code)) if code == "ABC"));
    }

    #[test]
    fn product_fixture_converts_to_snapshot() -> TestResult {
        let fixture: ProductFixture = serde_norway::from_str(
            "id: prod_1\nhandle: robot-arm\nprice: 1.00 GBP\ntags: [robot, arm]\ncollections:\n  - id: col_1\n    handle: robots\n",
        )?;

        let product = ProductSnapshot::try_from(fixture)?;

        assert_eq!(product.handle, "robot-arm");
        assert_eq!(product.price, Money::from_minor(100, GBP));
        assert!(product.tags.contains("arm"));
        assert!(product.in_any_collection(&TagSet::from_strs(&["robots"])));

        Ok(())
    }
}
