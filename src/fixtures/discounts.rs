//! Discount Fixtures

use std::{fmt, marker::PhantomData};

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use serde::{
    Deserialize, Deserializer,
    de::{MapAccess, Visitor},
};

use crate::{
    discounts::{
        BulkExtra, BundleExtra, BuyXGetYExtra, Discount, DiscountApplication, DiscountDetails,
        OrderExtra, RegularExtra,
    },
    fixtures::{FixtureError, filters::FilterFixture, products::parse_money},
};

/// Wrapper for discounts in YAML
#[derive(Debug, Deserialize)]
pub struct DiscountsFixture {
    /// Discount key -> discount fixture, in file order
    #[serde(deserialize_with = "ordered_entries")]
    pub discounts: Vec<(String, DiscountFixture)>,
}

/// Discount Fixture
#[derive(Debug, Deserialize)]
pub struct DiscountFixture {
    /// Discount handle, also the coupon code for manual discounts
    pub handle: String,

    /// Whether the discount is live
    #[serde(default = "default_active")]
    pub active: bool,

    /// Stacking priority, lower runs first
    #[serde(default)]
    pub priority: i32,

    /// Automatic or coupon
    #[serde(default)]
    pub application: DiscountApplication,

    /// Kind and kind-specific parameters
    #[serde(flatten)]
    pub details: DetailsFixture,

    /// Filters selecting what the discount applies to
    #[serde(default)]
    pub filters: Vec<FilterFixture>,
}

/// Kind-specific parameters, tagged by `type`
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DetailsFixture {
    /// Regular discount
    Regular {
        /// Percentage points
        #[serde(default)]
        percent: Decimal,

        /// Fixed amount (e.g., "1.00 GBP")
        #[serde(default)]
        fixed: Option<String>,
    },

    /// Bulk discount
    Bulk {
        /// Group size
        qty: i64,

        /// Percentage points applied to `fixed`
        #[serde(default)]
        percent: Decimal,

        /// Group target amount
        #[serde(default)]
        fixed: Option<String>,

        /// Apply to every complete group
        #[serde(default)]
        recursive: bool,
    },

    /// Bundle discount
    Bundle {
        /// Percentage points
        #[serde(default)]
        percent: Decimal,

        /// Fixed amount
        #[serde(default)]
        fixed: Option<String>,

        /// Form as many bundles as possible
        #[serde(default)]
        recursive: bool,
    },

    /// Buy-X-get-Y discount
    BuyXGetY {
        /// Trigger units per repeat
        qty_x: i64,

        /// Reward units per repeat
        qty_y: i64,

        /// Percentage points
        #[serde(default)]
        percent: Decimal,

        /// Fixed amount
        #[serde(default)]
        fixed: Option<String>,

        /// Repeat as often as possible
        #[serde(default)]
        recursive: bool,

        /// Reward filters
        #[serde(default)]
        filters_y: Vec<FilterFixture>,
    },

    /// Order discount
    Order {
        /// Percentage points
        #[serde(default)]
        percent: Decimal,

        /// Fixed amount
        #[serde(default)]
        fixed: Option<String>,
    },
}

fn default_active() -> bool {
    true
}

impl DiscountFixture {
    /// Build a [`Discount`], defaulting missing fixed amounts to zero in `currency`.
    ///
    /// # Errors
    ///
    /// Returns an error if a fixed amount is not a valid price.
    pub fn try_into_discount<'a>(
        self,
        currency: &'static Currency,
    ) -> Result<Discount<'a>, FixtureError> {
        let fixed = |amount: Option<String>| -> Result<Money<'a, Currency>, FixtureError> {
            amount.map_or_else(|| Ok(Money::from_minor(0, currency)), |s| parse_money(&s))
        };

        let details = match self.details {
            DetailsFixture::Regular { percent, fixed: amount } => {
                DiscountDetails::Regular(RegularExtra {
                    percent,
                    fixed: fixed(amount)?,
                })
            }
            DetailsFixture::Bulk {
                qty,
                percent,
                fixed: amount,
                recursive,
            } => DiscountDetails::Bulk(BulkExtra {
                qty,
                percent,
                fixed: fixed(amount)?,
                recursive,
            }),
            DetailsFixture::Bundle {
                percent,
                fixed: amount,
                recursive,
            } => DiscountDetails::Bundle(BundleExtra {
                percent,
                fixed: fixed(amount)?,
                recursive,
            }),
            DetailsFixture::BuyXGetY {
                qty_x,
                qty_y,
                percent,
                fixed: amount,
                recursive,
                filters_y,
            } => DiscountDetails::BuyXGetY(BuyXGetYExtra {
                qty_x,
                qty_y,
                percent,
                fixed: fixed(amount)?,
                recursive,
                filters_y: filters_y
                    .into_iter()
                    .map(|filter| filter.into_filter(currency))
                    .collect(),
            }),
            DetailsFixture::Order { percent, fixed: amount } => DiscountDetails::Order(OrderExtra {
                percent,
                fixed: fixed(amount)?,
            }),
        };

        Ok(Discount::new(self.handle, details)
            .with_active(self.active)
            .with_priority(self.priority)
            .with_application(self.application)
            .with_filters(
                self.filters
                    .into_iter()
                    .map(|filter| filter.into_filter(currency)),
            ))
    }
}

/// Deserialize a mapping into its entries, keeping file order.
fn ordered_entries<'de, D, V>(deserializer: D) -> Result<Vec<(String, V)>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    struct EntriesVisitor<V>(PhantomData<V>);

    impl<'de, V: Deserialize<'de>> Visitor<'de> for EntriesVisitor<V> {
        type Value = Vec<(String, V)>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a mapping of keys to discounts")
        }

        fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
            let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));

            while let Some(entry) = map.next_entry::<String, V>()? {
                entries.push(entry);
            }

            Ok(entries)
        }
    }

    deserializer.deserialize_map(EntriesVisitor(PhantomData))
}
