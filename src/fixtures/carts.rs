//! Cart Fixtures

use jiff::Timestamp;
use serde::Deserialize;

/// Cart Fixture
#[derive(Debug, Deserialize)]
pub struct CartFixture {
    /// Line items in the cart
    #[serde(default)]
    pub items: Vec<LineItemFixture>,

    /// Selected shipping method
    #[serde(default)]
    pub shipping: Option<ShippingFixture>,

    /// Customer placing the order
    #[serde(default)]
    pub customer: Option<String>,

    /// When the order was placed
    #[serde(default)]
    pub placed_at: Option<Timestamp>,

    /// Coupon codes entered by the customer
    #[serde(default)]
    pub coupons: Vec<String>,
}

/// Line Item Fixture
#[derive(Debug, Deserialize)]
pub struct LineItemFixture {
    /// Line item id
    pub id: String,

    /// Product key in the products fixture
    pub product: String,

    /// Quantity ordered
    pub qty: u32,
}

/// Shipping Fixture
#[derive(Debug, Deserialize)]
pub struct ShippingFixture {
    /// Shipping method id
    pub id: String,

    /// Display name
    pub name: String,

    /// Price (e.g., "0.50 GBP")
    pub price: String,
}
