//! Items

use rusty_money::{Money, iso::Currency};

use crate::products::ProductSnapshot;

/// One cart entry: a purchased quantity of a product snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem<'a> {
    id: String,
    qty: u32,
    price: Option<Money<'a, Currency>>,
    data: Option<ProductSnapshot<'a>>,
    stock_reserved: Option<u32>,
}

impl<'a> LineItem<'a> {
    /// Creates a new line item for a product snapshot.
    pub fn new(id: impl Into<String>, qty: u32, data: ProductSnapshot<'a>) -> Self {
        Self {
            id: id.into(),
            qty,
            price: None,
            data: Some(data),
            stock_reserved: None,
        }
    }

    /// Creates a line item that carries no product snapshot.
    ///
    /// Such an item cannot be priced; it exists so callers can represent carts whose product
    /// data has not been refreshed yet.
    pub fn without_data(id: impl Into<String>, qty: u32) -> Self {
        Self {
            id: id.into(),
            qty,
            price: None,
            data: None,
            stock_reserved: None,
        }
    }

    /// Sets the price recorded on the line itself.
    #[must_use]
    pub fn with_price(mut self, price: Money<'a, Currency>) -> Self {
        self.price = Some(price);
        self
    }

    /// Sets the number of units reserved in stock.
    #[must_use]
    pub fn with_stock_reserved(mut self, stock_reserved: u32) -> Self {
        self.stock_reserved = Some(stock_reserved);
        self
    }

    /// Returns the line item id
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the purchased quantity
    pub fn qty(&self) -> u32 {
        self.qty
    }

    /// Returns the price recorded on the line, if any.
    ///
    /// Pricing always uses the product snapshot's price instead.
    pub fn price(&self) -> Option<&Money<'a, Currency>> {
        self.price.as_ref()
    }

    /// Returns the product snapshot
    pub fn data(&self) -> Option<&ProductSnapshot<'a>> {
        self.data.as_ref()
    }

    /// Returns the reserved stock quantity
    pub fn stock_reserved(&self) -> Option<u32> {
        self.stock_reserved
    }

    /// Returns the unit price used for pricing, taken from the product snapshot.
    pub fn unit_price(&self) -> Option<&Money<'a, Currency>> {
        self.data.as_ref().map(|data| &data.price)
    }
}
