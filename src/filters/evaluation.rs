//! Filter evaluation against products and the running order state.

use jiff::Timestamp;

use crate::{
    filters::{Filter, FilterError},
    items::LineItem,
    products::ProductSnapshot,
};

/// The order as seen by one discount step.
#[derive(Debug, Clone, Copy)]
pub struct OrderView<'v, 'a> {
    /// Cart line items in input order
    pub lines: &'v [LineItem<'a>],

    /// Undiscounted units left on each line, parallel to `lines`
    pub remaining: &'v [u32],

    /// Running subtotal in minor units
    pub subtotal_minor: i64,

    /// Total units in the cart
    pub quantity_total: u64,

    /// When the order was placed
    pub placed_at: Option<Timestamp>,

    /// Customer placing the order
    pub customer_id: Option<&'v str>,
}

impl<'v, 'a> OrderView<'v, 'a> {
    /// Lines with undiscounted units left, as `(line index, product, remaining units)`.
    pub fn open_products(
        &self,
    ) -> impl Iterator<Item = (usize, &'v ProductSnapshot<'a>, u32)> + use<'v, 'a> {
        let lines = self.lines;
        let remaining = self.remaining;

        lines
            .iter()
            .zip(remaining.iter().copied())
            .enumerate()
            .filter(|(_, (_, remaining))| *remaining > 0)
            .filter_map(|(idx, (line, remaining))| line.data().map(|data| (idx, data, remaining)))
    }

    /// Products of every line in the order, discounted or not.
    pub fn products(&self) -> impl Iterator<Item = &'v ProductSnapshot<'a>> + use<'v, 'a> {
        let lines = self.lines;

        lines.iter().filter_map(LineItem::data)
    }
}

impl Filter {
    /// Evaluate the filter for one product.
    ///
    /// Order-level filters ignore the product and are evaluated against `order`.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Unsupported`] for an unsupported filter.
    pub fn matches_product(
        &self,
        product: &ProductSnapshot<'_>,
        order: &OrderView<'_, '_>,
    ) -> Result<bool, FilterError> {
        let matched = match self {
            Filter::InHandles(handles) => handles.contains(&product.handle),
            Filter::NotInHandles(handles) => !handles.contains(&product.handle),
            Filter::InTags(tags) => product.tags.intersects(tags),
            Filter::NotInTags(tags) => !product.tags.intersects(tags),
            Filter::InCollections(keys) => product.in_any_collection(keys),
            Filter::NotInCollections(keys) => !product.in_any_collection(keys),
            Filter::InPriceRange(range) => range.contains(&product.price.to_minor_units()),
            Filter::All => true,
            Filter::SubtotalInRange(_)
            | Filter::ItemsCountInRange(_)
            | Filter::DateInRange(_)
            | Filter::HasCustomer(_) => return self.matches_order(order),
            Filter::Unsupported { .. } => {
                self.ensure_supported()?;
                false
            }
        };

        Ok(matched)
    }

    /// Evaluate the filter against the order as a whole.
    ///
    /// A product-level filter matches the order when any line in it matches, whether or not
    /// earlier steps consumed that line's units.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Unsupported`] for an unsupported filter.
    pub fn matches_order(&self, order: &OrderView<'_, '_>) -> Result<bool, FilterError> {
        let matched = match self {
            Filter::SubtotalInRange(range) => range.contains(&order.subtotal_minor),
            Filter::ItemsCountInRange(range) => range.contains(&order.quantity_total),
            Filter::DateInRange(range) => order.placed_at.is_some_and(|at| range.contains(&at)),
            Filter::HasCustomer(customers) => order
                .customer_id
                .is_some_and(|customer| customers.contains(customer)),
            Filter::Unsupported { .. } => {
                self.ensure_supported()?;
                false
            }
            _ => {
                for product in order.products() {
                    if self.matches_product(product, order)? {
                        return Ok(true);
                    }
                }

                false
            }
        };

        Ok(matched)
    }
}

/// Whether every filter matches `product`. An empty filter list matches.
///
/// # Errors
///
/// Returns the first [`FilterError`] encountered.
pub fn all_match_product(
    filters: &[Filter],
    product: &ProductSnapshot<'_>,
    order: &OrderView<'_, '_>,
) -> Result<bool, FilterError> {
    for filter in filters {
        if !filter.matches_product(product, order)? {
            return Ok(false);
        }
    }

    Ok(true)
}

/// Whether every filter matches the order. An empty filter list matches.
///
/// # Errors
///
/// Returns the first [`FilterError`] encountered.
pub fn all_match_order(filters: &[Filter], order: &OrderView<'_, '_>) -> Result<bool, FilterError> {
    for filter in filters {
        if !filter.matches_order(order)? {
            return Ok(false);
        }
    }

    Ok(true)
}
