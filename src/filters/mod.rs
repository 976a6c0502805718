//! Filters
//!
//! Predicates a discount uses to select products or to gate on the order as a whole.

use std::{fmt, str::FromStr};

use jiff::Timestamp;
use serde::Deserialize;
use thiserror::Error;

use crate::tags::TagSet;

pub mod evaluation;

pub use evaluation::OrderView;

/// Errors raised while evaluating a filter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FilterError {
    /// The filter kind is unknown or its value is malformed.
    #[error("unsupported filter `{kind}`: {reason}")]
    Unsupported {
        /// Filter kind as received
        kind: String,

        /// Why the filter could not be used
        reason: String,
    },
}

/// A filter meta string did not name a known filter kind.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown filter kind `{0}`")]
pub struct UnknownFilterMeta(pub String);

/// The closed set of filter kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMeta {
    /// Product handle is in the list
    PInHandles,

    /// Product handle is not in the list
    PNotInHandles,

    /// Product has at least one of the tags
    PInTags,

    /// Product has none of the tags
    PNotInTags,

    /// Product belongs to one of the collections
    PInCollections,

    /// Product belongs to none of the collections
    PNotInCollections,

    /// Product price is within a range
    PInPriceRange,

    /// Matches every product
    PAll,

    /// Running order subtotal is within a range
    OSubtotalInRange,

    /// Total item count is within a range
    OItemsCountInRange,

    /// Order timestamp is within a range
    ODateInRange,

    /// Order customer is in the list
    OHasCustomer,
}

impl FilterMeta {
    /// Every filter kind, product kinds first.
    pub const ALL: [FilterMeta; 12] = [
        FilterMeta::PInHandles,
        FilterMeta::PNotInHandles,
        FilterMeta::PInTags,
        FilterMeta::PNotInTags,
        FilterMeta::PInCollections,
        FilterMeta::PNotInCollections,
        FilterMeta::PInPriceRange,
        FilterMeta::PAll,
        FilterMeta::OSubtotalInRange,
        FilterMeta::OItemsCountInRange,
        FilterMeta::ODateInRange,
        FilterMeta::OHasCustomer,
    ];

    /// Wire name of the filter kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            FilterMeta::PInHandles => "p_in_handles",
            FilterMeta::PNotInHandles => "p_not_in_handles",
            FilterMeta::PInTags => "p_in_tags",
            FilterMeta::PNotInTags => "p_not_in_tags",
            FilterMeta::PInCollections => "p_in_collections",
            FilterMeta::PNotInCollections => "p_not_in_collections",
            FilterMeta::PInPriceRange => "p_in_price_range",
            FilterMeta::PAll => "p_all",
            FilterMeta::OSubtotalInRange => "o_subtotal_in_range",
            FilterMeta::OItemsCountInRange => "o_items_count_in_range",
            FilterMeta::ODateInRange => "o_date_in_range",
            FilterMeta::OHasCustomer => "o_has_customer",
        }
    }

    /// Whether the kind is evaluated against the order rather than a product.
    pub const fn is_order_level(self) -> bool {
        matches!(
            self,
            FilterMeta::OSubtotalInRange
                | FilterMeta::OItemsCountInRange
                | FilterMeta::ODateInRange
                | FilterMeta::OHasCustomer
        )
    }
}

impl fmt::Display for FilterMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterMeta {
    type Err = UnknownFilterMeta;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterMeta::ALL
            .into_iter()
            .find(|meta| meta.as_str() == s)
            .ok_or_else(|| UnknownFilterMeta(s.to_string()))
    }
}

/// Inclusive range where either bound may be open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueRange<T> {
    /// Lower bound, `None` is unbounded
    pub from: Option<T>,

    /// Upper bound, `None` is unbounded
    pub to: Option<T>,
}

impl<T: PartialOrd> ValueRange<T> {
    /// Create a range from optional bounds.
    pub const fn new(from: Option<T>, to: Option<T>) -> Self {
        Self { from, to }
    }

    /// Range with only a lower bound.
    pub const fn at_least(from: T) -> Self {
        Self {
            from: Some(from),
            to: None,
        }
    }

    /// Range with only an upper bound.
    pub const fn at_most(to: T) -> Self {
        Self {
            from: None,
            to: Some(to),
        }
    }

    /// Range with both bounds.
    pub const fn between(from: T, to: T) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    /// Whether `value` lies within the range, bounds included.
    pub fn contains(&self, value: &T) -> bool {
        self.from.as_ref().is_none_or(|from| from <= value)
            && self.to.as_ref().is_none_or(|to| value <= to)
    }
}

/// A single filter predicate.
///
/// Money bounds are minor units of the cart currency.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `p_in_handles`
    InHandles(TagSet),

    /// `p_not_in_handles`
    NotInHandles(TagSet),

    /// `p_in_tags`
    InTags(TagSet),

    /// `p_not_in_tags`
    NotInTags(TagSet),

    /// `p_in_collections`, matched by collection id or handle
    InCollections(TagSet),

    /// `p_not_in_collections`, matched by collection id or handle
    NotInCollections(TagSet),

    /// `p_in_price_range`
    InPriceRange(ValueRange<i64>),

    /// `p_all`
    All,

    /// `o_subtotal_in_range`
    SubtotalInRange(ValueRange<i64>),

    /// `o_items_count_in_range`
    ItemsCountInRange(ValueRange<u64>),

    /// `o_date_in_range`
    DateInRange(ValueRange<Timestamp>),

    /// `o_has_customer`
    HasCustomer(TagSet),

    /// A filter received from outside the type system that could not be understood.
    Unsupported {
        /// Filter kind as received
        kind: String,

        /// Why the filter could not be used
        reason: String,
    },
}

impl Filter {
    /// Create an unsupported filter.
    pub fn unsupported(kind: impl Into<String>, reason: impl Into<String>) -> Self {
        Filter::Unsupported {
            kind: kind.into(),
            reason: reason.into(),
        }
    }

    /// The filter's kind, or `None` for an unsupported filter.
    pub fn meta(&self) -> Option<FilterMeta> {
        let meta = match self {
            Filter::InHandles(_) => FilterMeta::PInHandles,
            Filter::NotInHandles(_) => FilterMeta::PNotInHandles,
            Filter::InTags(_) => FilterMeta::PInTags,
            Filter::NotInTags(_) => FilterMeta::PNotInTags,
            Filter::InCollections(_) => FilterMeta::PInCollections,
            Filter::NotInCollections(_) => FilterMeta::PNotInCollections,
            Filter::InPriceRange(_) => FilterMeta::PInPriceRange,
            Filter::All => FilterMeta::PAll,
            Filter::SubtotalInRange(_) => FilterMeta::OSubtotalInRange,
            Filter::ItemsCountInRange(_) => FilterMeta::OItemsCountInRange,
            Filter::DateInRange(_) => FilterMeta::ODateInRange,
            Filter::HasCustomer(_) => FilterMeta::OHasCustomer,
            Filter::Unsupported { .. } => return None,
        };

        Some(meta)
    }

    /// Kind name for diagnostics.
    pub fn kind(&self) -> &str {
        match self {
            Filter::Unsupported { kind, .. } => kind,
            other => other.meta().map_or("unknown", FilterMeta::as_str),
        }
    }

    /// Whether the filter is evaluated against the order rather than a product.
    pub fn is_order_level(&self) -> bool {
        self.meta().is_some_and(FilterMeta::is_order_level)
    }

    /// Return the evaluation error for an unsupported filter.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Unsupported`] if this filter cannot be evaluated.
    pub fn ensure_supported(&self) -> Result<(), FilterError> {
        match self {
            Filter::Unsupported { kind, reason } => Err(FilterError::Unsupported {
                kind: kind.clone(),
                reason: reason.clone(),
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[test]
    fn meta_round_trips_through_wire_names() -> TestResult {
        for meta in FilterMeta::ALL {
            assert_eq!(meta.as_str().parse::<FilterMeta>()?, meta);
        }

        Ok(())
    }

    #[test]
    fn unknown_meta_is_rejected() {
        assert_eq!(
            "p_in_colour".parse::<FilterMeta>(),
            Err(UnknownFilterMeta("p_in_colour".to_string()))
        );
    }

    #[test]
    fn order_level_kinds_are_prefixed_with_o() {
        for meta in FilterMeta::ALL {
            assert_eq!(meta.is_order_level(), meta.as_str().starts_with("o_"));
        }
    }

    #[test]
    fn range_bounds_are_inclusive_and_optional() {
        assert!(ValueRange::between(10, 20).contains(&10));
        assert!(ValueRange::between(10, 20).contains(&20));
        assert!(!ValueRange::between(10, 20).contains(&21));
        assert!(ValueRange::at_least(300).contains(&1000));
        assert!(!ValueRange::at_least(300).contains(&100));
        assert!(ValueRange::at_most(5).contains(&-5));
        assert!(ValueRange::<i64>::new(None, None).contains(&i64::MIN));
    }

    #[test]
    fn unsupported_filter_reports_its_kind() {
        let filter = Filter::unsupported("p_in_colour", "unknown filter kind");

        assert_eq!(filter.meta(), None);
        assert_eq!(filter.kind(), "p_in_colour");
        assert!(!filter.is_order_level());
        assert_eq!(
            filter.ensure_supported(),
            Err(FilterError::Unsupported {
                kind: "p_in_colour".to_string(),
                reason: "unknown filter kind".to_string(),
            })
        );
    }
}
