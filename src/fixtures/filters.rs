//! Filter Fixtures
//!
//! Filters arrive as `{ meta, value }` pairs. Anything that cannot be turned into a typed
//! [`Filter`] becomes [`Filter::Unsupported`] so pricing reports it against the discount.

use jiff::Timestamp;
use rusty_money::iso::Currency;
use serde::Deserialize;
use serde_norway::Value;

use crate::{
    filters::{Filter, FilterMeta, ValueRange},
    fixtures::products::parse_price,
    tags::TagSet,
};

/// Filter Fixture
#[derive(Debug, Clone, Deserialize)]
pub struct FilterFixture {
    /// Filter kind, e.g. `p_in_tags`
    pub meta: String,

    /// Kind-specific value
    #[serde(default)]
    pub value: Option<Value>,
}

impl FilterFixture {
    /// Convert into a [`Filter`], reading money bounds in `currency`.
    pub fn into_filter(self, currency: &Currency) -> Filter {
        let Ok(meta) = self.meta.parse::<FilterMeta>() else {
            return Filter::unsupported(self.meta, "unknown filter kind");
        };

        let value = self.value.as_ref();

        let parsed = match meta {
            FilterMeta::PInHandles => string_list(value).map(Filter::InHandles),
            FilterMeta::PNotInHandles => string_list(value).map(Filter::NotInHandles),
            FilterMeta::PInTags => string_list(value).map(Filter::InTags),
            FilterMeta::PNotInTags => string_list(value).map(Filter::NotInTags),
            FilterMeta::PInCollections => string_list(value).map(Filter::InCollections),
            FilterMeta::PNotInCollections => string_list(value).map(Filter::NotInCollections),
            FilterMeta::PInPriceRange => {
                range(value, |bound| money_bound(bound, currency)).map(Filter::InPriceRange)
            }
            FilterMeta::PAll => Ok(Filter::All),
            FilterMeta::OSubtotalInRange => {
                range(value, |bound| money_bound(bound, currency)).map(Filter::SubtotalInRange)
            }
            FilterMeta::OItemsCountInRange => {
                range(value, count_bound).map(Filter::ItemsCountInRange)
            }
            FilterMeta::ODateInRange => range(value, date_bound).map(Filter::DateInRange),
            FilterMeta::OHasCustomer => string_list(value).map(Filter::HasCustomer),
        };

        parsed.unwrap_or_else(|reason| Filter::unsupported(meta.as_str(), reason))
    }
}

fn string_list(value: Option<&Value>) -> Result<TagSet, String> {
    let Some(Value::Sequence(entries)) = value else {
        return Err("expected a list of strings".to_string());
    };

    entries
        .iter()
        .map(|entry| {
            entry
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| "expected a list of strings".to_string())
        })
        .collect::<Result<Vec<_>, _>>()
        .map(TagSet::from)
}

fn range<T: PartialOrd>(
    value: Option<&Value>,
    bound: impl Fn(&Value) -> Result<T, String>,
) -> Result<ValueRange<T>, String> {
    let Some(Value::Mapping(mapping)) = value else {
        return Err("expected a mapping with `from` and/or `to`".to_string());
    };

    if let Some(key) = mapping
        .keys()
        .find(|key| !matches!(key.as_str(), Some("from" | "to")))
    {
        return Err(format!("unexpected range key {key:?}"));
    }

    let from = mapping.get("from").map(&bound).transpose()?;
    let to = mapping.get("to").map(&bound).transpose()?;

    Ok(ValueRange::new(from, to))
}

/// Money bounds are either a price string (`"3.00 GBP"`) or an integer of minor units.
fn money_bound(value: &Value, currency: &Currency) -> Result<i64, String> {
    if let Some(minor) = value.as_i64() {
        return Ok(minor);
    }

    let text = value
        .as_str()
        .ok_or_else(|| "expected a price or minor units".to_string())?;

    let (minor, found) = parse_price(text).map_err(|err| err.to_string())?;

    if found != currency {
        return Err(format!(
            "bound is priced in {}, expected {}",
            found.iso_alpha_code, currency.iso_alpha_code
        ));
    }

    Ok(minor)
}

fn count_bound(value: &Value) -> Result<u64, String> {
    value
        .as_u64()
        .ok_or_else(|| "expected a non-negative integer".to_string())
}

fn date_bound(value: &Value) -> Result<Timestamp, String> {
    value
        .as_str()
        .ok_or_else(|| "expected an RFC 3339 timestamp".to_string())?
        .parse::<Timestamp>()
        .map_err(|err| err.to_string())
}
