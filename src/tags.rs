//! Tag Sets
//!
//! A sorted, de-duplicated string set used for product tags and for the value lists of
//! handle, tag, collection and customer filters.

use std::{cmp::Ordering, string::ToString};

use serde::Deserialize;
use smallvec::SmallVec;

/// A sorted string set backed by `SmallVec<[String; 5]>`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Vec<String>")]
pub struct TagSet {
    tags: SmallVec<[String; 5]>,
}

impl TagSet {
    /// Create a new tag set, sorting and removing duplicates.
    #[must_use]
    pub fn new(tags: SmallVec<[String; 5]>) -> Self {
        let mut set = Self { tags };

        set.tags.sort();
        set.tags.dedup();

        set
    }

    /// Create a new tag set from string slices.
    pub fn from_strs(tags: &[&str]) -> Self {
        Self::new(
            tags.iter()
                .map(ToString::to_string)
                .collect::<SmallVec<[String; 5]>>(),
        )
    }

    /// Check if the set contains a specific value.
    pub fn contains(&self, tag: &str) -> bool {
        self.tags
            .binary_search_by(|candidate| candidate.as_str().cmp(tag))
            .is_ok()
    }

    /// Check if this set shares at least one value with another set.
    pub fn intersects(&self, other: &Self) -> bool {
        // Both sides are sorted, so a single merge pass is enough.
        let mut left = self.tags.iter();
        let mut right = other.tags.iter();
        let mut left_tag = left.next();
        let mut right_tag = right.next();

        while let (Some(left_ref), Some(right_ref)) = (left_tag, right_tag) {
            match left_ref.cmp(right_ref) {
                Ordering::Equal => return true,
                Ordering::Less => left_tag = left.next(),
                Ordering::Greater => right_tag = right.next(),
            }
        }

        false
    }

    /// Iterate over the values in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// Check if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Number of values in the set.
    pub fn len(&self) -> usize {
        self.tags.len()
    }
}

impl From<Vec<String>> for TagSet {
    fn from(tags: Vec<String>) -> Self {
        Self::new(SmallVec::from_vec(tags))
    }
}

impl<'s> FromIterator<&'s str> for TagSet {
    fn from_iter<I: IntoIterator<Item = &'s str>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(ToString::to_string).collect())
    }
}

impl FromIterator<String> for TagSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
