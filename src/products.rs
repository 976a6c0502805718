//! Products

use rusty_money::{Money, iso::Currency};
use slotmap::new_key_type;
use smallvec::SmallVec;

use crate::tags::TagSet;

new_key_type! {
    /// Product Key
    pub struct ProductKey;
}

/// Reference to a collection a product belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRef {
    /// Collection id
    pub id: String,

    /// Collection handle
    pub handle: String,
}

impl CollectionRef {
    /// Create a new collection reference.
    pub fn new(id: impl Into<String>, handle: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            handle: handle.into(),
        }
    }

    /// Whether the collection id or handle appears in `keys`.
    pub fn is_listed_in(&self, keys: &TagSet) -> bool {
        keys.contains(&self.id) || keys.contains(&self.handle)
    }
}

/// The subset of a catalog product needed to evaluate filters.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSnapshot<'a> {
    /// Product id
    pub id: String,

    /// Product handle
    pub handle: String,

    /// Unit price
    pub price: Money<'a, Currency>,

    /// Product tags
    pub tags: TagSet,

    /// Collections the product belongs to
    pub collections: SmallVec<[CollectionRef; 2]>,
}

impl<'a> ProductSnapshot<'a> {
    /// Create a snapshot with no tags or collections.
    pub fn new(id: impl Into<String>, handle: impl Into<String>, price: Money<'a, Currency>) -> Self {
        Self {
            id: id.into(),
            handle: handle.into(),
            price,
            tags: TagSet::default(),
            collections: SmallVec::new(),
        }
    }

    /// Replace the snapshot's tags.
    #[must_use]
    pub fn with_tags(mut self, tags: TagSet) -> Self {
        self.tags = tags;
        self
    }

    /// Replace the snapshot's collections.
    #[must_use]
    pub fn with_collections(mut self, collections: impl IntoIterator<Item = CollectionRef>) -> Self {
        self.collections = collections.into_iter().collect();
        self
    }

    /// Whether any of the product's collections is listed in `keys` by id or handle.
    pub fn in_any_collection(&self, keys: &TagSet) -> bool {
        self.collections
            .iter()
            .any(|collection| collection.is_listed_in(keys))
    }
}
