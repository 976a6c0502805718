//! Rebate prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    catalog::{DiscountSelection, partition_discounts},
    config::{ConfigError, EngineConfig, FixedAmountScope, UnitSelection},
    discounts::{
        BulkExtra, BundleExtra, BuyXGetYExtra, Discount, DiscountApplication, DiscountDetails,
        DiscountError, DiscountIssue, DiscountMeta, OrderExtra, RegularExtra,
    },
    evo::{EvoEntry, EvoLine},
    filters::{Filter, FilterMeta, ValueRange},
    items::LineItem,
    pricing::{
        PricingData, PricingEngine, PricingError, PricingRequest, ShippingMethod,
        calculate_pricing,
    },
    products::{CollectionRef, ProductSnapshot},
    receipt::ReceiptError,
    tags::TagSet,
};
