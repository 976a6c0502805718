//! Rebate
//!
//! Rebate is a deterministic discount and pricing evaluation engine. It takes a cart of line
//! items, a catalog of automatic and coupon discounts, and an optional shipping method, and
//! produces an itemised [`PricingData`](pricing::PricingData) with an audit trail recording how
//! each discount changed the total.

pub mod catalog;
pub mod config;
pub mod discounts;
pub mod eligibility;
pub mod evo;
pub mod filters;
pub mod fixtures;
pub mod items;
pub mod prelude;
pub mod pricing;
pub mod products;
pub mod receipt;
pub mod stacking;
pub mod strategies;
pub mod tags;
pub mod utils;

pub use pricing::calculate_pricing;
