//! Utils

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Log output format for the demos
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Single-line human readable output
    #[default]
    Compact,

    /// One JSON object per event
    Json,
}

/// Arguments for the pricing demo
#[derive(Debug, Parser)]
pub struct DemoArgs {
    /// Fixture set to use for the products, cart & discounts
    #[clap(short, long, default_value = "robots")]
    pub fixture: String,

    /// Extra coupon codes to redeem on top of the cart's own
    #[clap(short, long = "coupon")]
    pub coupons: Vec<String>,

    /// Engine configuration file (YAML)
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Log output format
    #[clap(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}
