//! Pricing Demo
//!
//! Loads a fixture set (products, cart and discount catalog), prices the cart and prints the
//! audit trail as a receipt.
//!
//! Run with: `cargo run --example pricing -- --fixture robots --coupon HEADSTART`
//!
//! Set `RUST_LOG=rebate=debug` to see each discount as it is applied.

use std::{io, time::Instant};

use anyhow::Result;
use clap::Parser;
use humanize_duration::{Truncate, prelude::DurationExt};
use tracing_subscriber::{
    EnvFilter, Registry,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use rebate::{
    config::EngineConfig,
    fixtures::Fixture,
    pricing::PricingEngine,
    utils::{DemoArgs, LogFormat},
};

/// Pricing Demo
#[expect(clippy::print_stdout, reason = "Example code")]
pub fn main() -> Result<()> {
    let args = DemoArgs::parse();

    init_logging(args.log_format)?;

    let config = match &args.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };

    let fixture = Fixture::from_set(&args.fixture)?;
    let engine = PricingEngine::new(config);

    let start = Instant::now();
    let data = fixture.price(&engine, args.coupons.as_slice())?;
    let elapsed = start.elapsed();

    data.write_to(io::stdout())?;

    println!(" Priced in {}", elapsed.human(Truncate::Nano));

    Ok(())
}

fn init_logging(format: LogFormat) -> Result<()> {
    match format {
        LogFormat::Compact => init_with_layer(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        ),
        LogFormat::Json => init_with_layer(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(io::stderr)
                .with_current_span(true)
                .with_span_list(true)
                .with_target(true),
        ),
    }
}

fn init_with_layer<L>(fmt_layer: L) -> Result<()>
where
    L: Layer<Registry> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_err| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .try_init()?;

    Ok(())
}
