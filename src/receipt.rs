//! Receipt
//!
//! Terminal rendering of a [`PricingData`] evo trail.

use std::io;

use rust_decimal::Decimal;
use rusty_money::MoneyError;
use smallvec::{SmallVec, smallvec};
use tabled::{
    Table,
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Theme,
        object::{Columns, Rows, Segment},
        style::{BorderColor, Style},
    },
};
use thiserror::Error;

use crate::{discounts::DiscountMeta, evo::EvoEntry, pricing::PricingData};

/// Errors that can occur when rendering a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// Wrapper for money errors.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// IO error
    #[error("IO error")]
    IO,
}

impl PricingData<'_> {
    /// Writes the evo trail with a summary footer, then any skipped discounts, to `out`.
    ///
    /// # Errors
    ///
    /// Returns a [`ReceiptError`] if the output cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        let mut builder = Builder::default();
        let mut amount_colors: SmallVec<[(usize, Color); 16]> = smallvec![];

        builder.push_record(["#", "Discount", "Kind", "Units", "Amount", "Subtotal", "Total"]);

        for (step, entry) in self.evo().iter().enumerate() {
            builder.push_record(step_cells(step, entry));

            let color = if entry.is_baseline() || entry.total_discount.is_zero() {
                Color::FG_BRIGHT_BLACK
            } else {
                Color::FG_GREEN
            };

            amount_colors.push((step + 1, color));
        }

        let summary_row = self.evo().len() + 1;

        for record in summary_cells(self)? {
            builder.push_record(record);
        }

        let table = layout(builder, summary_row, amount_colors);

        writeln!(out, "\n{table}").map_err(|_err| ReceiptError::IO)?;

        write_errors(&mut out, self)
    }
}

fn step_cells(step: usize, entry: &EvoEntry<'_>) -> [String; 7] {
    let (name, kind, units) = if entry.is_baseline() {
        (
            "List price".to_string(),
            String::new(),
            entry.quantity_undiscounted.to_string(),
        )
    } else {
        let name = match (&entry.discount, &entry.discount_code) {
            (_, Some(code)) => format!("{code} (coupon)"),
            (Some(handle), None) => handle.clone(),
            (None, None) => String::new(),
        };

        (
            name,
            entry
                .discount_meta
                .map(DiscountMeta::as_str)
                .unwrap_or_default()
                .to_string(),
            entry.quantity_discounted.to_string(),
        )
    };

    let amount = if entry.is_baseline() {
        String::new()
    } else {
        format!("-{}", entry.total_discount)
    };

    [
        step.to_string(),
        name,
        kind,
        units,
        amount,
        entry.subtotal.to_string(),
        entry.total.to_string(),
    ]
}

/// Summary footer rows: label under "Discount", value under "Total".
fn summary_cells(data: &PricingData<'_>) -> Result<[[String; 7]; 4], ReceiptError> {
    let shipping = data.total().sub(data.subtotal())?;

    let row = |label: &str, note: String, value: String| {
        [
            String::new(),
            label.to_string(),
            String::new(),
            String::new(),
            note,
            String::new(),
            value,
        ]
    };

    Ok([
        row("Subtotal:", String::new(), data.subtotal_undiscounted().to_string()),
        row(
            "Discount:",
            format!("({:.2}%)", discount_points(data)),
            format!("-{}", data.subtotal_discount()),
        ),
        row("Shipping:", String::new(), shipping.to_string()),
        row("Total:", String::new(), data.total().to_string()),
    ])
}

fn layout(
    builder: Builder,
    summary_row: usize,
    amount_colors: SmallVec<[(usize, Color); 16]>,
) -> Table {
    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());
    let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(1, separator);
    theme.insert_horizontal_line(summary_row, separator);

    table.with(theme);
    table.modify(Segment::all(), BorderColor::filled(Color::FG_BRIGHT_BLACK));
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Rows::last(), Color::BOLD);
    table.modify(Columns::new(3..7), Alignment::right());

    for (row, color) in amount_colors {
        table.modify((row, 4), color);
    }

    table
}

fn write_errors(out: &mut impl io::Write, data: &PricingData<'_>) -> Result<(), ReceiptError> {
    if data.errors().is_empty() {
        return Ok(());
    }

    writeln!(out, " \x1b[33mSkipped discounts:\x1b[0m").map_err(|_err| ReceiptError::IO)?;

    for error in data.errors() {
        writeln!(out, "   {}: {}", error.discount_code, error.message())
            .map_err(|_err| ReceiptError::IO)?;
    }

    writeln!(out).map_err(|_err| ReceiptError::IO)
}

/// Share of the undiscounted subtotal taken off, in percent points.
fn discount_points(data: &PricingData<'_>) -> Decimal {
    let undiscounted = data.subtotal_undiscounted().to_minor_units();

    if undiscounted == 0 {
        return Decimal::ZERO;
    }

    (Decimal::from(data.subtotal_discount().to_minor_units()) * Decimal::ONE_HUNDRED
        / Decimal::from(undiscounted))
    .round_dp(2)
}
