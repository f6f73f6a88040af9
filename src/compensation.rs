//! Compensation cleaning and currency conversion.

use std::collections::BTreeMap;

use clap::ValueEnum;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::{
    data::{Cell, cell_to_number},
    dataset::{Column, Dataset},
    error::{PipelineError, Result},
    fx::FxTable,
};

pub const CURRENCY_COLUMN: &str = "currency";
pub const COMPENSATION_COLUMN: &str = "compensation_total";

const STAGE: &str = "compensation processing";

/// What to do with rows whose currency code has no FX rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum UnmappedCurrencyPolicy {
    /// Convert with the table's fallback multiplier and record the code.
    #[default]
    AssumeUsd,
    /// Remove the affected rows.
    Drop,
    /// Abort the run.
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompensationOptions {
    pub min: f64,
    pub max: f64,
    pub unmapped: UnmappedCurrencyPolicy,
}

impl Default for CompensationOptions {
    fn default() -> Self {
        Self {
            min: 1_000.0,
            max: 350_000.0,
            unmapped: UnmappedCurrencyPolicy::AssumeUsd,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompensationReport {
    pub rows_in: usize,
    pub dropped_null_currency: usize,
    pub dropped_null_compensation: usize,
    pub dropped_unparseable: usize,
    pub dropped_out_of_range: usize,
    pub dropped_unmapped_currency: usize,
    /// Currency codes converted with the fallback rate, with their row counts.
    pub unmapped_currencies: BTreeMap<String, usize>,
    pub mean_before: Option<f64>,
    pub mean_after: Option<f64>,
    pub rows_out: usize,
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn require<'a>(dataset: &'a Dataset, name: &str) -> Result<&'a Column> {
    dataset
        .column(name)
        .ok_or_else(|| PipelineError::MissingColumn {
            column: name.to_string(),
            stage: STAGE,
        })
}

fn drop_nulls(dataset: &Dataset, name: &str) -> Result<(Dataset, usize)> {
    let keep = require(dataset, name)?
        .values
        .iter()
        .map(|cell| !cell.is_null())
        .collect::<Vec<_>>();
    let dropped = keep.iter().filter(|k| !**k).count();
    Ok((dataset.filter_rows(&keep), dropped))
}

/// Rows without a currency go first, then rows without compensation.
pub fn drop_missing_currency(dataset: &Dataset) -> Result<(Dataset, usize)> {
    let (filtered, dropped) = drop_nulls(dataset, CURRENCY_COLUMN)?;
    info!(
        "Rows after filtering null currency: {} (dropped {dropped})",
        filtered.row_count()
    );
    Ok((filtered, dropped))
}

/// Parses, range-filters and converts `compensation_total` to USD, then drops
/// the `currency` column.
///
/// The range check runs on the amounts as reported, before conversion, and is
/// inclusive at both ends.
pub fn process_compensation(
    dataset: &Dataset,
    fx: &FxTable,
    options: &CompensationOptions,
) -> Result<(Dataset, CompensationReport)> {
    require(dataset, COMPENSATION_COLUMN)?;
    let mut report = CompensationReport {
        rows_in: dataset.row_count(),
        ..CompensationReport::default()
    };

    let (table, dropped) = drop_missing_currency(dataset)?;
    report.dropped_null_currency = dropped;
    let (table, dropped) = drop_nulls(&table, COMPENSATION_COLUMN)?;
    report.dropped_null_compensation = dropped;
    info!("Rows with non-null compensation: {}", table.row_count());

    let parsed = require(&table, COMPENSATION_COLUMN)?
        .values
        .iter()
        .map(cell_to_number)
        .collect::<Vec<_>>();
    let keep = parsed.iter().map(Option::is_some).collect::<Vec<_>>();
    report.dropped_unparseable = keep.iter().filter(|k| !**k).count();
    let mut table = table.filter_rows(&keep);
    let mut amounts = parsed.into_iter().flatten().collect::<Vec<_>>();
    info!(
        "Rows after parsing to numbers: {} (dropped {})",
        amounts.len(),
        report.dropped_unparseable
    );

    let keep = amounts
        .iter()
        .map(|v| *v >= options.min && *v <= options.max)
        .collect::<Vec<_>>();
    report.dropped_out_of_range = keep.iter().filter(|k| !**k).count();
    table = table.filter_rows(&keep);
    amounts = amounts
        .into_iter()
        .zip(&keep)
        .filter(|(_, k)| **k)
        .map(|(v, _)| v)
        .collect();
    info!(
        "Rows after [{}, {}] filter: {} (dropped {})",
        options.min,
        options.max,
        amounts.len(),
        report.dropped_out_of_range
    );

    report.mean_before = mean(&amounts);
    let codes = require(&table, CURRENCY_COLUMN)?
        .values
        .iter()
        .map(Cell::as_display)
        .collect::<Vec<_>>();

    let mut converted = Vec::with_capacity(amounts.len());
    let mut keep = Vec::with_capacity(amounts.len());
    for (amount, code) in amounts.iter().zip(&codes) {
        let rate = fx.lookup(code);
        if rate.is_default() {
            *report
                .unmapped_currencies
                .entry(code.trim().to_string())
                .or_default() += 1;
            if options.unmapped == UnmappedCurrencyPolicy::Drop {
                keep.push(false);
                continue;
            }
        }
        keep.push(true);
        converted.push(Cell::Number(amount * rate.multiplier()));
    }

    for (code, rows) in &report.unmapped_currencies {
        match options.unmapped {
            UnmappedCurrencyPolicy::Error => {
                return Err(PipelineError::UnmappedCurrency {
                    code: code.clone(),
                    rows: *rows,
                });
            }
            UnmappedCurrencyPolicy::Drop => {
                warn!("Currency '{code}' has no FX rate; dropping {rows} row(s)")
            }
            UnmappedCurrencyPolicy::AssumeUsd => warn!(
                "Currency '{code}' has no FX rate; {rows} row(s) converted with the fallback rate {}",
                fx.fallback
            ),
        }
    }

    if options.unmapped == UnmappedCurrencyPolicy::Drop {
        report.dropped_unmapped_currency = keep.iter().filter(|k| !**k).count();
        table = table.filter_rows(&keep);
    }
    table.set_column(Column::new(COMPENSATION_COLUMN, converted.clone()))?;
    table.remove_column(CURRENCY_COLUMN);

    let after = converted.iter().filter_map(Cell::as_number).collect::<Vec<_>>();
    report.mean_after = mean(&after);
    report.rows_out = table.row_count();
    info!(
        "Average compensation before conversion: {:.2}, after: {:.2}",
        report.mean_before.unwrap_or_default(),
        report.mean_after.unwrap_or_default()
    );
    Ok((table, report))
}
