use std::collections::{BTreeMap, HashSet};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    data::{Cell, parse_number},
    dataset::{Column, Dataset},
};

/// Never coerced, whatever the configured identifier list says.
pub const ALWAYS_EXEMPT: &str = "country";

/// Per-year outcome of numeric coercion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoercionReport {
    pub year: i32,
    /// Coerced columns with the number of cells that failed to parse and became null.
    pub coerced: BTreeMap<String, usize>,
    pub left_textual: Vec<String>,
}

enum Verdict {
    Unchanged,
    Textual,
    Coerce,
}

fn inspect(column: &Column, numeric_ratio: f64) -> Verdict {
    let mut text_cells = 0usize;
    let mut parsed = 0usize;
    for cell in &column.values {
        match cell {
            Cell::List(_) => return Verdict::Textual,
            Cell::Text(raw) => {
                text_cells += 1;
                if parse_number(raw).is_ok() {
                    parsed += 1;
                }
            }
            Cell::Null | Cell::Number(_) => {}
        }
    }
    if text_cells == 0 {
        return Verdict::Unchanged;
    }
    if parsed as f64 / text_cells as f64 >= numeric_ratio {
        Verdict::Coerce
    } else {
        Verdict::Textual
    }
}

/// Converts numeric-looking columns to numbers.
///
/// A column qualifies when at least `numeric_ratio` of its text cells parse.
/// Inside a qualifying column every cell that does not parse becomes null;
/// nothing here ever fails. Exempt columns, columns holding pre-split lists and
/// columns without text are returned as they are. `country` is always exempt.
pub fn coerce_numeric(
    dataset: &Dataset,
    exempt: &[String],
    numeric_ratio: f64,
) -> (Dataset, CoercionReport) {
    let mut exempt = exempt.iter().map(String::as_str).collect::<HashSet<_>>();
    exempt.insert(ALWAYS_EXEMPT);
    let mut report = CoercionReport::default();
    let mut output = dataset.clone();

    for column in dataset.columns() {
        if exempt.contains(column.name.as_str()) {
            continue;
        }
        match inspect(column, numeric_ratio) {
            Verdict::Unchanged => {}
            Verdict::Textual => report.left_textual.push(column.name.clone()),
            Verdict::Coerce => {
                let mut failures = 0usize;
                let values = column
                    .values
                    .iter()
                    .map(|cell| match cell {
                        Cell::Text(raw) => match parse_number(raw) {
                            Ok(value) => Cell::Number(value),
                            Err(err) => {
                                debug!("{}: {err}", column.name);
                                failures += 1;
                                Cell::Null
                            }
                        },
                        other => other.clone(),
                    })
                    .collect();
                if let Some(target) = output.column_mut(&column.name) {
                    target.values = values;
                }
                report.coerced.insert(column.name.clone(), failures);
            }
        }
    }
    (output, report)
}

pub fn coerce_years(
    years: &BTreeMap<i32, Dataset>,
    exempt: &[String],
    numeric_ratio: f64,
) -> (BTreeMap<i32, Dataset>, Vec<CoercionReport>) {
    let mut out = BTreeMap::new();
    let mut reports = Vec::with_capacity(years.len());
    for (year, dataset) in years {
        let (coerced, mut report) = coerce_numeric(dataset, exempt, numeric_ratio);
        report.year = *year;
        info!(
            "Year {year}: coerced {} column(s) to numbers, {} left as text",
            report.coerced.len(),
            report.left_textual.len()
        );
        out.insert(*year, coerced);
        reports.push(report);
    }
    (out, reports)
}
