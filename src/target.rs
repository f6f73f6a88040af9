//! Inputs for downstream modelling: a null summary of the merged table and
//! the country-normalised salary target.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    compensation::COMPENSATION_COLUMN,
    data::Cell,
    dataset::{Column, Dataset},
    error::{PipelineError, Result},
};

pub const NORMALIZED_TARGET_COLUMN: &str = "salary_normalized";

const COUNTRY_COLUMN: &str = "country";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NullSummaryRow {
    pub column: String,
    pub nulls_before: usize,
    pub nulls_after: usize,
    pub difference: usize,
}

/// Null counts per column, before and after keeping only rows that report a
/// compensation.
pub fn null_summary(dataset: &Dataset) -> Result<Vec<NullSummaryRow>> {
    let compensation =
        dataset
            .column(COMPENSATION_COLUMN)
            .ok_or_else(|| PipelineError::MissingColumn {
                column: COMPENSATION_COLUMN.to_string(),
                stage: "null summary",
            })?;
    let keep = compensation
        .values
        .iter()
        .map(|cell| !cell.is_null())
        .collect::<Vec<_>>();
    let filtered = dataset.filter_rows(&keep);
    Ok(dataset
        .columns()
        .iter()
        .zip(filtered.columns())
        .map(|(before, after)| {
            let nulls_before = before.null_count();
            let nulls_after = after.null_count();
            NullSummaryRow {
                column: before.name.clone(),
                nulls_before,
                nulls_after,
                difference: nulls_before - nulls_after,
            }
        })
        .collect())
}

/// Appends `salary_normalized`: each compensation divided by the mean
/// compensation of the row's country. Rows without a number stay null.
pub fn attach_country_normalized_target(dataset: &Dataset) -> Result<Dataset> {
    let missing = |column: &str| PipelineError::MissingColumn {
        column: column.to_string(),
        stage: "target construction",
    };
    let country = dataset
        .column(COUNTRY_COLUMN)
        .ok_or_else(|| missing(COUNTRY_COLUMN))?;
    let compensation = dataset
        .column(COMPENSATION_COLUMN)
        .ok_or_else(|| missing(COMPENSATION_COLUMN))?;

    let mut sums: HashMap<String, (f64, usize)> = HashMap::new();
    for (c, amount) in country.values.iter().zip(&compensation.values) {
        if let Some(value) = amount.as_number() {
            let entry = sums.entry(c.as_display()).or_default();
            entry.0 += value;
            entry.1 += 1;
        }
    }

    let values = country
        .values
        .iter()
        .zip(&compensation.values)
        .map(|(c, amount)| {
            let average = sums
                .get(&c.as_display())
                .map(|(sum, n)| sum / *n as f64)
                .filter(|avg| *avg != 0.0);
            match (amount.as_number(), average) {
                (Some(value), Some(avg)) => Cell::Number(value / avg),
                _ => Cell::Null,
            }
        })
        .collect();

    let mut output = dataset.clone();
    output.set_column(Column::new(NORMALIZED_TARGET_COLUMN, values))?;
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn salaries() -> Dataset {
        Dataset::from_columns(vec![
            Column::new(
                COUNTRY_COLUMN,
                vec![
                    Cell::text("Peru"),
                    Cell::text("Peru"),
                    Cell::text("Chile"),
                    Cell::text("Chile"),
                ],
            ),
            Column::new(
                COMPENSATION_COLUMN,
                vec![
                    Cell::Number(1000.0),
                    Cell::Number(3000.0),
                    Cell::Number(5000.0),
                    Cell::Null,
                ],
            ),
            Column::new(
                "age",
                vec![Cell::Null, Cell::Number(30.0), Cell::Null, Cell::Null],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn target_divides_by_country_mean() {
        let out = attach_country_normalized_target(&salaries()).unwrap();
        assert_eq!(
            out.column(NORMALIZED_TARGET_COLUMN).unwrap().values,
            vec![
                Cell::Number(0.5),
                Cell::Number(1.5),
                Cell::Number(1.0),
                Cell::Null
            ]
        );
    }

    #[test]
    fn null_summary_compares_against_reported_compensation() {
        let summary = null_summary(&salaries()).unwrap();
        let age = summary.iter().find(|row| row.column == "age").unwrap();
        assert_eq!(age.nulls_before, 3);
        assert_eq!(age.nulls_after, 2);
        assert_eq!(age.difference, 1);
        let comp = summary
            .iter()
            .find(|row| row.column == COMPENSATION_COLUMN)
            .unwrap();
        assert_eq!(comp.nulls_after, 0);
    }
}
