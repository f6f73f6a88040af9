use std::collections::{BTreeMap, HashSet};

use log::info;

use crate::{
    data::Cell,
    dataset::{Column, Dataset},
    error::{PipelineError, Result},
    schema::CanonicalSchema,
};

/// Name of the synthetic source-year column appended by [`merge_years`].
pub const YEAR_COLUMN: &str = "year";

/// Columns surviving in every year, minus the schema's merge exclusions.
///
/// The result follows the column order of the earliest year, which after
/// projection is the canonical registry order.
pub fn common_columns(
    years: &BTreeMap<i32, Dataset>,
    schema: &CanonicalSchema,
) -> Result<Vec<String>> {
    let mut iter = years.values();
    let Some(first) = iter.next() else {
        return Err(PipelineError::EmptySchema(
            "no yearly datasets to merge".to_string(),
        ));
    };
    let mut shared = first
        .column_names()
        .into_iter()
        .collect::<HashSet<_>>();
    for dataset in iter {
        let names = dataset.column_names().into_iter().collect::<HashSet<_>>();
        shared.retain(|name| names.contains(name));
    }
    Ok(first
        .column_names()
        .into_iter()
        .filter(|name| shared.contains(name) && !schema.is_merge_excluded(name))
        .collect())
}

/// Concatenates all years on their common columns, oldest year first, and
/// tags every row with its source year.
pub fn merge_years(years: &BTreeMap<i32, Dataset>, schema: &CanonicalSchema) -> Result<Dataset> {
    let common = common_columns(years, schema)?;
    if common.is_empty() {
        return Err(PipelineError::EmptySchema(format!(
            "no column survives in all {} year(s)",
            years.len()
        )));
    }

    let total_rows = years.values().map(Dataset::row_count).sum::<usize>();
    let mut merged = common
        .iter()
        .map(|_| Vec::with_capacity(total_rows))
        .collect::<Vec<Vec<Cell>>>();
    let mut year_values = Vec::with_capacity(total_rows);

    for (year, dataset) in years {
        let projected = dataset.select(&common);
        for (target, column) in merged.iter_mut().zip(projected.into_columns()) {
            target.extend(column.values);
        }
        year_values.extend(std::iter::repeat_n(
            Cell::Number(f64::from(*year)),
            dataset.row_count(),
        ));
    }

    let mut columns = common
        .into_iter()
        .zip(merged)
        .map(|(name, values)| Column::new(name, values))
        .collect::<Vec<_>>();
    columns.push(Column::new(YEAR_COLUMN, year_values));
    let table = Dataset::from_columns(columns)?;
    info!(
        "Merged {} year(s) into {} row(s) x {} column(s)",
        years.len(),
        table.row_count(),
        table.column_count()
    );
    Ok(table)
}
