//! Top-k indicator encoding of the categorical columns.

use std::collections::HashSet;

use itertools::Itertools;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    data::{Cell, MULTI_VALUE_DELIMITER, OTHER, UNKNOWN},
    dataset::{Column, Dataset},
    error::{PipelineError, Result},
    frequency::FrequencyTable,
};

/// Always kept out of encoding; downstream target construction groups by it.
pub const ALWAYS_EXCLUDED: &str = "country";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncodingKind {
    MultiHot,
    OneHot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedField {
    pub field: String,
    pub kind: EncodingKind,
    pub indicators: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeReport {
    pub fields: Vec<EncodedField>,
    pub pruned: Vec<String>,
}

impl EncodeReport {
    pub fn indicator_count(&self) -> usize {
        self.fields.iter().map(|f| f.indicators.len()).sum()
    }
}

fn is_multi_valued(column: &Column) -> bool {
    column.values.iter().any(|cell| match cell {
        Cell::List(_) => true,
        Cell::Text(text) => text.contains(MULTI_VALUE_DELIMITER),
        _ => false,
    })
}

/// Choices of one cell with nulls read as `Unknown`.
fn tokens(cell: &Cell) -> Vec<String> {
    match cell {
        Cell::Null => vec![UNKNOWN.to_string()],
        Cell::List(items) => items
            .iter()
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty())
            .collect(),
        other => other
            .as_display()
            .split(MULTI_VALUE_DELIMITER)
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .collect(),
    }
}

fn label(cell: &Cell) -> String {
    match cell {
        Cell::Null => UNKNOWN.to_string(),
        other => other.as_display(),
    }
}

fn indicator(name: String, hits: impl Iterator<Item = bool>) -> Column {
    Column::new(
        name,
        hits.map(|hit| Cell::Number(if hit { 1.0 } else { 0.0 }))
            .collect(),
    )
}

fn encode_multi_valued(column: &Column, top_k: usize) -> Vec<Column> {
    let per_row = column.values.iter().map(tokens).collect::<Vec<_>>();
    // Ranked by mentions: a choice repeated within one answer counts each time.
    let counts = FrequencyTable::from_values(per_row.iter().flatten());
    debug!(
        "'{}': {} distinct choice(s) over {} mention(s)",
        column.name,
        counts.distinct(),
        counts.total()
    );
    let members = per_row
        .iter()
        .map(|row| row.iter().collect::<HashSet<_>>())
        .collect::<Vec<_>>();
    counts
        .top(top_k)
        .into_iter()
        .map(|token| {
            indicator(
                format!("{}_{token}", column.name),
                members.iter().map(|row| row.contains(&token)),
            )
        })
        .collect()
}

fn encode_single_valued(column: &Column, top_k: usize) -> Vec<Column> {
    let labels = column.values.iter().map(label).collect::<Vec<_>>();
    let keep = FrequencyTable::from_values(&labels)
        .top(top_k)
        .into_iter()
        .collect::<HashSet<_>>();
    let reduced = labels
        .into_iter()
        .map(|value| {
            if keep.contains(&value) {
                value
            } else {
                OTHER.to_string()
            }
        })
        .collect::<Vec<_>>();
    reduced
        .iter()
        .unique()
        .sorted()
        .map(|value| {
            indicator(
                format!("{}_{value}", column.name),
                reduced.iter().map(|r| r == value),
            )
        })
        .collect()
}

/// Replaces every categorical column outside `exclude` with 0/1 indicators.
///
/// Multi-valued columns get one multi-hot column per top-`k` choice and no
/// overflow column; choices are ranked by total mentions, so a choice listed
/// twice in one answer counts twice. Single-valued columns keep their top-`k` labels, fold the
/// rest into `Other`, and get one one-hot column per remaining label in
/// sorted order. Numeric columns pass through. Indicator columns are appended
/// after the surviving columns in encoding order; an indicator whose name is
/// already taken fails with [`PipelineError::ColumnCollision`].
pub fn encode_top_k(
    dataset: &Dataset,
    top_k: usize,
    exclude: &[String],
) -> Result<(Dataset, EncodeReport)> {
    let mut skip = exclude.iter().map(String::as_str).collect::<HashSet<_>>();
    skip.insert(ALWAYS_EXCLUDED);

    let targets = dataset
        .columns()
        .iter()
        .filter(|c| !skip.contains(c.name.as_str()))
        .filter(|c| c.categories.is_some() || c.is_categorical())
        .collect::<Vec<_>>();

    let mut report = EncodeReport::default();
    let mut output = dataset.clone();
    for column in &targets {
        output.remove_column(&column.name);
    }

    for column in targets {
        let (kind, encoded) = if is_multi_valued(column) {
            (EncodingKind::MultiHot, encode_multi_valued(column, top_k))
        } else {
            (EncodingKind::OneHot, encode_single_valued(column, top_k))
        };
        debug!(
            "Encoded '{}' as {:?} into {} indicator(s)",
            column.name,
            kind,
            encoded.len()
        );
        let mut indicators = Vec::with_capacity(encoded.len());
        for col in encoded {
            if output.contains(&col.name) {
                return Err(PipelineError::ColumnCollision {
                    column: col.name,
                    field: column.name.clone(),
                });
            }
            indicators.push(col.name.clone());
            output.set_column(col)?;
        }
        report.fields.push(EncodedField {
            field: column.name.clone(),
            kind,
            indicators,
        });
    }

    info!(
        "Encoded {} categorical column(s) into {} indicator column(s); table is now {} x {}",
        report.fields.len(),
        report.indicator_count(),
        output.row_count(),
        output.column_count()
    );
    Ok((output, report))
}

/// Drops indicator columns for the `Other` and `Unknown` buckets.
pub fn prune_overflow_indicators(dataset: &Dataset) -> (Dataset, Vec<String>) {
    let other_suffix = format!("_{OTHER}");
    let unknown_suffix = format!("_{UNKNOWN}");
    let mut pruned = Vec::new();
    let mut output = dataset.clone();
    output.retain_columns(|column| {
        let overflow =
            column.name.ends_with(&other_suffix) || column.name.ends_with(&unknown_suffix);
        if overflow {
            pruned.push(column.name.clone());
        }
        !overflow
    });
    info!("Pruned {} overflow indicator column(s)", pruned.len());
    (output, pruned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbers(column: &Column) -> Vec<f64> {
        column.values.iter().filter_map(Cell::as_number).collect()
    }

    #[test]
    fn multi_valued_columns_keep_only_top_tokens() {
        let dataset = Dataset::from_columns(vec![Column::new(
            "field",
            vec![
                Cell::List(vec!["A".into(), "B".into()]),
                Cell::List(vec!["B".into(), "C".into()]),
                Cell::List(vec!["A".into()]),
            ],
        )])
        .unwrap();
        let (out, report) = encode_top_k(&dataset, 2, &[]).unwrap();
        assert_eq!(out.column_names(), vec!["field_A", "field_B"]);
        assert_eq!(numbers(out.column("field_A").unwrap()), vec![1.0, 0.0, 1.0]);
        assert_eq!(numbers(out.column("field_B").unwrap()), vec![1.0, 1.0, 0.0]);
        assert_eq!(report.fields[0].kind, EncodingKind::MultiHot);
    }

    #[test]
    fn delimited_text_is_split_and_trimmed() {
        let dataset = Dataset::from_columns(vec![Column::new(
            "langs_worked",
            vec![Cell::text("Rust; Go"), Cell::text("Rust"), Cell::Null],
        )])
        .unwrap();
        let (out, _) = encode_top_k(&dataset, 5, &[]).unwrap();
        assert_eq!(
            out.column_names(),
            vec!["langs_worked_Rust", "langs_worked_Go", "langs_worked_Unknown"]
        );
        assert_eq!(
            numbers(out.column("langs_worked_Unknown").unwrap()),
            vec![0.0, 0.0, 1.0]
        );
    }

    #[test]
    fn single_valued_overflow_goes_to_other() {
        let dataset = Dataset::from_columns(vec![
            Column::new(
                "employment",
                vec![
                    Cell::text("Full-time"),
                    Cell::text("Full-time"),
                    Cell::text("Retired"),
                    Cell::Null,
                    Cell::Null,
                ],
            ),
            Column::new("compensation_total", vec![Cell::Number(1.0); 5]),
        ])
        .unwrap();
        let exclude = vec!["compensation_total".to_string()];
        let (out, report) = encode_top_k(&dataset, 2, &exclude).unwrap();
        assert_eq!(
            out.column_names(),
            vec![
                "compensation_total",
                "employment_Full-time",
                "employment_Other",
                "employment_Unknown"
            ]
        );
        assert_eq!(
            numbers(out.column("employment_Other").unwrap()),
            vec![0.0, 0.0, 1.0, 0.0, 0.0]
        );
        assert_eq!(report.fields[0].kind, EncodingKind::OneHot);
    }

    #[test]
    fn country_and_numeric_columns_pass_through() {
        let dataset = Dataset::from_columns(vec![
            Column::new("country", vec![Cell::text("Peru"), Cell::text("Chile")]),
            Column::new("age", vec![Cell::Number(20.0), Cell::Null]),
        ])
        .unwrap();
        let (out, report) = encode_top_k(&dataset, 3, &[]).unwrap();
        assert_eq!(out, dataset);
        assert!(report.fields.is_empty());
    }

    #[test]
    fn repeated_choices_count_once_per_mention() {
        // "Angular" has three mentions in one row; "React" appears in two rows.
        let dataset = Dataset::from_columns(vec![Column::new(
            "webframe_worked",
            vec![
                Cell::text("Angular; Angular;Angular"),
                Cell::text("React"),
                Cell::text("React"),
            ],
        )])
        .unwrap();
        let (out, _) = encode_top_k(&dataset, 1, &[]).unwrap();
        assert_eq!(out.column_names(), vec!["webframe_worked_Angular"]);
        assert_eq!(
            numbers(out.column("webframe_worked_Angular").unwrap()),
            vec![1.0, 0.0, 0.0]
        );
    }

    #[test]
    fn indicator_name_clash_is_an_error() {
        let dataset = Dataset::from_columns(vec![
            Column::new("org_size", vec![Cell::text("Large"), Cell::text("Small")]),
            Column::new("org_size_Large", vec![Cell::Number(1.0), Cell::Number(0.0)]),
        ])
        .unwrap();
        let err = encode_top_k(&dataset, 5, &[]).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::ColumnCollision { ref column, ref field }
                if column == "org_size_Large" && field == "org_size"
        ));
        assert!(dataset.contains("org_size_Large"));
    }

    #[test]
    fn overflow_indicators_can_be_pruned() {
        let dataset = Dataset::from_columns(vec![
            Column::new("employment_Other", vec![Cell::Number(1.0)]),
            Column::new("employment_Unknown", vec![Cell::Number(0.0)]),
            Column::new("employment_Retired", vec![Cell::Number(0.0)]),
        ])
        .unwrap();
        let (out, pruned) = prune_overflow_indicators(&dataset);
        assert_eq!(out.column_names(), vec!["employment_Retired"]);
        assert_eq!(pruned.len(), 2);
    }
}
