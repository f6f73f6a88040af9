//! In-memory tabular model shared by every pipeline stage.
//!
//! A [`Dataset`] is an ordered list of named [`Column`]s of equal length.
//! Stages take a dataset by reference and return a new one, so a table that
//! is still referenced elsewhere is never modified.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    data::Cell,
    error::{PipelineError, Result},
};

/// Fixed label set attached to a column after categorical normalisation.
/// When `ordered` is set the label order is the ordinal ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySet {
    pub labels: Vec<String>,
    pub ordered: bool,
}

impl CategorySet {
    pub fn ordered(labels: &[&str]) -> Self {
        Self {
            labels: labels.iter().map(|s| s.to_string()).collect(),
            ordered: true,
        }
    }

    pub fn unordered(labels: &[&str]) -> Self {
        Self {
            labels: labels.iter().map(|s| s.to_string()).collect(),
            ordered: false,
        }
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Cell>,
    #[serde(default)]
    pub categories: Option<CategorySet>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Cell>) -> Self {
        Self {
            name: name.into(),
            values,
            categories: None,
        }
    }

    pub fn nulls(name: impl Into<String>, rows: usize) -> Self {
        Self::new(name, vec![Cell::Null; rows])
    }

    pub fn with_categories(mut self, categories: CategorySet) -> Self {
        self.categories = Some(categories);
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.values.iter().filter(|c| c.is_null()).count()
    }

    pub fn non_null_count(&self) -> usize {
        self.len() - self.null_count()
    }

    /// Fraction of non-null cells. An empty column has no coverage.
    pub fn coverage(&self) -> f64 {
        if self.values.is_empty() {
            0.0
        } else {
            self.non_null_count() as f64 / self.values.len() as f64
        }
    }

    pub fn is_all_null(&self) -> bool {
        self.values.iter().all(Cell::is_null)
    }

    pub fn distinct_non_null(&self) -> usize {
        self.values
            .iter()
            .filter(|c| !c.is_null())
            .map(Cell::as_display)
            .collect::<HashSet<_>>()
            .len()
    }

    /// True when at least one cell holds text or a list of choices.
    pub fn is_categorical(&self) -> bool {
        self.values.iter().any(Cell::is_textual)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    rows: usize,
    columns: Vec<Column>,
}

impl Dataset {
    pub fn empty(rows: usize) -> Self {
        Self {
            rows,
            columns: Vec::new(),
        }
    }

    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let rows = columns.first().map(Column::len).unwrap_or(0);
        let mut dataset = Self::empty(rows);
        for column in columns {
            dataset.set_column(column)?;
        }
        Ok(dataset)
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// Replaces the column with the same name in place, or appends it.
    pub fn set_column(&mut self, column: Column) -> Result<()> {
        if column.len() != self.rows {
            return Err(PipelineError::ShapeMismatch(format!(
                "column '{}' has {} value(s) but the dataset has {} row(s)",
                column.name,
                column.len(),
                self.rows
            )));
        }
        match self.position(&column.name) {
            Some(idx) => self.columns[idx] = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    pub fn remove_column(&mut self, name: &str) -> Option<Column> {
        let idx = self.position(name)?;
        Some(self.columns.remove(idx))
    }

    pub fn retain_columns<F>(&mut self, mut keep: F)
    where
        F: FnMut(&Column) -> bool,
    {
        self.columns.retain(|c| keep(c));
    }

    /// Copies the named columns in the given order; names that are absent
    /// become all-null columns.
    pub fn select(&self, names: &[String]) -> Dataset {
        let columns = names
            .iter()
            .map(|name| {
                self.column(name)
                    .cloned()
                    .unwrap_or_else(|| Column::nulls(name.clone(), self.rows))
            })
            .collect();
        Dataset {
            rows: self.rows,
            columns,
        }
    }

    /// Keeps the rows whose mask entry is `true`, preserving order.
    pub fn filter_rows(&self, keep: &[bool]) -> Dataset {
        debug_assert_eq!(keep.len(), self.rows);
        let rows = keep.iter().filter(|k| **k).count();
        let columns = self
            .columns
            .iter()
            .map(|column| Column {
                name: column.name.clone(),
                values: column
                    .values
                    .iter()
                    .zip(keep)
                    .filter(|(_, k)| **k)
                    .map(|(v, _)| v.clone())
                    .collect(),
                categories: column.categories.clone(),
            })
            .collect();
        Dataset { rows, columns }
    }

    pub fn row(&self, index: usize) -> Vec<&Cell> {
        self.columns.iter().map(|c| &c.values[index]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::from_columns(vec![
            Column::new("a", vec![Cell::Number(1.0), Cell::Null, Cell::Number(3.0)]),
            Column::new("b", vec![Cell::text("x"), Cell::text("y"), Cell::Null]),
        ])
        .unwrap()
    }

    #[test]
    fn select_inserts_missing_columns_as_nulls() {
        let selected = sample().select(&["b".to_string(), "c".to_string()]);
        assert_eq!(selected.column_names(), vec!["b", "c"]);
        assert!(selected.column("c").unwrap().is_all_null());
        assert_eq!(selected.row_count(), 3);
    }

    #[test]
    fn set_column_rejects_length_mismatch() {
        let mut dataset = sample();
        let err = dataset
            .set_column(Column::new("c", vec![Cell::Null]))
            .unwrap_err();
        assert!(err.to_string().contains("has 1 value(s)"));
    }

    #[test]
    fn filter_rows_preserves_order() {
        let filtered = sample().filter_rows(&[true, false, true]);
        assert_eq!(filtered.row_count(), 2);
        assert_eq!(
            filtered.column("a").unwrap().values,
            vec![Cell::Number(1.0), Cell::Number(3.0)]
        );
    }

    #[test]
    fn coverage_counts_non_null_fraction() {
        let dataset = sample();
        let column = dataset.column("a").unwrap();
        assert!((column.coverage() - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(column.distinct_non_null(), 2);
    }

    #[test]
    fn category_sets_keep_label_order() {
        let set = CategorySet::ordered(&["Unknown", "0", "1-2"]);
        assert!(set.ordered);
        assert_eq!(set.labels, vec!["Unknown", "0", "1-2"]);
        assert!(set.contains("1-2"));
        assert!(!CategorySet::unordered(&["x"]).contains("y"));
    }
}
