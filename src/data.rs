use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sentinel label written in place of a missing categorical value.
pub const UNKNOWN: &str = "Unknown";
/// Overflow label for single-valued categoricals outside the top-k.
pub const OTHER: &str = "Other";
/// Separator used by multi-select survey answers.
pub const MULTI_VALUE_DELIMITER: char = ';';

/// A single table cell.
///
/// Raw survey exports only ever produce `Null` and `Text`; `Number` appears
/// after coercion and `List` when an ingestion step has already split a
/// multi-select answer into its choices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cell {
    Null,
    Text(String),
    Number(f64),
    List(Vec<String>),
}

impl Cell {
    /// Builds a cell from a raw CSV field, mapping placeholder tokens to `Null`.
    pub fn from_raw(raw: &str, placeholders: &[String]) -> Self {
        if raw.is_empty() || placeholders.iter().any(|token| token == raw) {
            Cell::Null
        } else {
            Cell::Text(raw.to_string())
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    pub fn is_textual(&self) -> bool {
        matches!(self, Cell::Text(_) | Cell::List(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Cell::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_display(&self) -> String {
        match self {
            Cell::Null => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
            Cell::List(items) => items.join("; "),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl<T> From<Option<T>> for Cell
where
    T: Into<Cell>,
{
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Cell::Null)
    }
}

/// A cell that could not be read as a number. Callers turn this into `Cell::Null`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot parse '{input}' as a number")]
pub struct ParseFailure {
    pub input: String,
}

/// Parses numbers written with either `,` or `.` as the decimal mark.
///
/// With both separators present the one appearing first is the thousands
/// separator. A lone `,` is a decimal mark only when exactly two digits follow
/// the last one (`12,50`), otherwise it separates thousands (`1,234`).
pub fn parse_number(raw: &str) -> Result<f64, ParseFailure> {
    let trimmed = raw.trim();
    let normalized = match (trimmed.find(','), trimmed.find('.')) {
        (Some(comma), Some(dot)) if comma < dot => trimmed.replace(',', ""),
        (Some(_), Some(_)) => trimmed.replace('.', "").replace(',', "."),
        (Some(_), None) => {
            let last_group = trimmed.rsplit(',').next().unwrap_or_default();
            if last_group.chars().count() == 2 {
                trimmed.replace(',', ".")
            } else {
                trimmed.replace(',', "")
            }
        }
        _ => trimmed.to_string(),
    };
    normalized
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| ParseFailure {
            input: raw.to_string(),
        })
}

/// Reads a cell as a number; text goes through [`parse_number`], anything
/// unparseable becomes `None`.
pub fn cell_to_number(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) => Some(*n),
        Cell::Text(s) => parse_number(s).ok(),
        _ => None,
    }
}

pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}
