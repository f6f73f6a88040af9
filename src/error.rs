use std::path::PathBuf;

use thiserror::Error;

/// Batch-level failures. Any of these stops a run; cell-level problems are
/// absorbed as nulls or default labels and never reach this type.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Missing input for year {year}: expected {path:?}")]
    MissingInput { year: i32, path: PathBuf },

    #[error("Data directory {0:?} not found")]
    MissingDataDir(PathBuf),

    #[error("Empty schema: {0}")]
    EmptySchema(String),

    #[error("Column '{column}' is required by {stage} but is not present")]
    MissingColumn { column: String, stage: &'static str },

    #[error("Currency '{code}' has no FX rate ({rows} row(s) affected)")]
    UnmappedCurrency { code: String, rows: usize },

    #[error("Encoding '{field}' would produce column '{column}', which already exists")]
    ColumnCollision { column: String, field: String },

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
