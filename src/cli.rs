use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::compensation::UnmappedCurrencyPolicy;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Harmonize yearly survey exports into one encoded feature table",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Harmonize, filter and coerce each year, writing `<year>_clean_numeric.csv` files
    Clean(CleanArgs),
    /// Run the full pipeline and write the encoded feature table
    Run(RunArgs),
    /// Show the canonical fields and their historical aliases
    Schema(SchemaArgs),
    /// Write the default configuration and registry as a YAML template
    InitConfig(InitConfigArgs),
}

/// Options shared by every command that reads the yearly exports.
#[derive(Debug, Args)]
pub struct InputArgs {
    /// Directory holding `<year>/<year>.csv` exports
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: PathBuf,
    /// Comma-separated years to load (defaults to every year directory found)
    #[arg(long, value_delimiter = ',')]
    pub years: Vec<i32>,
    /// YAML configuration file (pipeline settings and registry overrides)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Minimum non-null ratio a column needs to survive (overrides config)
    #[arg(long)]
    pub threshold: Option<f64>,
    /// CSV delimiter character of the exports (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the exports (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct CleanArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Output directory for cleaned tables (defaults to `<data-dir>/clean_numeric`)
    #[arg(long = "out-dir")]
    pub out_dir: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub input: InputArgs,
    /// Output file for the encoded table (stdout if omitted or `-`)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Delimiter to use for output (defaults by extension, else comma)
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    /// Number of most frequent values kept per categorical column
    #[arg(long = "top-k")]
    pub top_k: Option<usize>,
    /// Number of most frequent countries kept before grouping into `Other`
    #[arg(long = "country-top-n")]
    pub country_top_n: Option<usize>,
    /// Drop indicator columns ending in `_Other` or `_Unknown`
    #[arg(long = "prune-overflow")]
    pub prune_overflow: bool,
    /// How to treat currency codes missing from the FX table
    #[arg(long = "unmapped-currency", value_enum)]
    pub unmapped_currency: Option<UnmappedCurrencyPolicy>,
    /// Append the country-normalised `salary_normalized` column
    #[arg(long = "with-target")]
    pub with_target: bool,
    /// Also write the per-year cleaned tables into this directory
    #[arg(long = "save-clean")]
    pub save_clean: Option<PathBuf>,
    /// Print nulls per column before and after keeping rows with compensation
    #[arg(long = "null-summary")]
    pub null_summary: bool,
    /// Write a JSON run report (stage counts, schema fingerprint) to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SchemaArgs {
    /// YAML configuration file whose registry should be shown
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum, default_value_t = SchemaFormat::Table)]
    pub format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum SchemaFormat {
    #[default]
    Table,
    Yaml,
}

#[derive(Debug, Args)]
pub struct InitConfigArgs {
    /// Destination YAML file
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
    /// Overwrite the destination if it already exists
    #[arg(long)]
    pub force: bool,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
