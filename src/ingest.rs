//! Loads yearly survey exports laid out as `<data_dir>/<year>/<year>.csv`.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::{debug, info};

use crate::{dataset::Dataset, error::PipelineError, io_utils};

/// How raw exports are parsed.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub delimiter: Option<u8>,
    pub encoding: &'static Encoding,
    pub placeholders: Vec<String>,
}

pub fn year_csv_path(data_dir: &Path, year: i32) -> PathBuf {
    data_dir.join(year.to_string()).join(format!("{year}.csv"))
}

/// Year directories directly under `data_dir`, ascending. Only all-digit
/// directory names count.
pub fn discover_years(data_dir: &Path) -> Result<Vec<i32>> {
    if !data_dir.is_dir() {
        return Err(PipelineError::MissingDataDir(data_dir.to_path_buf()).into());
    }
    let mut years = Vec::new();
    for entry in
        fs::read_dir(data_dir).with_context(|| format!("Listing data directory {data_dir:?}"))?
    {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if !name.is_empty()
            && name.chars().all(|c| c.is_ascii_digit())
            && let Ok(year) = name.parse::<i32>()
        {
            years.push(year);
        } else {
            debug!("Ignoring non-year entry {name:?} in {data_dir:?}");
        }
    }
    years.sort_unstable();
    Ok(years)
}

pub fn load_year(data_dir: &Path, year: i32, options: &IngestOptions) -> Result<Dataset> {
    let path = year_csv_path(data_dir, year);
    if !path.is_file() {
        return Err(PipelineError::MissingInput { year, path }.into());
    }
    info!("Loading {year} from {path:?}");
    let delimiter = io_utils::resolve_input_delimiter(&path, options.delimiter);
    io_utils::read_dataset(&path, delimiter, options.encoding, &options.placeholders)
        .with_context(|| format!("Loading survey export for {year}"))
}

/// Loads the requested years, or every discovered year when `years` is empty.
pub fn load_raw_data(
    data_dir: &Path,
    years: &[i32],
    options: &IngestOptions,
) -> Result<BTreeMap<i32, Dataset>> {
    let wanted = if years.is_empty() {
        discover_years(data_dir)?
    } else {
        if !data_dir.is_dir() {
            return Err(PipelineError::MissingDataDir(data_dir.to_path_buf()).into());
        }
        let mut wanted = years.to_vec();
        wanted.sort_unstable();
        wanted.dedup();
        wanted
    };
    let mut out = BTreeMap::new();
    for year in wanted {
        let dataset = load_year(data_dir, year, options)?;
        info!(
            "{year}: {} row(s) x {} column(s)",
            dataset.row_count(),
            dataset.column_count()
        );
        out.insert(year, dataset);
    }
    Ok(out)
}
