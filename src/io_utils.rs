//! CSV reading and writing for survey exports and pipeline outputs.
//!
//! - **Delimiters**: `.tsv` files default to tab, everything else to comma,
//!   unless overridden.
//! - **Encoding**: input bytes are decoded through `encoding_rs` (UTF-8 by
//!   default, with BOM sniffing); output is always UTF-8.
//! - **stdin/stdout**: the `-` path routes through the standard streams.
//! - **Quoting**: output uses `QuoteStyle::Always` so multi-select answers
//!   containing delimiters survive a round trip.

use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};
use log::info;

use crate::{
    data::Cell,
    dataset::{Column, Dataset},
};

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

/// Directory name used for per-year cleaned tables when no output directory is given.
pub const CLEAN_DIR_NAME: &str = "clean_numeric";

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

pub fn resolve_output_delimiter(path: Option<&Path>, provided: Option<u8>) -> u8 {
    if let Some(delim) = provided {
        return delim;
    }
    match path.and_then(|p| p.extension()).and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    }
}

pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(false);
    builder.from_reader(reader)
}

pub fn open_csv_reader_from_path(path: &Path, delimiter: u8) -> Result<csv::Reader<Box<dyn Read>>> {
    let reader: Box<dyn Read> = if is_dash(path) {
        Box::new(std::io::stdin().lock())
    } else {
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        ))
    };
    Ok(open_csv_reader(reader, delimiter))
}

pub fn open_csv_writer(path: Option<&Path>, delimiter: u8) -> Result<csv::Writer<Box<dyn Write>>> {
    let writer: Box<dyn Write> = match path {
        Some(p) if !is_dash(p) => Box::new(BufWriter::new(
            File::create(p).with_context(|| format!("Creating output file {p:?}"))?,
        )),
        _ => Box::new(std::io::stdout()),
    };
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Always)
        .double_quote(true);
    Ok(builder.from_writer(writer))
}

fn decode_field(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_field(field, encoding))
        .collect()
}

/// Reads a delimited file into a [`Dataset`] of text and null cells.
/// Every field matching one of `placeholders` becomes null.
pub fn read_dataset(
    path: &Path,
    delimiter: u8,
    encoding: &'static Encoding,
    placeholders: &[String],
) -> Result<Dataset> {
    let mut reader = open_csv_reader_from_path(path, delimiter)?;
    let headers = decode_record(
        reader
            .byte_headers()
            .with_context(|| format!("Reading headers from {path:?}"))?,
        encoding,
    )?;
    let mut values = vec![Vec::new(); headers.len()];
    let mut record = csv::ByteRecord::new();
    let mut line = 1usize;
    while reader
        .read_byte_record(&mut record)
        .with_context(|| format!("Reading {path:?} after line {line}"))?
    {
        line += 1;
        for (column, field) in values.iter_mut().zip(record.iter()) {
            let text = decode_field(field, encoding)
                .with_context(|| format!("Decoding line {line} of {path:?}"))?;
            column.push(Cell::from_raw(&text, placeholders));
        }
    }
    let columns = headers
        .into_iter()
        .zip(values)
        .map(|(name, cells)| Column::new(name, cells))
        .collect::<Vec<_>>();
    Dataset::from_columns(columns).with_context(|| format!("Assembling table from {path:?}"))
}

/// Writes a dataset with a header row and no index column; `None` or `-`
/// writes to stdout.
pub fn write_dataset(dataset: &Dataset, path: Option<&Path>, delimiter: u8) -> Result<()> {
    let mut writer = open_csv_writer(path, delimiter)?;
    writer
        .write_record(dataset.columns().iter().map(|c| c.name.as_str()))
        .context("Writing header row")?;
    for index in 0..dataset.row_count() {
        writer
            .write_record(dataset.row(index).into_iter().map(Cell::as_display))
            .with_context(|| format!("Writing row {}", index + 1))?;
    }
    writer.flush().context("Flushing output")?;
    Ok(())
}

pub fn clean_file_name(year: i32, extension: &str) -> String {
    format!("{year}_clean_numeric.{extension}")
}

/// Persists each cleaned year as `<dir>/<year>_clean_numeric.csv`.
pub fn save_cleaned(years: &BTreeMap<i32, Dataset>, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir).with_context(|| format!("Creating output directory {dir:?}"))?;
    let mut written = Vec::with_capacity(years.len());
    for (year, dataset) in years {
        let path = dir.join(clean_file_name(*year, "csv"));
        write_dataset(dataset, Some(&path), DEFAULT_CSV_DELIMITER)
            .with_context(|| format!("Writing cleaned table for {year}"))?;
        written.push(path);
    }
    info!("Clean files saved to {dir:?}");
    Ok(written)
}
