//! Orchestration of the stages, plus the `clean` and `run` command handlers.
//!
//! Per year: alias resolution → projection → quality filter → coercion.
//! Across years: merge. On the merged table: currency and compensation,
//! categorical normalisation, then top-k encoding.

use std::{
    collections::BTreeMap,
    fs::File,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    cli::{CleanArgs, InputArgs, RunArgs},
    coerce::{self, CoercionReport},
    compensation::{self, CompensationReport},
    config::{ConfigFile, PipelineConfig, Registry},
    dataset::Dataset,
    encode::{self, EncodeReport},
    harmonize,
    ingest::{self, IngestOptions},
    io_utils, merge,
    normalize::{self, FieldReport},
    quality::{self, QualityReport},
    table,
    target::{self, NullSummaryRow},
};

/// Everything recorded about one run, serialisable as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub tool_version: String,
    pub schema_version: String,
    pub schema_fingerprint: String,
    pub years: Vec<i32>,
    pub quality: Vec<QualityReport>,
    pub coercion: Vec<CoercionReport>,
    pub merged_rows: usize,
    pub merged_columns: usize,
    pub compensation: CompensationReport,
    pub normalization: Vec<FieldReport>,
    pub encoding: EncodeReport,
    pub output_rows: usize,
    pub output_columns: usize,
}

impl RunReport {
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).with_context(|| format!("Creating report file {path:?}"))?;
        serde_json::to_writer_pretty(file, self).context("Writing run report JSON")
    }
}

/// Per-year tables after cleaning, with what each step removed.
#[derive(Debug, Clone)]
pub struct CleanedYears {
    pub years: BTreeMap<i32, Dataset>,
    pub quality: Vec<QualityReport>,
    pub coercion: Vec<CoercionReport>,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub cleaned: BTreeMap<i32, Dataset>,
    pub merged: Dataset,
    pub null_summary: Vec<NullSummaryRow>,
    pub encoded: Dataset,
    pub report: RunReport,
}

#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
    registry: Registry,
}

impl Pipeline {
    pub fn new(config: PipelineConfig, registry: Registry) -> Result<Self> {
        config.validate().context("Validating pipeline settings")?;
        registry.validate().context("Validating registry")?;
        Ok(Self { config, registry })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn clean_years(&self, raw: &BTreeMap<i32, Dataset>) -> Result<CleanedYears> {
        let harmonized = harmonize::harmonize_years(raw, &self.registry.schema)
            .context("Harmonizing yearly datasets")?;
        let (filtered, quality) =
            quality::filter_years(&harmonized, self.config.low_info_threshold);
        let (years, coercion) = coerce::coerce_years(
            &filtered,
            &self.config.identifier_columns,
            self.config.numeric_ratio,
        );
        Ok(CleanedYears {
            years,
            quality,
            coercion,
        })
    }

    pub fn merge(&self, cleaned: &BTreeMap<i32, Dataset>) -> Result<Dataset> {
        merge::merge_years(cleaned, &self.registry.schema).context("Merging yearly datasets")
    }

    /// Compensation first, then every categorical normaliser in order.
    pub fn preprocess(
        &self,
        merged: &Dataset,
    ) -> Result<(Dataset, CompensationReport, Vec<FieldReport>)> {
        let (converted, compensation) = compensation::process_compensation(
            merged,
            &self.registry.fx,
            &self.config.compensation_options(),
        )
        .context("Processing compensation")?;
        let normalizers =
            normalize::default_normalizers(&self.registry.vocabulary, self.config.country_top_n);
        let (normalized, fields) = normalize::normalize_fields(&converted, &normalizers)
            .context("Normalising categorical fields")?;
        Ok((normalized, compensation, fields))
    }

    pub fn encode(&self, table: &Dataset) -> Result<(Dataset, EncodeReport)> {
        let (encoded, mut report) =
            encode::encode_top_k(table, self.config.top_k, &self.config.encode_exclude)
                .context("Encoding categorical columns")?;
        if !self.config.prune_overflow_indicators {
            return Ok((encoded, report));
        }
        let (pruned, dropped) = encode::prune_overflow_indicators(&encoded);
        report.pruned = dropped;
        Ok((pruned, report))
    }

    pub fn run(&self, raw: &BTreeMap<i32, Dataset>) -> Result<PipelineOutput> {
        self.registry.describe();
        let cleaned = self.clean_years(raw)?;
        let merged = self.merge(&cleaned.years)?;
        let null_summary = target::null_summary(&merged).context("Summarising nulls")?;
        let (preprocessed, compensation, normalization) = self.preprocess(&merged)?;
        let (encoded, encoding) = self.encode(&preprocessed)?;

        let report = RunReport {
            generated_at: Utc::now(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            schema_version: self.registry.schema.schema_version.clone(),
            schema_fingerprint: self.registry.schema.fingerprint(),
            years: cleaned.years.keys().copied().collect(),
            quality: cleaned.quality,
            coercion: cleaned.coercion,
            merged_rows: merged.row_count(),
            merged_columns: merged.column_count(),
            compensation,
            normalization,
            encoding,
            output_rows: encoded.row_count(),
            output_columns: encoded.column_count(),
        };
        info!(
            "Pipeline finished: {} row(s) x {} column(s)",
            report.output_rows, report.output_columns
        );
        Ok(PipelineOutput {
            cleaned: cleaned.years,
            merged,
            null_summary,
            encoded,
            report,
        })
    }
}

fn load_config(args: &InputArgs) -> Result<ConfigFile> {
    let mut config = ConfigFile::load_or_default(args.config.as_deref())
        .with_context(|| format!("Loading configuration {:?}", args.config))?;
    if let Some(threshold) = args.threshold {
        config.pipeline.low_info_threshold = threshold;
    }
    Ok(config)
}

fn load_inputs(args: &InputArgs, config: &PipelineConfig) -> Result<BTreeMap<i32, Dataset>> {
    let options = IngestOptions {
        delimiter: args.delimiter,
        encoding: io_utils::resolve_encoding(args.input_encoding.as_deref())?,
        placeholders: config.placeholders.clone(),
    };
    let raw = ingest::load_raw_data(&args.data_dir, &args.years, &options)?;
    if raw.is_empty() {
        return Err(anyhow!(
            "No year directories with exports found under {:?}",
            args.data_dir
        ));
    }
    Ok(raw)
}

pub fn execute_clean(args: &CleanArgs) -> Result<()> {
    let config = load_config(&args.input)?;
    let pipeline = Pipeline::new(config.pipeline, config.registry)?;
    pipeline.registry().describe();
    let raw = load_inputs(&args.input, pipeline.config())?;
    let cleaned = pipeline.clean_years(&raw)?;
    let out_dir = args
        .out_dir
        .clone()
        .unwrap_or_else(|| args.input.data_dir.join(io_utils::CLEAN_DIR_NAME));
    let written = io_utils::save_cleaned(&cleaned.years, &out_dir)?;
    info!("Wrote {} cleaned table(s)", written.len());
    Ok(())
}

pub fn execute_run(args: &RunArgs) -> Result<()> {
    let mut config = load_config(&args.input)?;
    if let Some(top_k) = args.top_k {
        config.pipeline.top_k = top_k;
    }
    if let Some(top_n) = args.country_top_n {
        config.pipeline.country_top_n = top_n;
    }
    if let Some(policy) = args.unmapped_currency {
        config.pipeline.unmapped_currency = policy;
    }
    if args.prune_overflow {
        config.pipeline.prune_overflow_indicators = true;
    }
    let output_path = args.output.as_deref();
    let output_delimiter = io_utils::resolve_output_delimiter(output_path, args.output_delimiter);
    info!(
        "Running pipeline over {:?} -> {} (delimiter '{}')",
        args.input.data_dir,
        output_path
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "stdout".into()),
        crate::printable_delimiter(output_delimiter)
    );

    let pipeline = Pipeline::new(config.pipeline, config.registry)?;
    let raw = load_inputs(&args.input, pipeline.config())?;
    let output = pipeline.run(&raw)?;

    if let Some(dir) = &args.save_clean {
        io_utils::save_cleaned(&output.cleaned, dir)?;
    }
    if args.null_summary {
        print_null_summary(&output.null_summary);
    }
    let encoded = if args.with_target {
        target::attach_country_normalized_target(&output.encoded)
            .context("Attaching the normalised salary target")?
    } else {
        output.encoded
    };
    io_utils::write_dataset(&encoded, output_path, output_delimiter)
        .with_context(|| format!("Writing encoded table to {:?}", output_path_label(output_path)))?;
    if let Some(path) = &args.report {
        output.report.save(path)?;
        info!("Run report written to {path:?}");
    }
    Ok(())
}

fn output_path_label(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("-"))
}

fn print_null_summary(rows: &[NullSummaryRow]) {
    let headers = ["column", "nulls_before", "nulls_after", "difference"]
        .iter()
        .map(|h| h.to_string())
        .collect::<Vec<_>>();
    let body = rows
        .iter()
        .map(|row| {
            vec![
                row.column.clone(),
                row.nulls_before.to_string(),
                row.nulls_after.to_string(),
                row.difference.to_string(),
            ]
        })
        .collect::<Vec<_>>();
    // stdout may carry the encoded table, so the summary goes to stderr.
    eprint!("{}", table::render_table(&headers, &body));
}
