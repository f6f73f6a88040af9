//! Run configuration and the registry of constant lookup data.
//!
//! Both live in one YAML document:
//!
//! ```yaml
//! pipeline:
//!   low_info_threshold: 0.05
//!   top_k: 15
//!   unmapped_currency: assume-usd
//! registry:
//!   schema: { schema_version: "2024.1", fields: [...] }
//!   fx: { rates: { EUR: 1.13 }, fallback: 1.0 }
//!   vocabulary: { tag_synonyms: {...}, dev_types: {...}, country_aliases: {...} }
//! ```
//!
//! Every key is optional; anything omitted falls back to the built-in value.

use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    compensation::{CompensationOptions, UnmappedCurrencyPolicy},
    error::{PipelineError, Result},
    fx::FxTable,
    normalize::Vocabulary,
    quality::DEFAULT_LOW_INFO_THRESHOLD,
    schema::CanonicalSchema,
};

const DEFAULT_PLACEHOLDERS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL", "#N/A"];
const DEFAULT_IDENTIFIERS: &[&str] = &["respondent_id", "respondent", "ResponseId", "country"];
const DEFAULT_ENCODE_EXCLUDE: &[&str] = &["compensation_total", "year"];

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub low_info_threshold: f64,
    pub numeric_ratio: f64,
    pub identifier_columns: Vec<String>,
    pub top_k: usize,
    pub country_top_n: usize,
    pub encode_exclude: Vec<String>,
    pub prune_overflow_indicators: bool,
    pub compensation_min: f64,
    pub compensation_max: f64,
    pub unmapped_currency: UnmappedCurrencyPolicy,
    pub placeholders: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            low_info_threshold: DEFAULT_LOW_INFO_THRESHOLD,
            numeric_ratio: 1.0,
            identifier_columns: strings(DEFAULT_IDENTIFIERS),
            top_k: 15,
            country_top_n: 30,
            encode_exclude: strings(DEFAULT_ENCODE_EXCLUDE),
            prune_overflow_indicators: false,
            compensation_min: 1_000.0,
            compensation_max: 350_000.0,
            unmapped_currency: UnmappedCurrencyPolicy::AssumeUsd,
            placeholders: strings(DEFAULT_PLACEHOLDERS),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.low_info_threshold) {
            return Err(PipelineError::InvalidConfig(format!(
                "low_info_threshold must be within [0, 1], got {}",
                self.low_info_threshold
            )));
        }
        if !(self.numeric_ratio > 0.0 && self.numeric_ratio <= 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "numeric_ratio must be within (0, 1], got {}",
                self.numeric_ratio
            )));
        }
        if self.top_k == 0 {
            return Err(PipelineError::InvalidConfig(
                "top_k must be at least 1".to_string(),
            ));
        }
        if self.compensation_min > self.compensation_max {
            return Err(PipelineError::InvalidConfig(format!(
                "compensation_min ({}) exceeds compensation_max ({})",
                self.compensation_min, self.compensation_max
            )));
        }
        Ok(())
    }

    pub fn compensation_options(&self) -> CompensationOptions {
        CompensationOptions {
            min: self.compensation_min,
            max: self.compensation_max,
            unmapped: self.unmapped_currency,
        }
    }
}

/// Constant lookup data shared by every stage: the canonical schema, FX rates
/// and category vocabularies. Built once per run and passed by reference.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Registry {
    pub schema: CanonicalSchema,
    pub fx: FxTable,
    pub vocabulary: Vocabulary,
}

impl Registry {
    pub fn validate(&self) -> Result<()> {
        self.schema.validate()?;
        if let Some((code, rate)) = self
            .fx
            .rates
            .iter()
            .find(|(_, rate)| !rate.is_finite() || **rate <= 0.0)
        {
            return Err(PipelineError::InvalidConfig(format!(
                "FX rate for '{code}' must be a positive number, got {rate}"
            )));
        }
        Ok(())
    }

    pub fn describe(&self) {
        info!(
            "Registry: schema {} ({} field(s), fingerprint {}), {} FX rate(s)",
            self.schema.schema_version,
            self.schema.len(),
            self.schema.fingerprint(),
            self.fx.len()
        );
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub pipeline: PipelineConfig,
    pub registry: Registry,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let config: ConfigFile = serde_yaml::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when given, otherwise the built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let file = File::create(path)?;
        serde_yaml::to_writer(BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.pipeline.validate()?;
        self.registry.validate()
    }
}
