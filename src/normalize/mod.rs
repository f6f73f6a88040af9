//! Field-specific categorical normalisation.
//!
//! Every normaliser has the same shape: missing answers become the `Unknown`
//! sentinel, raw answers are mapped onto canonical labels, and before/after
//! null and distinct counts are reported. Two strategies exist:
//!
//! - exact synonym maps for multi-select tag fields ([`tags`])
//! - ordered first-match rule lists and numeric bucketing for free-text or
//!   ordinal answers ([`rules`], [`years`], [`dev_type`], [`country`])
//!
//! Fields absent from the table are skipped with a debug message.

pub mod country;
pub mod dev_type;
pub mod rules;
pub mod tags;
pub mod years;

use std::collections::BTreeMap;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::{
    data::{Cell, UNKNOWN},
    dataset::{CategorySet, Column, Dataset},
    error::Result,
};

use self::{rules::RuleSet, tags::SynonymMap};

/// Category vocabularies injected into the normalisers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vocabulary {
    pub tag_synonyms: BTreeMap<String, SynonymMap>,
    pub dev_types: BTreeMap<String, String>,
    pub country_aliases: BTreeMap<String, String>,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            tag_synonyms: tags::builtin_synonyms(),
            dev_types: dev_type::builtin_dev_types(),
            country_aliases: country::builtin_country_aliases(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldReport {
    pub field: String,
    pub rows: usize,
    pub nulls_before: usize,
    pub distinct_before: usize,
    pub nulls_after: usize,
    pub distinct_after: usize,
}

impl FieldReport {
    fn compare(before: &Column, after: &Column) -> Self {
        Self {
            field: before.name.clone(),
            rows: before.len(),
            nulls_before: before.null_count(),
            distinct_before: before.distinct_non_null(),
            nulls_after: after.null_count(),
            distinct_after: after.distinct_non_null(),
        }
    }

    fn log(&self) {
        let pct = if self.rows == 0 {
            0.0
        } else {
            self.nulls_before as f64 / self.rows as f64 * 100.0
        };
        info!(
            "{}: {} row(s), {} null(s) before ({pct:.2}%), {} distinct -> {} null(s), {} distinct",
            self.field,
            self.rows,
            self.nulls_before,
            self.distinct_before,
            self.nulls_after,
            self.distinct_after
        );
    }
}

/// One field's transformation from raw answers to canonical labels.
#[derive(Debug, Clone)]
pub enum FieldNormalizer {
    /// Split, map each choice through a synonym table, rejoin.
    Tags { field: String, synonyms: SynonymMap },
    /// Lower-cased substring rules, first match wins.
    Rules {
        field: String,
        rules: RuleSet,
        categories: CategorySet,
    },
    /// Years-of-experience text or numbers to ordinal buckets.
    Years { field: String },
    /// Exact job-title lookup onto coarse roles.
    DevType {
        field: String,
        map: BTreeMap<String, String>,
    },
    /// Official-name unification plus top-n grouping.
    Country {
        field: String,
        aliases: BTreeMap<String, String>,
        top_n: usize,
    },
}

impl FieldNormalizer {
    pub fn field(&self) -> &str {
        match self {
            FieldNormalizer::Tags { field, .. }
            | FieldNormalizer::Rules { field, .. }
            | FieldNormalizer::Years { field }
            | FieldNormalizer::DevType { field, .. }
            | FieldNormalizer::Country { field, .. } => field,
        }
    }

    pub fn education() -> Self {
        FieldNormalizer::Rules {
            field: "education_level".to_string(),
            rules: rules::education_rules(),
            categories: CategorySet::unordered(rules::EDUCATION_LABELS),
        }
    }

    pub fn employment() -> Self {
        FieldNormalizer::Rules {
            field: "employment".to_string(),
            rules: rules::employment_rules(),
            categories: CategorySet::unordered(rules::EMPLOYMENT_LABELS),
        }
    }

    pub fn org_size() -> Self {
        FieldNormalizer::Rules {
            field: "org_size".to_string(),
            rules: rules::org_size_rules(),
            categories: CategorySet::ordered(rules::ORG_SIZE_LABELS),
        }
    }

    pub fn years(field: &str) -> Self {
        FieldNormalizer::Years {
            field: field.to_string(),
        }
    }

    pub fn dev_type(vocabulary: &Vocabulary) -> Self {
        FieldNormalizer::DevType {
            field: "dev_type".to_string(),
            map: vocabulary.dev_types.clone(),
        }
    }

    pub fn tags(field: &str, vocabulary: &Vocabulary) -> Self {
        FieldNormalizer::Tags {
            field: field.to_string(),
            synonyms: vocabulary
                .tag_synonyms
                .get(field)
                .cloned()
                .unwrap_or_default(),
        }
    }

    pub fn country(vocabulary: &Vocabulary, top_n: usize) -> Self {
        FieldNormalizer::Country {
            field: "country".to_string(),
            aliases: vocabulary.country_aliases.clone(),
            top_n,
        }
    }

    /// Produces the normalised column; the input column is left untouched.
    pub fn apply(&self, column: &Column) -> Column {
        match self {
            FieldNormalizer::Tags { synonyms, .. } => map_cells(column, |cell| {
                tags::canonicalize_tags(cell, synonyms)
            }),
            FieldNormalizer::Rules {
                rules, categories, ..
            } => map_cells(column, |cell| match fill_unknown(cell) {
                Cell::Text(raw) => Cell::text(rules.classify(&raw)),
                _ => Cell::text(UNKNOWN),
            })
            .with_categories(categories.clone()),
            FieldNormalizer::Years { .. } => {
                map_cells(column, |cell| Cell::text(years::bucket_years(cell)))
                    .with_categories(CategorySet::ordered(years::YEARS_LABELS))
            }
            FieldNormalizer::DevType { map, .. } => map_cells(column, |cell| {
                Cell::text(dev_type::classify_dev_type(cell, map))
            })
            .with_categories(CategorySet::unordered(dev_type::DEV_TYPE_LABELS)),
            FieldNormalizer::Country { aliases, top_n, .. } => {
                country::group_countries(column, aliases, *top_n)
            }
        }
    }
}

fn map_cells<F>(column: &Column, f: F) -> Column
where
    F: Fn(&Cell) -> Cell,
{
    Column::new(column.name.clone(), column.values.iter().map(f).collect())
}

/// Replaces a missing value with the `Unknown` sentinel and renders numbers
/// as text so every normaliser sees a string.
pub fn fill_unknown(cell: &Cell) -> Cell {
    match cell {
        Cell::Null => Cell::text(UNKNOWN),
        Cell::Text(_) => cell.clone(),
        other => Cell::Text(other.as_display()),
    }
}

/// The normalisers in the order the merged table is cleaned.
pub fn default_normalizers(vocabulary: &Vocabulary, country_top_n: usize) -> Vec<FieldNormalizer> {
    vec![
        FieldNormalizer::country(vocabulary, country_top_n),
        FieldNormalizer::years("years_code_total"),
        FieldNormalizer::years("years_code_pro"),
        FieldNormalizer::org_size(),
        FieldNormalizer::dev_type(vocabulary),
        FieldNormalizer::tags("db_worked", vocabulary),
        FieldNormalizer::education(),
        FieldNormalizer::tags("webframe_worked", vocabulary),
        FieldNormalizer::tags("platform_worked", vocabulary),
        FieldNormalizer::tags("langs_worked", vocabulary),
        FieldNormalizer::employment(),
    ]
}

/// Runs `normalizers` in order over a copy of `dataset`.
pub fn normalize_fields(
    dataset: &Dataset,
    normalizers: &[FieldNormalizer],
) -> Result<(Dataset, Vec<FieldReport>)> {
    let mut output = dataset.clone();
    let mut reports = Vec::with_capacity(normalizers.len());
    for normalizer in normalizers {
        let Some(column) = output.column(normalizer.field()) else {
            debug!(
                "Skipping normalisation of '{}': column not present",
                normalizer.field()
            );
            continue;
        };
        let normalized = normalizer.apply(column);
        let report = FieldReport::compare(column, &normalized);
        report.log();
        reports.push(report);
        output.set_column(normalized)?;
    }
    Ok((output, reports))
}
