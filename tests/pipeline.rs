mod common;

use std::collections::BTreeMap;

use encoding_rs::UTF_8;
use survey_harmonize::{
    config::{ConfigFile, PipelineConfig, Registry},
    data::Cell,
    dataset::Dataset,
    error::PipelineError,
    ingest::{self, IngestOptions},
    io_utils,
    merge::YEAR_COLUMN,
    pipeline::Pipeline,
    target,
};

use common::survey_workspace;

fn ingest_options() -> IngestOptions {
    IngestOptions {
        delimiter: None,
        encoding: UTF_8,
        placeholders: PipelineConfig::default().placeholders,
    }
}

fn load_sample() -> BTreeMap<i32, Dataset> {
    let workspace = survey_workspace();
    ingest::load_raw_data(&workspace.data_dir(), &[], &ingest_options()).expect("load sample")
}

fn column_texts(dataset: &Dataset, name: &str) -> Vec<String> {
    dataset
        .column(name)
        .unwrap_or_else(|| panic!("column {name} missing"))
        .values
        .iter()
        .map(Cell::as_display)
        .collect()
}

fn default_pipeline() -> Pipeline {
    Pipeline::new(PipelineConfig::default(), Registry::default()).expect("valid defaults")
}

#[test]
fn merged_rows_equal_sum_of_cleaned_years() {
    let raw = load_sample();
    let pipeline = default_pipeline();
    let cleaned = pipeline.clean_years(&raw).unwrap();
    let merged = pipeline.merge(&cleaned.years).unwrap();

    let expected_rows = cleaned.years.values().map(Dataset::row_count).sum::<usize>();
    assert_eq!(merged.row_count(), expected_rows);
    assert_eq!(merged.row_count(), 7);
    assert_eq!(
        column_texts(&merged, YEAR_COLUMN),
        vec!["2019", "2019", "2019", "2019", "2020", "2020", "2020"]
    );
    assert_eq!(
        merged.column_names(),
        vec![
            "country",
            "employment",
            "education_level",
            "org_size",
            "years_code_pro",
            "currency",
            "compensation_total",
            "langs_worked",
            YEAR_COLUMN,
        ]
    );
}

#[test]
fn cleaning_reports_dropped_columns_per_year() {
    let raw = load_sample();
    let cleaned = default_pipeline().clean_years(&raw).unwrap();
    let report_2019 = &cleaned.quality[0];
    assert_eq!(report_2019.year, 2019);
    assert!(report_2019.empty_dropped.contains(&"dev_type".to_string()));
    assert!(report_2019.low_info_dropped.is_empty());

    let coercion_2020 = &cleaned.coercion[1];
    assert_eq!(coercion_2020.coerced.get("compensation_total"), Some(&0));
    assert!(coercion_2020.left_textual.contains(&"years_code_pro".to_string()));
}

#[test]
fn full_run_normalises_and_encodes() {
    let raw = load_sample();
    let output = default_pipeline().run(&raw).unwrap();
    let encoded = &output.encoded;

    // Peru 2019 has no currency and India's 900000 is out of range.
    assert_eq!(encoded.row_count(), 5);
    assert_eq!(
        column_texts(encoded, "country"),
        vec![
            "United States",
            "Germany",
            "United States",
            "Peru",
            "United Kingdom"
        ]
    );
    let compensation = encoded
        .column("compensation_total")
        .unwrap()
        .values
        .iter()
        .filter_map(Cell::as_number)
        .collect::<Vec<_>>();
    assert_eq!(compensation.len(), 5);
    assert_eq!(compensation[0], 120000.0);
    assert!((compensation[1] - 67800.0).abs() < 1e-6);
    assert_eq!(compensation[3], 20000.0);
    assert!((compensation[4] - 1234.56 * 1.29).abs() < 1e-6);

    assert_eq!(
        column_texts(encoded, "langs_worked_Go"),
        vec!["1", "0", "0", "1", "0"]
    );
    assert_eq!(
        column_texts(encoded, "langs_worked_Rust"),
        vec!["1", "0", "1", "0", "0"]
    );
    assert!(!encoded.contains("langs_worked_Other"));
    assert_eq!(
        column_texts(encoded, "years_code_pro_20+"),
        vec!["0", "0", "1", "0", "1"]
    );
    assert_eq!(
        column_texts(encoded, "employment_Full-time"),
        vec!["1", "1", "1", "0", "0"]
    );
    assert!(encoded.contains("education_level_Doctorate"));
    assert!(encoded.contains("org_size_Unknown"));
    assert!(!encoded.contains("currency"));

    let report = &output.report;
    assert_eq!(report.compensation.rows_in, 7);
    assert_eq!(report.compensation.dropped_null_currency, 1);
    assert_eq!(report.compensation.dropped_out_of_range, 1);
    assert_eq!(report.compensation.unmapped_currencies.get("XYZ"), Some(&1));
    assert_eq!(report.output_rows, 5);
}

#[test]
fn overflow_pruning_removes_unknown_and_other_indicators() {
    let raw = load_sample();
    let config = PipelineConfig {
        prune_overflow_indicators: true,
        ..PipelineConfig::default()
    };
    let output = Pipeline::new(config, Registry::default())
        .unwrap()
        .run(&raw)
        .unwrap();
    assert!(
        output
            .encoded
            .column_names()
            .iter()
            .all(|name| !name.ends_with("_Unknown") && !name.ends_with("_Other"))
    );
    assert!(!output.report.encoding.pruned.is_empty());
}

#[test]
fn error_policy_stops_on_unmapped_currency() {
    let raw = load_sample();
    let mut config = ConfigFile::default();
    config.pipeline.unmapped_currency =
        survey_harmonize::compensation::UnmappedCurrencyPolicy::Error;
    let err = Pipeline::new(config.pipeline, config.registry)
        .unwrap()
        .run(&raw)
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<PipelineError>(),
        Some(PipelineError::UnmappedCurrency { code, rows: 1 }) if code == "XYZ"
    ));
}

#[test]
fn target_is_relative_to_country_mean() {
    let raw = load_sample();
    let output = default_pipeline().run(&raw).unwrap();
    let with_target = target::attach_country_normalized_target(&output.encoded).unwrap();
    let values = with_target
        .column(target::NORMALIZED_TARGET_COLUMN)
        .unwrap()
        .values
        .iter()
        .filter_map(Cell::as_number)
        .collect::<Vec<_>>();
    // Two United States rows: 120000 and 95000 around a mean of 107500.
    assert!((values[0] - 120000.0 / 107500.0).abs() < 1e-9);
    assert!((values[2] - 95000.0 / 107500.0).abs() < 1e-9);
    assert_eq!(values[1], 1.0);
}

#[test]
fn cleaned_years_round_trip_through_csv() {
    let workspace = survey_workspace();
    let raw = ingest::load_raw_data(&workspace.data_dir(), &[], &ingest_options()).unwrap();
    let cleaned = default_pipeline().clean_years(&raw).unwrap();
    let out_dir = workspace.path().join("clean");
    let written = io_utils::save_cleaned(&cleaned.years, &out_dir).unwrap();
    assert_eq!(
        written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect::<Vec<_>>(),
        vec!["2019_clean_numeric.csv", "2020_clean_numeric.csv"]
    );
    let reread = io_utils::read_dataset(&written[0], b',', UTF_8, &[String::new()]).unwrap();
    assert_eq!(reread.column_names(), cleaned.years[&2019].column_names());
    assert_eq!(reread.row_count(), 4);
}
