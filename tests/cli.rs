mod common;

use std::fs;

use assert_cmd::Command;
use predicates::str::contains;
use survey_harmonize::{config::ConfigFile, pipeline::RunReport, schema::CanonicalSchema};

use common::{TestWorkspace, survey_workspace};

fn bin() -> Command {
    Command::cargo_bin("survey-harmonize").expect("binary exists")
}

#[test]
fn clean_writes_one_file_per_year() {
    let workspace = survey_workspace();
    let data_dir = workspace.data_dir();
    bin()
        .args(["clean", "--data-dir", data_dir.to_str().unwrap()])
        .assert()
        .success();

    let clean_dir = data_dir.join("clean_numeric");
    let first = fs::read_to_string(clean_dir.join("2019_clean_numeric.csv")).expect("2019 output");
    assert!(fs::metadata(clean_dir.join("2020_clean_numeric.csv")).is_ok());
    let header = first.lines().next().unwrap();
    assert!(header.starts_with("\"country\",\"employment\""));
    assert!(!header.contains("Respondent"));
    assert!(first.contains("\"60000\""));
}

#[test]
fn clean_honours_year_selection_and_out_dir() {
    let workspace = survey_workspace();
    let out_dir = workspace.path().join("out");
    bin()
        .args([
            "clean",
            "--data-dir",
            workspace.data_dir().to_str().unwrap(),
            "--years",
            "2020",
            "--out-dir",
            out_dir.to_str().unwrap(),
        ])
        .assert()
        .success();
    assert!(out_dir.join("2020_clean_numeric.csv").exists());
    assert!(!out_dir.join("2019_clean_numeric.csv").exists());
}

#[test]
fn run_streams_encoded_table_to_stdout() {
    let workspace = survey_workspace();
    bin()
        .args([
            "run",
            "--data-dir",
            workspace.data_dir().to_str().unwrap(),
            "--top-k",
            "3",
        ])
        .assert()
        .success()
        .stdout(contains("\"langs_worked_Go\""))
        .stdout(contains("\"United Kingdom\""))
        .stdout(contains("\"employment_Full-time\""));
}

#[test]
fn run_writes_output_target_and_report() {
    let workspace = survey_workspace();
    let output = workspace.path().join("features.csv");
    let report = workspace.path().join("report.json");
    bin()
        .args([
            "run",
            "--data-dir",
            workspace.data_dir().to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--with-target",
            "--null-summary",
            "--report",
            report.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stderr(contains("nulls_before"));

    let contents = fs::read_to_string(&output).expect("encoded output");
    assert!(contents.lines().next().unwrap().contains("\"salary_normalized\""));
    assert_eq!(contents.lines().count(), 6);

    let parsed: RunReport =
        serde_json::from_str(&fs::read_to_string(&report).unwrap()).expect("report json");
    assert_eq!(parsed.years, vec![2019, 2020]);
    assert_eq!(parsed.merged_rows, 7);
    assert_eq!(
        parsed.schema_fingerprint,
        CanonicalSchema::builtin().fingerprint()
    );
}

#[test]
fn run_fails_when_requested_year_is_missing() {
    let workspace = survey_workspace();
    bin()
        .args([
            "run",
            "--data-dir",
            workspace.data_dir().to_str().unwrap(),
            "--years",
            "2018,2019",
        ])
        .assert()
        .failure()
        .stderr(contains("Missing input for year 2018"));
}

#[test]
fn run_fails_on_unmapped_currency_with_error_policy() {
    let workspace = survey_workspace();
    bin()
        .args([
            "run",
            "--data-dir",
            workspace.data_dir().to_str().unwrap(),
            "--unmapped-currency",
            "error",
        ])
        .assert()
        .failure()
        .stderr(contains("Currency 'XYZ' has no FX rate"));
}

#[test]
fn missing_data_dir_is_reported() {
    let workspace = TestWorkspace::new();
    bin()
        .args([
            "clean",
            "--data-dir",
            workspace.path().join("nowhere").to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(contains("not found"));
}

#[test]
fn schema_lists_fields_and_fingerprint() {
    bin()
        .args(["schema"])
        .assert()
        .success()
        .stdout(contains("compensation_total"))
        .stdout(contains("ConvertedCompYearly"))
        .stdout(contains(CanonicalSchema::builtin().fingerprint()));
}

#[test]
fn schema_yaml_reflects_config_overrides() {
    let workspace = TestWorkspace::new();
    let config = workspace.write(
        "config.yml",
        "registry:\n  schema:\n    schema_version: test-1\n    fields:\n      - name: salary\n        aliases: [Salary, CompTotal]\n",
    );
    bin()
        .args(["schema", "--config", config.to_str().unwrap(), "--format", "yaml"])
        .assert()
        .success()
        .stdout(contains("schema_version: test-1"))
        .stdout(contains("CompTotal"));
}

#[test]
fn init_config_writes_loadable_template() {
    let workspace = TestWorkspace::new();
    let path = workspace.path().join("survey.yml");
    bin()
        .args(["init-config", "-o", path.to_str().unwrap()])
        .assert()
        .success();
    let loaded = ConfigFile::load(&path).expect("template loads");
    assert_eq!(loaded, ConfigFile::default());

    bin()
        .args(["init-config", "-o", path.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(contains("--force"));
}

#[test]
fn invalid_threshold_is_rejected() {
    let workspace = survey_workspace();
    bin()
        .args([
            "clean",
            "--data-dir",
            workspace.data_dir().to_str().unwrap(),
            "--threshold",
            "2.5",
        ])
        .assert()
        .failure()
        .stderr(contains("low_info_threshold"));
}
