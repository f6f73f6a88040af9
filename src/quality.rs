use std::collections::BTreeMap;

use log::info;
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;

pub const DEFAULT_LOW_INFO_THRESHOLD: f64 = 0.05;

/// Columns removed from one year's dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityReport {
    pub year: i32,
    pub empty_dropped: Vec<String>,
    pub low_info_dropped: Vec<String>,
}

/// Drops columns with no values at all, then columns whose coverage is
/// strictly below `threshold`. A column sitting exactly on the threshold is
/// kept.
pub fn drop_empty_and_low_info(dataset: &Dataset, threshold: f64) -> (Dataset, QualityReport) {
    let mut report = QualityReport::default();
    let mut output = dataset.clone();

    output.retain_columns(|column| {
        if column.is_all_null() {
            report.empty_dropped.push(column.name.clone());
            false
        } else {
            true
        }
    });

    output.retain_columns(|column| {
        if column.coverage() < threshold {
            report.low_info_dropped.push(column.name.clone());
            false
        } else {
            true
        }
    });

    (output, report)
}

/// Applies [`drop_empty_and_low_info`] to each year on its own.
pub fn filter_years(
    years: &BTreeMap<i32, Dataset>,
    threshold: f64,
) -> (BTreeMap<i32, Dataset>, Vec<QualityReport>) {
    let mut out = BTreeMap::new();
    let mut reports = Vec::with_capacity(years.len());
    for (year, dataset) in years {
        let (filtered, mut report) = drop_empty_and_low_info(dataset, threshold);
        report.year = *year;
        info!(
            "Year {year}: dropping {} empty column(s)",
            report.empty_dropped.len()
        );
        info!(
            "Year {year}: dropping {} low-info column(s) (coverage < {threshold})",
            report.low_info_dropped.len()
        );
        out.insert(*year, filtered);
        reports.push(report);
    }
    (out, reports)
}
