use std::sync::OnceLock;

use regex::Regex;

use crate::data::{Cell, UNKNOWN};

pub const YEARS_LABELS: &[&str] = &[UNKNOWN, "0", "1-2", "3-5", "6-10", "20+"];

const UNSET: i64 = -1;

static LEADING_INTEGER: OnceLock<Regex> = OnceLock::new();

fn leading_integer() -> &'static Regex {
    LEADING_INTEGER.get_or_init(|| Regex::new(r"^(\d+)").expect("leading integer pattern"))
}

/// Collapses the phrasings used by different survey years onto one spelling.
pub fn unify_years_text(raw: &str) -> &str {
    match raw {
        "Less than a year" => "Less than 1 year",
        "More than 50 years" => "20 or more years",
        other => other,
    }
}

/// Extracts a year count from an answer, `-1` when nothing usable is found.
/// The "less than" check runs before digit extraction so "Less than 1 year"
/// reads as zero rather than one.
pub fn extract_years(cell: &Cell) -> i64 {
    match cell {
        Cell::Number(n) if *n >= 0.0 => n.trunc() as i64,
        Cell::Text(raw) => {
            let unified = unify_years_text(raw.trim());
            if unified == UNKNOWN {
                return UNSET;
            }
            let lowered = unified.to_lowercase();
            if lowered.contains("less than") {
                return 0;
            }
            if lowered.contains("more than") || lowered.contains("20 or more") {
                return 20;
            }
            leading_integer()
                .captures(&lowered)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<i64>().ok())
                .unwrap_or(UNSET)
        }
        _ => UNSET,
    }
}

pub fn years_bucket(years: i64) -> &'static str {
    match years {
        UNSET => UNKNOWN,
        0 => "0",
        1..=2 => "1-2",
        3..=5 => "3-5",
        6..=10 => "6-10",
        _ => "20+",
    }
}

pub fn bucket_years(cell: &Cell) -> &'static str {
    years_bucket(extract_years(cell))
}
