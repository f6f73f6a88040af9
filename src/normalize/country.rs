use std::collections::{BTreeMap, HashSet};

use crate::{
    data::{Cell, OTHER},
    dataset::Column,
    frequency::FrequencyTable,
};

const COUNTRY_ALIASES: &[(&str, &str)] = &[
    ("United States of America", "United States"),
    (
        "United Kingdom of Great Britain and Northern Ireland",
        "United Kingdom",
    ),
];

pub fn builtin_country_aliases() -> BTreeMap<String, String> {
    COUNTRY_ALIASES
        .iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect()
}

/// Unifies official country names and folds everything outside the `top_n`
/// most frequent countries into `Other`. Missing countries start as `Other`
/// and never count towards the ranking.
pub fn group_countries(
    column: &Column,
    aliases: &BTreeMap<String, String>,
    top_n: usize,
) -> Column {
    let renamed = column
        .values
        .iter()
        .map(|cell| match cell {
            Cell::Null => OTHER.to_string(),
            other => {
                let display = other.as_display();
                aliases.get(&display).cloned().unwrap_or(display)
            }
        })
        .collect::<Vec<_>>();

    let counts = FrequencyTable::from_values(&renamed);
    let keep = counts
        .top_excluding(top_n, OTHER)
        .into_iter()
        .collect::<HashSet<_>>();

    let values = renamed
        .into_iter()
        .map(|country| {
            if keep.contains(&country) {
                Cell::Text(country)
            } else {
                Cell::text(OTHER)
            }
        })
        .collect();
    Column::new(column.name.clone(), values)
}
