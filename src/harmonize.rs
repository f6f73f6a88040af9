//! Alias resolution and projection onto the canonical schema.

use std::collections::BTreeMap;

use log::{debug, info};

use crate::{
    data::Cell,
    dataset::{Column, Dataset},
    error::Result,
    schema::CanonicalSchema,
};

/// Fills every null in `base` with the value at the same row in `fallback`.
fn combine_first(base: &mut [Cell], fallback: &[Cell]) {
    for (slot, candidate) in base.iter_mut().zip(fallback) {
        if slot.is_null() && !candidate.is_null() {
            *slot = candidate.clone();
        }
    }
}

/// Collapses the alias columns of each canonical field into one column named
/// after the field.
///
/// Aliases are merged in registry order: the first alias present supplies the
/// base values and later aliases only fill rows that are still null. A column
/// already carrying the canonical name outranks the merged aliases wherever it
/// has a value. Alias columns are dropped afterwards; unrelated columns are
/// kept for the projector to discard.
pub fn resolve_aliases(dataset: &Dataset, schema: &CanonicalSchema) -> Result<Dataset> {
    let mut output = dataset.clone();
    for field in &schema.fields {
        let present = field
            .aliases
            .iter()
            .filter(|alias| dataset.contains(alias))
            .collect::<Vec<_>>();
        let Some((first, rest)) = present.split_first() else {
            continue;
        };

        let mut merged = dataset
            .column(first)
            .map(|c| c.values.clone())
            .unwrap_or_default();
        for alias in rest {
            if let Some(column) = dataset.column(alias) {
                combine_first(&mut merged, &column.values);
            }
        }

        let canonical_is_alias = field.aliases.iter().any(|a| a == &field.name);
        if !canonical_is_alias && let Some(existing) = dataset.column(&field.name) {
            let mut preferred = existing.values.clone();
            combine_first(&mut preferred, &merged);
            merged = preferred;
        }

        debug!(
            "Resolved '{}' from {} alias column(s): {:?}",
            field.name,
            present.len(),
            present
        );
        for alias in &present {
            if **alias != field.name {
                output.remove_column(alias);
            }
        }
        output.set_column(Column::new(field.name.clone(), merged))?;
    }
    Ok(output)
}

/// Restricts a dataset to exactly the canonical fields, in registry order,
/// inserting all-null columns for fields the year never asked about.
pub fn project_to_schema(dataset: &Dataset, schema: &CanonicalSchema) -> Dataset {
    dataset.select(&schema.field_names())
}

pub fn harmonize(dataset: &Dataset, schema: &CanonicalSchema) -> Result<Dataset> {
    let resolved = resolve_aliases(dataset, schema)?;
    Ok(project_to_schema(&resolved, schema))
}

pub fn harmonize_years(
    years: &BTreeMap<i32, Dataset>,
    schema: &CanonicalSchema,
) -> Result<BTreeMap<i32, Dataset>> {
    let mut out = BTreeMap::new();
    for (year, dataset) in years {
        let unrecognised = dataset
            .column_names()
            .into_iter()
            .filter(|name| schema.canonical_for(name).is_none())
            .collect::<Vec<_>>();
        if !unrecognised.is_empty() {
            debug!(
                "{year}: discarding {} column(s) outside the schema: {:?}",
                unrecognised.len(),
                unrecognised
            );
        }
        let harmonized = harmonize(dataset, schema)?;
        let populated = harmonized
            .columns()
            .iter()
            .filter(|c| !c.is_all_null())
            .count();
        info!(
            "{year}: kept {} canonical column(s) ({populated} populated) across {} row(s)",
            harmonized.column_count(),
            harmonized.row_count()
        );
        out.insert(*year, harmonized);
    }
    Ok(out)
}
