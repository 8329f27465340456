// Column-name canonicalization and value normalization.
//
// All lookups are fixed tables. Values that no table knows about pass
// through after trimming and case folding, and running any of these
// functions on their own output changes nothing.
use crate::regions::REGIONS;
use crate::types::{columns, Dataset};
use crate::util::title_case;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use tracing::debug;

static COLUMN_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("UF", columns::REGION),
        ("Estado", columns::REGION),
        ("Unidade Federativa", columns::REGION),
        ("Cidade", columns::CITY),
        ("Municipio", columns::CITY),
        ("Município", columns::CITY),
    ])
});

// Keys are upper-case: lookups happen after upper-casing.
static REGION_ALIASES: Lazy<HashMap<String, &'static str>> = Lazy::new(|| {
    let mut map: HashMap<String, &'static str> = REGIONS
        .iter()
        .map(|&(code, name)| (name.to_uppercase(), code))
        .collect();
    map.insert("SAO PAULO".to_string(), "SP");
    map
});

// Keys are title-case: lookups happen after title-casing. State codes
// such as "Sp" are not city aliases.
static CITY_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("Sao Paulo", "São Paulo"),
        ("S. Paulo", "São Paulo"),
        ("Rio De Janiero", "Rio De Janeiro"),
        ("Bhz", "Belo Horizonte"),
    ])
});

/// Columns that are trimmed but keep their case.
const TRIM_ONLY: [&str; 2] = [columns::STATUS, columns::RESPONSIBLE];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    pub columns_renamed: usize,
    pub regions_changed: usize,
    pub cities_changed: usize,
}

/// Trim every column name, then rename known aliases. Returns how many
/// names were changed.
pub fn canonicalize_columns(names: &mut [String]) -> usize {
    let mut changed = 0;
    for name in names.iter_mut() {
        let trimmed = name.trim();
        let canonical = COLUMN_ALIASES.get(trimmed).copied().unwrap_or(trimmed);
        if canonical != name.as_str() {
            debug!(from = %name, to = canonical, "renamed column");
            *name = canonical.to_string();
            changed += 1;
        }
    }
    changed
}

pub fn normalize_region(raw: &str) -> String {
    let upper = raw.trim().to_uppercase();
    match REGION_ALIASES.get(&upper) {
        Some(code) => (*code).to_string(),
        None => upper,
    }
}

pub fn normalize_city(raw: &str) -> String {
    let titled = title_case(raw.trim());
    match CITY_ALIASES.get(titled.as_str()) {
        Some(fixed) => (*fixed).to_string(),
        None => titled,
    }
}

/// Apply `f` to every column named `column`. A file with two aliases of
/// the same column ends up with duplicate names, and both are normalized.
fn normalize_column<F>(dataset: &mut Dataset, column: &str, f: F) -> usize
where
    F: Fn(&str) -> String,
{
    let indices: Vec<usize> = dataset
        .columns
        .iter()
        .enumerate()
        .filter(|(_, name)| name.as_str() == column)
        .map(|(idx, _)| idx)
        .collect();
    let mut changed = 0;
    for row in dataset.rows.iter_mut() {
        for &idx in &indices {
            if let Some(value) = row.get_mut(idx) {
                let fixed = f(value.as_str());
                if fixed != *value {
                    *value = fixed;
                    changed += 1;
                }
            }
        }
    }
    changed
}

/// Canonicalize headers and normalize the region, city, status and
/// responsible-party columns in place. Absent columns are skipped.
pub fn normalize_dataset(dataset: &mut Dataset) -> NormalizeStats {
    let columns_renamed = canonicalize_columns(&mut dataset.columns);
    let regions_changed = normalize_column(dataset, columns::REGION, normalize_region);
    let cities_changed = normalize_column(dataset, columns::CITY, normalize_city);
    for column in TRIM_ONLY {
        normalize_column(dataset, column, |v| v.trim().to_string());
    }
    let stats = NormalizeStats {
        columns_renamed,
        regions_changed,
        cities_changed,
    };
    debug!(?stats, "normalized dataset");
    stats
}
