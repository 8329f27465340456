// Filter criteria and their application to a dataset.
//
// Criteria are ANDed. An empty criterion imposes nothing. A criterion on a
// column the file does not have is skipped and reported back to the
// caller instead of failing the whole request.
use crate::types::{columns, Dataset, DatasetView};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, warn};

/// A snapshot of the user's selections. Default means "everything".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub region: Option<String>,
    pub status: BTreeSet<String>,
    pub responsible: BTreeSet<String>,
    pub city: BTreeSet<String>,
    pub consolidator_base: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Equals(String),
    OneOf(BTreeSet<String>),
}

impl Condition {
    fn matches(&self, value: &str) -> bool {
        match self {
            Condition::Equals(wanted) => value == wanted,
            Condition::OneOf(set) => set.contains(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub column: &'static str,
    pub condition: Condition,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.constraints().is_empty()
    }

    /// The selected region code, if any.
    pub fn selected_region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// The non-empty criteria, one constraint per column.
    pub fn constraints(&self) -> Vec<Constraint> {
        let mut out = Vec::new();
        if let Some(region) = &self.region {
            out.push(Constraint {
                column: columns::REGION,
                condition: Condition::Equals(region.clone()),
            });
        }
        let sets = [
            (columns::STATUS, &self.status),
            (columns::RESPONSIBLE, &self.responsible),
            (columns::CITY, &self.city),
            (columns::CONSOLIDATOR_BASE, &self.consolidator_base),
        ];
        for (column, set) in sets {
            if !set.is_empty() {
                out.push(Constraint {
                    column,
                    condition: Condition::OneOf(set.clone()),
                });
            }
        }
        out
    }
}

#[derive(Debug, Clone)]
pub struct FilterOutcome<'a> {
    pub view: DatasetView<'a>,
    /// Columns named by a criterion but absent from the dataset.
    pub ignored: Vec<&'static str>,
}

/// Narrow `view` by every constraint. The order of `constraints` does not
/// change the resulting rows.
pub fn apply_constraints<'a>(mut view: DatasetView<'a>, constraints: &[Constraint]) -> FilterOutcome<'a> {
    let mut ignored = Vec::new();
    for constraint in constraints {
        let applied = view.retain_by(constraint.column, |v| constraint.condition.matches(v));
        if applied.is_none() {
            warn!(column = constraint.column, "filter references a missing column; ignoring it");
            ignored.push(constraint.column);
        }
    }
    ignored.sort_unstable();
    FilterOutcome { view, ignored }
}

pub fn filter_dataset<'a>(dataset: &'a Dataset, criteria: &FilterCriteria) -> FilterOutcome<'a> {
    let outcome = apply_constraints(dataset.view(), &criteria.constraints());
    debug!(
        total = dataset.len(),
        kept = outcome.view.len(),
        "applied filters"
    );
    outcome
}

/// Sorted distinct non-blank values of a column; empty when the column is absent.
pub fn column_options(dataset: &Dataset, column: &str) -> Vec<String> {
    let view = dataset.view();
    let Some(values) = view.column_values(column) else {
        return Vec::new();
    };
    let distinct: HashSet<&str> = values.filter(|v| !v.trim().is_empty()).collect();
    let mut out: Vec<String> = distinct.into_iter().map(str::to_string).collect();
    out.sort();
    out
}
