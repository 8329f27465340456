use crate::filter::{filter_dataset, FilterCriteria};
use crate::regions::{is_known_region, REGIONS};
use crate::types::{
    columns, Dataset, DatasetView, MetricsRow, RegionCount, StatusCount, STATUS_ACTIVE,
    STATUS_NEGOTIATING,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Serialize)]
pub struct RegionCounts {
    /// All 27 regions in code order, zero when absent from the data.
    pub known: Vec<RegionCount>,
    /// Values outside the known set (blank included), sorted by value.
    pub other: BTreeMap<String, usize>,
}

impl RegionCounts {
    pub fn count(&self, code: &str) -> usize {
        self.known
            .iter()
            .find(|r| r.code == code)
            .map(|r| r.count)
            .or_else(|| self.other.get(code).copied())
            .unwrap_or(0)
    }
}

pub fn region_counts(view: &DatasetView<'_>) -> RegionCounts {
    let mut tally: HashMap<&str, usize> = HashMap::new();
    if let Some(values) = view.column_values(columns::REGION) {
        for v in values {
            *tally.entry(v).or_default() += 1;
        }
    }
    let known = REGIONS
        .iter()
        .map(|&(code, name)| RegionCount {
            code: code.to_string(),
            name: name.to_string(),
            count: tally.get(code).copied().unwrap_or(0),
        })
        .collect();
    let other = tally
        .into_iter()
        .filter(|(code, _)| !is_known_region(code))
        .map(|(code, n)| (code.to_string(), n))
        .collect();
    RegionCounts { known, other }
}

/// Rows per status value, largest first; equal counts ordered by status.
pub fn status_counts(view: &DatasetView<'_>) -> Vec<StatusCount> {
    let Some(values) = view.column_values(columns::STATUS) else {
        return Vec::new();
    };
    let mut tally: BTreeMap<&str, usize> = BTreeMap::new();
    for v in values {
        *tally.entry(v).or_default() += 1;
    }
    let mut rows: Vec<StatusCount> = tally
        .into_iter()
        .map(|(status, count)| StatusCount {
            status: status.to_string(),
            count,
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.status.cmp(&b.status)));
    rows
}

pub fn metrics(view: &DatasetView<'_>) -> MetricsRow {
    let (mut active, mut negotiating) = (0, 0);
    if let Some(values) = view.column_values(columns::STATUS) {
        for v in values {
            if v == STATUS_ACTIVE {
                active += 1;
            } else if v == STATUS_NEGOTIATING {
                negotiating += 1;
            }
        }
    }
    MetricsRow {
        total: view.len(),
        active,
        negotiating,
    }
}

/// Everything one dashboard render needs, computed from an immutable
/// dataset and one criteria snapshot.
#[derive(Debug, Clone)]
pub struct Dashboard<'a> {
    pub view: DatasetView<'a>,
    pub selected_region: Option<String>,
    pub metrics: MetricsRow,
    pub status_counts: Vec<StatusCount>,
    /// Counts over the unfiltered dataset; the map highlights the selection.
    pub map_counts: RegionCounts,
    pub ignored: Vec<&'static str>,
    pub missing_status_column: bool,
}

pub fn build_dashboard<'a>(dataset: &'a Dataset, criteria: &FilterCriteria) -> Dashboard<'a> {
    let outcome = filter_dataset(dataset, criteria);
    let view = outcome.view;
    Dashboard {
        selected_region: criteria.selected_region().map(str::to_string),
        metrics: metrics(&view),
        status_counts: status_counts(&view),
        map_counts: region_counts(&dataset.view()),
        ignored: outcome.ignored,
        missing_status_column: !dataset.has_column(columns::STATUS),
        view,
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub selected_region: String,
    pub filtered_rows: usize,
    pub metrics: MetricsRow,
    pub status_counts: Vec<StatusCount>,
    pub map_counts: RegionCounts,
    pub ignored_filters: Vec<String>,
}

pub fn generate_summary(dashboard: &Dashboard<'_>, all_marker: &str) -> DashboardSummary {
    DashboardSummary {
        selected_region: dashboard
            .selected_region
            .clone()
            .unwrap_or_else(|| all_marker.to_string()),
        filtered_rows: dashboard.view.len(),
        metrics: dashboard.metrics.clone(),
        status_counts: dashboard.status_counts.clone(),
        map_counts: dashboard.map_counts.clone(),
        ignored_filters: dashboard.ignored.iter().map(|c| c.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn dataset(columns: &[&str], rows: &[&[&str]]) -> Dataset {
        Dataset::new(
            columns.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    fn bases() -> Dataset {
        dataset(
            &[columns::REGION, columns::STATUS],
            &[
                &["SP", STATUS_ACTIVE],
                &["SP", STATUS_NEGOTIATING],
                &["RJ", STATUS_ACTIVE],
                &["XX", "Parado"],
                &["", STATUS_ACTIVE],
                &["SP", "Parado"],
            ],
        )
    }

    #[test]
    fn region_counts_cover_every_region() {
        let ds = bases();
        let counts = region_counts(&ds.view());
        assert_eq!(counts.known.len(), 27);
        assert_eq!(counts.count("SP"), 3);
        assert_eq!(counts.count("RJ"), 1);
        assert_eq!(counts.count("AC"), 0);
        assert_eq!(counts.count("XX"), 1);
        assert_eq!(counts.other.get(""), Some(&1));
        let total: usize =
            counts.known.iter().map(|r| r.count).sum::<usize>() + counts.other.values().sum::<usize>();
        assert_eq!(total, ds.len());
    }

    #[test]
    fn status_counts_sum_to_view_and_break_ties_by_name() {
        let ds = bases();
        let counts = status_counts(&ds.view());
        let order: Vec<(&str, usize)> = counts.iter().map(|c| (c.status.as_str(), c.count)).collect();
        assert_eq!(
            order,
            vec![(STATUS_ACTIVE, 3), ("Parado", 2), (STATUS_NEGOTIATING, 1)]
        );
        assert_eq!(counts.iter().map(|c| c.count).sum::<usize>(), ds.len());
    }

    #[test]
    fn aggregates_ignore_row_order() {
        let ds = bases();
        let mut reversed = ds.clone();
        reversed.rows.reverse();
        assert_eq!(status_counts(&ds.view()), status_counts(&reversed.view()));
        assert_eq!(
            region_counts(&ds.view()).known,
            region_counts(&reversed.view()).known
        );
    }

    #[test]
    fn metrics_count_known_statuses() {
        let ds = bases();
        let m = metrics(&ds.view());
        assert_eq!((m.total, m.active, m.negotiating), (6, 3, 1));
    }

    #[test]
    fn dashboard_filters_but_map_uses_all_rows() {
        let ds = bases();
        let criteria = FilterCriteria {
            region: Some("SP".to_string()),
            ..Default::default()
        };
        let dash = build_dashboard(&ds, &criteria);
        assert_eq!(dash.view.len(), 3);
        assert_eq!(dash.metrics.total, 3);
        assert_eq!(dash.metrics.active, 1);
        assert_eq!(dash.map_counts.count("SP"), 3);
        assert_eq!(dash.map_counts.count("RJ"), 1);
        assert_eq!(dash.selected_region.as_deref(), Some("SP"));
        assert_eq!(
            dash.status_counts.iter().map(|c| c.count).sum::<usize>(),
            dash.view.len()
        );
    }

    #[test]
    fn missing_status_column_does_not_fail() {
        let ds = dataset(&[columns::REGION], &[&["SP"], &["RJ"]]);
        let criteria = FilterCriteria {
            status: BTreeSet::from(["Ativo".to_string()]),
            ..Default::default()
        };
        let dash = build_dashboard(&ds, &criteria);
        assert!(dash.missing_status_column);
        assert_eq!(dash.view.len(), 2);
        assert!(dash.status_counts.is_empty());
        assert_eq!((dash.metrics.active, dash.metrics.negotiating), (0, 0));
        assert_eq!(dash.ignored, vec![columns::STATUS]);
    }

    #[test]
    fn summary_uses_marker_without_selection() {
        let ds = bases();
        let dash = build_dashboard(&ds, &FilterCriteria::default());
        let summary = generate_summary(&dash, "Todos");
        assert_eq!(summary.selected_region, "Todos");
        assert_eq!(summary.filtered_rows, 6);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["metrics"]["TotalBases"], 6);
    }
}
