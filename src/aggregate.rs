//! Descriptive aggregation over a `SampleTable`
//!
//! Grand means are two-level: cells collapse to group means first, then group
//! means are summarized across groups. The group is the unit of replication,
//! so groups with many samples do not outweigh groups with few.

use crate::error::{CellError, CellOutcome};
use crate::sample_table::{GroupMeans, SampleTable};
use serde::Serialize;
use statrs::statistics::{Data, Median};
use std::collections::BTreeMap;

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample variance (ddof = 1), `None` below two values
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some(ss / (values.len() - 1) as f64)
}

/// Sample standard deviation (ddof = 1), `None` below two values
pub fn sample_std(values: &[f64]) -> Option<f64> {
    sample_variance(values).map(f64::sqrt)
}

/// Median in full f64 precision via statrs' order statistics
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let m = Data::new(values.to_vec()).median();
    if m.is_nan() {
        tracing::warn!("Failed to compute median of {} values", values.len());
        return None;
    }
    Some(m)
}

/// Collapse every cell of the table to its arithmetic mean
pub fn group_means(table: &SampleTable) -> GroupMeans {
    let mut means = BTreeMap::new();
    for group in table.groups() {
        let mut per_condition: BTreeMap<String, BTreeMap<String, Option<f64>>> = BTreeMap::new();
        for (condition, metric) in table.cell_index(group) {
            let m = mean(table.cell(group, condition, metric));
            per_condition
                .entry(condition.to_string())
                .or_default()
                .insert(metric.to_string(), m);
        }
        means.insert(group.clone(), per_condition);
    }
    GroupMeans::from_parts(table.groups().to_vec(), means)
}

/// Across-group summary of one condition/metric
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrandMean {
    pub mean: f64,
    /// Sample standard deviation of group means, absent with a single group
    pub std: Option<f64>,
    pub median: Option<f64>,
    pub n_groups: usize,
}

/// Grand means per condition and metric, computed from group means
pub fn grand_means(
    table: &SampleTable,
    conditions: &[String],
    metrics: &[String],
) -> BTreeMap<String, BTreeMap<String, CellOutcome<GrandMean>>> {
    grand_means_from(&group_means(table), conditions, metrics)
}

/// Grand means from already computed group means
pub fn grand_means_from(
    means: &GroupMeans,
    conditions: &[String],
    metrics: &[String],
) -> BTreeMap<String, BTreeMap<String, CellOutcome<GrandMean>>> {
    let mut result = BTreeMap::new();
    for condition in conditions {
        let mut per_metric = BTreeMap::new();
        for metric in metrics {
            let column = means.column(condition, metric);
            let summary = match mean(&column) {
                Some(m) => CellOutcome::Computed(GrandMean {
                    mean: m,
                    std: sample_std(&column),
                    median: median(&column),
                    n_groups: column.len(),
                }),
                None => CellOutcome::failed(CellError::NoData),
            };
            per_metric.insert(metric.clone(), summary);
        }
        result.insert(condition.clone(), per_metric);
    }
    result
}

/// Summary of raw observations pooled across groups
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleStats {
    pub mean: f64,
    pub std: Option<f64>,
    pub median: Option<f64>,
    pub n_samples: usize,
}

impl SampleStats {
    pub fn from_values(values: &[f64]) -> Option<Self> {
        Some(Self {
            mean: mean(values)?,
            std: sample_std(values),
            median: median(values),
            n_samples: values.len(),
        })
    }
}

/// Sample-level descriptive statistics, metric -> condition
///
/// Conditions without any observation are omitted.
pub fn sample_level_stats(
    table: &SampleTable,
    conditions: &[String],
    metrics: &[String],
) -> BTreeMap<String, BTreeMap<String, SampleStats>> {
    let mut result = BTreeMap::new();
    for metric in metrics {
        let mut per_condition = BTreeMap::new();
        for condition in conditions {
            if let Some(stats) = SampleStats::from_values(&table.pooled(condition, metric)) {
                per_condition.insert(condition.clone(), stats);
            }
        }
        result.insert(metric.clone(), per_condition);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_mean_and_std() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
        assert_eq!(sample_std(&[4.0]), None);
        let std = sample_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((std - 2.138089935299395).abs() < 1e-12);
    }

    #[test]
    fn test_median_odd_and_even() {
        assert_eq!(median(&[5.0, 1.0, 3.0]), Some(3.0));
        assert_eq!(median(&[1.0, 2.0, 3.0, 4.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_median_keeps_f64_precision() {
        assert_eq!(median(&[0.1]), Some(0.1));

        let values = [0.612345678, 0.612345679, 0.61234568];
        let m = median(&values).unwrap();
        assert_eq!(m, 0.612345679);
        assert!(m >= 0.612345678 && m <= 0.61234568);
    }

    #[test]
    fn test_single_group_median_matches_mean() {
        let mut table = SampleTable::new();
        table.extend("p1", "A", "x", [0.1]);
        let grand = grand_means(&table, &names(&["A"]), &names(&["x"]));
        let a = grand["A"]["x"].computed().unwrap();
        assert_eq!(a.median, Some(a.mean));
    }

    #[test]
    fn test_group_means_empty_cell_is_none() {
        let mut table = SampleTable::new();
        table.extend("p1", "A", "x", [1.0, 3.0]);
        table.record("p2", "A", "x", None);
        let means = group_means(&table);
        assert_eq!(means.get("p1", "A", "x"), Some(2.0));
        assert_eq!(means.get("p2", "A", "x"), None);
        assert_eq!(means.get("p1", "B", "x"), None);
    }

    #[test]
    fn test_grand_means_are_two_level() {
        // p1 has many samples, p2 a single one: the grand mean weights groups equally
        let mut table = SampleTable::new();
        table.extend("p1", "A", "x", [10.0, 10.0, 10.0, 10.0]);
        table.extend("p2", "A", "x", [0.0]);
        let grand = grand_means(&table, &names(&["A", "B"]), &names(&["x"]));

        let a = grand["A"]["x"].computed().unwrap();
        assert_eq!(a.mean, 5.0);
        assert_eq!(a.n_groups, 2);
        assert!((a.std.unwrap() - 50.0_f64.sqrt()).abs() < 1e-12);

        assert!(grand["B"]["x"].failure().is_some());
    }

    #[test]
    fn test_sample_level_stats_pool_raw_values() {
        let mut table = SampleTable::new();
        table.extend("p1", "A", "x", [10.0, 10.0, 10.0, 10.0]);
        table.extend("p2", "A", "x", [0.0]);
        let stats = sample_level_stats(&table, &names(&["A", "B"]), &names(&["x"]));
        let a = &stats["x"]["A"];
        assert_eq!(a.mean, 8.0);
        assert_eq!(a.n_samples, 5);
        assert!(!stats["x"].contains_key("B"));
    }
}
