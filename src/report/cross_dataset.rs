//! Cross-dataset sensitivity comparison
//!
//! Pure read-only pass over already assembled reports: which dataset (model)
//! reacts most strongly to the condition label, per test and overall.

use super::Report;
use crate::aggregate::mean;
use crate::error::CellOutcome;
use crate::setting::{SettingDifference, COMBINED_KEY};
use serde::Serialize;
use std::collections::BTreeMap;

/// Label used when datasets cannot be ordered
pub const INDETERMINATE: &str = "indeterminate";
const RATIO_FLOOR: f64 = 1e-10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetEffect {
    pub cohens_d: f64,
    pub percent_difference: f64,
}

/// One (metric, comparison) across datasets
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellSensitivity {
    pub per_dataset: BTreeMap<String, DatasetEffect>,
    pub most_sensitive: Option<String>,
    /// Datasets by descending |d|
    pub ranking: Vec<String>,
    /// max |d| / max(min |d|, 1e-10)
    pub sensitivity_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSensitivity {
    pub mean_abs_cohens_d: Option<f64>,
    pub max_abs_cohens_d: Option<f64>,
    pub n_effects: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossDatasetComparison {
    pub datasets: Vec<String>,
    /// metric -> comparison -> sensitivity
    pub per_metric_comparison: BTreeMap<String, BTreeMap<String, CellSensitivity>>,
    pub overall_sensitivity: BTreeMap<String, DatasetSensitivity>,
    pub more_sensitive: String,
    pub less_sensitive: String,
    pub mean_cv_comparison: BTreeMap<String, BTreeMap<String, Option<f64>>>,
    pub setting_comparison: BTreeMap<String, SettingDifference>,
}

/// Unique labels: repeated dataset names get a `#n` suffix
fn dataset_labels(reports: &[Report]) -> Vec<String> {
    let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
    reports
        .iter()
        .map(|report| {
            let name = report.design.dataset.as_str();
            let count = seen.entry(name).or_insert(0);
            *count += 1;
            if *count == 1 {
                name.to_string()
            } else {
                format!("{}#{}", name, count)
            }
        })
        .collect()
}

/// Metrics or comparisons in first-seen order across reports
fn union<'a>(lists: impl Iterator<Item = &'a Vec<String>>) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();
    for list in lists {
        for item in list {
            if !result.contains(item) {
                result.push(item.clone());
            }
        }
    }
    result
}

fn sensitivity(per_dataset: BTreeMap<String, DatasetEffect>) -> CellSensitivity {
    let mut ranking: Vec<(String, f64)> = per_dataset
        .iter()
        .map(|(label, effect)| (label.clone(), effect.cohens_d.abs()))
        .collect();
    ranking.sort_by(|a, b| b.1.total_cmp(&a.1));

    let max = ranking.first().map(|(_, d)| *d);
    let min = ranking.last().map(|(_, d)| *d);
    CellSensitivity {
        most_sensitive: ranking.first().map(|(label, _)| label.clone()),
        sensitivity_ratio: max.zip(min).map(|(max, min)| max / min.max(RATIO_FLOOR)),
        ranking: ranking.into_iter().map(|(label, _)| label).collect(),
        per_dataset,
    }
}

/// Compare effect sizes of two or more reports
pub fn compare_reports(reports: &[Report]) -> CrossDatasetComparison {
    let labels = dataset_labels(reports);
    let metrics = union(reports.iter().map(|r| &r.design.metrics));
    let comparisons = union(reports.iter().map(|r| &r.design.comparisons));

    let mut per_metric_comparison = BTreeMap::new();
    let mut abs_effects: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for metric in &metrics {
        let mut per_comparison = BTreeMap::new();
        for comparison in &comparisons {
            let mut per_dataset = BTreeMap::new();
            for (label, report) in labels.iter().zip(reports) {
                let Some(result) = report
                    .paired_tests
                    .get(metric)
                    .and_then(|m| m.get(comparison))
                    .and_then(CellOutcome::computed)
                else {
                    continue;
                };
                abs_effects
                    .entry(label.as_str())
                    .or_default()
                    .push(result.cohens_d.abs());
                per_dataset.insert(
                    label.clone(),
                    DatasetEffect {
                        cohens_d: result.cohens_d,
                        percent_difference: result.percent_difference,
                    },
                );
            }
            if !per_dataset.is_empty() {
                per_comparison.insert(comparison.clone(), sensitivity(per_dataset));
            }
        }
        per_metric_comparison.insert(metric.clone(), per_comparison);
    }

    let overall_sensitivity: BTreeMap<String, DatasetSensitivity> = labels
        .iter()
        .map(|label| {
            let ds = abs_effects.get(label.as_str()).map(Vec::as_slice).unwrap_or(&[]);
            let summary = DatasetSensitivity {
                mean_abs_cohens_d: mean(ds),
                max_abs_cohens_d: ds.iter().copied().reduce(f64::max),
                n_effects: ds.len(),
            };
            (label.clone(), summary)
        })
        .collect();

    // every dataset needs a defined mean |d| to be ordered
    let ordered: Option<Vec<(&String, f64)>> = labels
        .iter()
        .map(|label| {
            overall_sensitivity
                .get(label)
                .and_then(|s| s.mean_abs_cohens_d)
                .map(|d| (label, d))
        })
        .collect();
    let (more_sensitive, less_sensitive) = match ordered {
        Some(ds) if !ds.is_empty() => {
            let most = ds.iter().fold(ds[0], |best, &cur| if cur.1 > best.1 { cur } else { best });
            let least = ds.iter().fold(ds[0], |best, &cur| if cur.1 < best.1 { cur } else { best });
            (most.0.clone(), least.0.clone())
        }
        _ => (INDETERMINATE.to_string(), INDETERMINATE.to_string()),
    };

    let mean_cv_comparison = labels
        .iter()
        .zip(reports)
        .map(|(label, report)| (label.clone(), report.mean_cv_across_groups.clone()))
        .collect();

    let setting_comparison = labels
        .iter()
        .zip(reports)
        .filter_map(|(label, report)| {
            report
                .setting_comparison
                .as_ref()
                .and_then(|s| s.comparison.get(COMBINED_KEY))
                .and_then(CellOutcome::computed)
                .map(|combined| (label.clone(), combined.clone()))
        })
        .collect();

    tracing::info!(
        "Cross-dataset comparison over {} datasets: more sensitive = {}",
        labels.len(),
        more_sensitive
    );

    CrossDatasetComparison {
        datasets: labels,
        per_metric_comparison,
        overall_sensitivity,
        more_sensitive,
        less_sensitive,
        mean_cv_comparison,
        setting_comparison,
    }
}
