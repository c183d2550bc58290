//! Cross-condition dispersion per group
//!
//! The coefficient of variation of a group's condition means measures how far
//! the condition label moves the metric relative to the group's own scale.

use crate::aggregate::{mean, sample_std};
use crate::sample_table::GroupMeans;
use std::collections::BTreeMap;

/// group -> metric -> CV%, `None` where fewer than two conditions have data
pub type CvPerGroup = BTreeMap<String, BTreeMap<String, Option<f64>>>;

/// Sample sd / |mean| * 100; 0 when the mean is 0, `None` below two values
pub fn cv_percent(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let sd = sample_std(values)?;
    if m == 0.0 {
        return Some(0.0);
    }
    Some(sd / m.abs() * 100.0)
}

/// CV% of condition means per group for one metric
pub fn cross_condition_cv(
    means: &GroupMeans,
    metric: &str,
    conditions: &[String],
) -> BTreeMap<String, Option<f64>> {
    means
        .groups()
        .iter()
        .map(|group| {
            let values: Vec<f64> = conditions
                .iter()
                .filter_map(|condition| means.get(group, condition, metric))
                .collect();
            (group.clone(), cv_percent(&values))
        })
        .collect()
}

/// CV% per group for every metric
pub fn cross_condition_cv_all(
    means: &GroupMeans,
    metrics: &[String],
    conditions: &[String],
) -> CvPerGroup {
    let mut result = CvPerGroup::new();
    for metric in metrics {
        for (group, cv) in cross_condition_cv(means, metric, conditions) {
            result.entry(group).or_default().insert(metric.clone(), cv);
        }
    }
    result
}

/// Mean of the defined per-group CVs
pub fn mean_cv<'a>(per_group: impl IntoIterator<Item = &'a Option<f64>>) -> Option<f64> {
    let defined: Vec<f64> = per_group.into_iter().filter_map(|cv| *cv).collect();
    mean(&defined)
}

/// metric -> mean CV across groups
pub fn mean_cv_by_metric(per_group: &CvPerGroup, metrics: &[String]) -> BTreeMap<String, Option<f64>> {
    metrics
        .iter()
        .map(|metric| {
            let cv = mean_cv(per_group.values().filter_map(|m| m.get(metric)));
            (metric.clone(), cv)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::group_means;
    use crate::sample_table::SampleTable;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_zero_spread_is_zero_cv() {
        assert_eq!(cv_percent(&[1.0, 1.0, 1.0]), Some(0.0));
    }

    #[test]
    fn test_cv_edge_cases() {
        assert_eq!(cv_percent(&[5.0]), None);
        assert_eq!(cv_percent(&[-1.0, 1.0]), Some(0.0));
        // mean 2, sd 1
        assert!((cv_percent(&[1.0, 2.0, 3.0]).unwrap() - 50.0).abs() < 1e-12);
    }

    #[test]
    fn test_cross_condition_cv_per_group() {
        let mut table = SampleTable::new();
        table.extend("p1", "A", "x", [1.0]);
        table.extend("p1", "B", "x", [1.0]);
        table.extend("p1", "C", "x", [1.0]);
        table.extend("p2", "A", "x", [1.0, 3.0]);
        table.extend("p2", "B", "x", [2.0]);
        table.extend("p3", "A", "x", [4.0]);

        let means = group_means(&table);
        let conditions = names(&["A", "B", "C"]);
        let cv = cross_condition_cv(&means, "x", &conditions);
        assert_eq!(cv["p1"], Some(0.0));
        assert_eq!(cv["p2"], Some(0.0));
        assert_eq!(cv["p3"], None);

        let all = cross_condition_cv_all(&means, &names(&["x"]), &conditions);
        let by_metric = mean_cv_by_metric(&all, &names(&["x", "y"]));
        assert_eq!(by_metric["x"], Some(0.0));
        assert_eq!(by_metric["y"], None);
    }

    #[test]
    fn test_mean_cv_ignores_undefined() {
        let values = [Some(10.0), None, Some(20.0)];
        assert_eq!(mean_cv(&values), Some(15.0));
        assert_eq!(mean_cv(&[None, None]), None);
    }
}
