//! Normalized sample storage keyed by (group, condition, metric)
//!
//! A group is the unit of repeated measurement (a prompt), a condition is the
//! treatment being compared (an entropy source label) and a metric is the
//! outcome variable. Each cell holds the raw observations in insertion order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

type Cells = BTreeMap<String, BTreeMap<String, BTreeMap<String, Vec<f64>>>>;

/// Raw observations per (group, condition, metric) cell
///
/// Groups keep their first-insertion order; every paired vector built from
/// the table walks groups in that order so index `i` always refers to the
/// same group in both vectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SampleTable {
    groups: Vec<String>,
    cells: Cells,
}

impl SampleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a group without observations
    pub fn ensure_group(&mut self, group: &str) {
        if !self.cells.contains_key(group) {
            self.groups.push(group.to_string());
            self.cells.insert(group.to_string(), BTreeMap::new());
        }
    }

    /// Record one observation
    ///
    /// `None` and non-finite values are absent observations: the group is
    /// registered but nothing is stored, so empty and missing cells stay
    /// indistinguishable.
    pub fn record(&mut self, group: &str, condition: &str, metric: &str, value: Option<f64>) {
        self.ensure_group(group);
        let Some(value) = value.filter(|v| v.is_finite()) else {
            return;
        };
        self.cells
            .entry(group.to_string())
            .or_default()
            .entry(condition.to_string())
            .or_default()
            .entry(metric.to_string())
            .or_default()
            .push(value);
    }

    /// Record a batch of observations for one cell
    pub fn extend(
        &mut self,
        group: &str,
        condition: &str,
        metric: &str,
        values: impl IntoIterator<Item = f64>,
    ) {
        self.ensure_group(group);
        for value in values {
            self.record(group, condition, metric, Some(value));
        }
    }

    /// Groups in first-insertion order
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Observations of one cell; empty when the cell was never filled
    pub fn cell(&self, group: &str, condition: &str, metric: &str) -> &[f64] {
        self.cells
            .get(group)
            .and_then(|c| c.get(condition))
            .and_then(|m| m.get(metric))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// (condition, metric) keys with a stored cell for one group
    pub fn cell_index<'a>(&'a self, group: &str) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.cells.get(group).into_iter().flat_map(|conditions| {
            conditions.iter().flat_map(|(condition, metrics)| {
                metrics
                    .keys()
                    .map(move |metric| (condition.as_str(), metric.as_str()))
            })
        })
    }

    /// All observations of a condition/metric pooled across groups, in group order
    pub fn pooled(&self, condition: &str, metric: &str) -> Vec<f64> {
        self.groups
            .iter()
            .flat_map(|g| self.cell(g, condition, metric).iter().copied())
            .collect()
    }

    /// Whether any group has at least one observation for the condition/metric
    pub fn has_condition(&self, condition: &str, metric: &str) -> bool {
        self.groups
            .iter()
            .any(|g| !self.cell(g, condition, metric).is_empty())
    }

    /// Total number of stored observations
    pub fn n_observations(&self) -> usize {
        self.cells
            .values()
            .flat_map(BTreeMap::values)
            .flat_map(BTreeMap::values)
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.n_observations() == 0
    }

    /// Merge another table into this one, appending observations cell by cell
    pub fn merge(&mut self, other: &SampleTable) {
        for group in &other.groups {
            self.ensure_group(group);
            let Some(conditions) = other.cells.get(group) else {
                continue;
            };
            for (condition, metrics) in conditions {
                for (metric, values) in metrics {
                    self.extend(group, condition, metric, values.iter().copied());
                }
            }
        }
    }
}

/// Per-group cell means, recomputed from a `SampleTable`
///
/// `None` marks an empty cell; a mean is never substituted by zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupMeans {
    groups: Vec<String>,
    means: BTreeMap<String, BTreeMap<String, BTreeMap<String, Option<f64>>>>,
}

impl GroupMeans {
    pub(crate) fn from_parts(
        groups: Vec<String>,
        means: BTreeMap<String, BTreeMap<String, BTreeMap<String, Option<f64>>>>,
    ) -> Self {
        Self { groups, means }
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Mean of one cell, `None` if the cell is empty or unknown
    pub fn get(&self, group: &str, condition: &str, metric: &str) -> Option<f64> {
        self.means
            .get(group)
            .and_then(|c| c.get(condition))
            .and_then(|m| m.get(metric))
            .copied()
            .flatten()
    }

    /// Defined group means of a condition/metric, in group order
    pub fn column(&self, condition: &str, metric: &str) -> Vec<f64> {
        self.groups
            .iter()
            .filter_map(|g| self.get(g, condition, metric))
            .collect()
    }
}

/// Ordered pair of conditions: `alt` is compared against `base`
///
/// Differences are `alt - base`; percent differences are relative to `base`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConditionPair {
    pub alt: String,
    pub base: String,
}

impl ConditionPair {
    pub fn new(alt: impl Into<String>, base: impl Into<String>) -> Self {
        Self {
            alt: alt.into(),
            base: base.into(),
        }
    }

    /// Stable report key, e.g. `TRNG_vs_PRNG`
    pub fn key(&self) -> String {
        format!("{}_vs_{}", self.alt, self.base)
    }
}

impl fmt::Display for ConditionPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_vs_{}", self.alt, self.base)
    }
}
