//! Per-domain descriptive breakdown
//!
//! Groups carry an optional domain label (e.g. "creative", "technical").
//! Observations of every group in a domain are pooled per condition.

use crate::aggregate::SampleStats;
use crate::sample_table::SampleTable;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DomainSummary {
    pub n_groups: usize,
    /// metric -> condition -> pooled stats; conditions without data omitted
    pub metrics: BTreeMap<String, BTreeMap<String, SampleStats>>,
}

/// domain -> summary
pub type DomainAnalysis = BTreeMap<String, DomainSummary>;

pub fn analyze_by_domain(
    table: &SampleTable,
    domains: &BTreeMap<String, String>,
    metrics: &[String],
    conditions: &[String],
) -> DomainAnalysis {
    let mut members: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (group, domain) in domains {
        members.entry(domain.as_str()).or_default().push(group.as_str());
    }

    members
        .into_iter()
        .map(|(domain, groups)| {
            let mut per_metric = BTreeMap::new();
            for metric in metrics {
                let mut per_condition = BTreeMap::new();
                for condition in conditions {
                    let pooled: Vec<f64> = groups
                        .iter()
                        .flat_map(|g| table.cell(g, condition, metric).iter().copied())
                        .collect();
                    if let Some(stats) = SampleStats::from_values(&pooled) {
                        per_condition.insert(condition.clone(), stats);
                    }
                }
                per_metric.insert(metric.clone(), per_condition);
            }
            let summary = DomainSummary {
                n_groups: groups.len(),
                metrics: per_metric,
            };
            (domain.to_string(), summary)
        })
        .collect()
}
