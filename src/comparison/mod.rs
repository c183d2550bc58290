// Paired test engine
//
// - Builds pairwise-complete per-group vectors for (metric, condition pair)
// - Runs Wilcoxon signed-rank and paired t-test, Cohen's d and power
// - Batches every (metric x comparison) cell and exposes the flat p-value
//   family for Benjamini-Hochberg correction
//
// Cells that cannot be computed carry a `CellFailure` marker and contribute
// nothing to the p-value family.

mod paired;

pub use paired::{
    compare, compare_means, paired_vectors, percent_difference, PairedTestResult, PairedVectors,
    TestSummary,
};

use crate::aggregate::group_means;
use crate::config::AnalysisConfig;
use crate::effect::PowerEstimator;
use crate::error::CellOutcome;
use crate::fdr::{benjamini_hochberg, FdrSummary};
use crate::sample_table::{ConditionPair, SampleTable};
use serde::Serialize;
use std::collections::BTreeMap;

/// metric -> comparison key -> result
pub type PairedResults = BTreeMap<String, BTreeMap<String, CellOutcome<PairedTestResult>>>;

/// Which test of a paired result a p-value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TestKind {
    Wilcoxon,
    Ttest,
}

/// One entry of the flat p-value family
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PValueRef {
    pub metric: String,
    pub comparison: String,
    pub test: TestKind,
    pub p_value: f64,
}

/// All paired results of one dataset plus their p-value family
#[derive(Debug, Clone, PartialEq)]
pub struct PairedBatch {
    pub results: PairedResults,
    pub p_values: Vec<PValueRef>,
}

impl PairedBatch {
    pub fn raw_p_values(&self) -> Vec<f64> {
        self.p_values.iter().map(|r| r.p_value).collect()
    }

    /// BH-correct the whole family and annotate each test in place
    pub fn apply_fdr(&mut self, alpha: f64) -> FdrSummary {
        let corrections = benjamini_hochberg(&self.raw_p_values(), alpha);
        for correction in &corrections {
            let reference = &self.p_values[correction.original_index];
            let Some(result) = self
                .results
                .get_mut(&reference.metric)
                .and_then(|m| m.get_mut(&reference.comparison))
                .and_then(CellOutcome::computed_mut)
            else {
                continue;
            };
            let summary = match reference.test {
                TestKind::Wilcoxon => &mut result.wilcoxon_signed_rank,
                TestKind::Ttest => &mut result.paired_ttest,
            };
            summary.annotate(correction.adjusted_p, correction.significant_bh);
        }
        FdrSummary::new(&corrections, alpha)
    }

    /// Computed results in (metric, comparison) order
    pub fn computed(&self) -> impl Iterator<Item = (&str, &str, &PairedTestResult)> {
        self.results.iter().flat_map(|(metric, per_comparison)| {
            per_comparison.iter().filter_map(move |(comparison, outcome)| {
                outcome
                    .computed()
                    .map(|result| (metric.as_str(), comparison.as_str(), result))
            })
        })
    }
}

/// Run every (metric, comparison) paired test of a table
///
/// P-values are collected per metric, per comparison, Wilcoxon before t-test.
pub fn compare_all(
    table: &SampleTable,
    metrics: &[String],
    comparisons: &[ConditionPair],
    config: &AnalysisConfig,
    power: &mut PowerEstimator,
) -> PairedBatch {
    let means = group_means(table);
    let mut results = PairedResults::new();
    let mut p_values = Vec::new();

    for metric in metrics {
        let per_comparison = results.entry(metric.clone()).or_default();
        for pair in comparisons {
            let outcome = compare_means(&means, metric, pair, config, power);
            if let Some(result) = outcome.computed() {
                for (test, p_value) in [
                    (TestKind::Wilcoxon, result.wilcoxon_signed_rank.p_value),
                    (TestKind::Ttest, result.paired_ttest.p_value),
                ] {
                    p_values.push(PValueRef {
                        metric: metric.clone(),
                        comparison: pair.key(),
                        test,
                        p_value,
                    });
                }
            }
            per_comparison.insert(pair.key(), outcome);
        }
    }

    PairedBatch { results, p_values }
}
