//! Report-level summaries over the paired test batch

use crate::aggregate::{mean, median};
use crate::comparison::PairedBatch;
use serde::Serialize;
use std::collections::BTreeMap;

fn fold_max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

fn fold_min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallEffects {
    pub mean_abs_cohens_d: Option<f64>,
    pub median_abs_cohens_d: Option<f64>,
    pub max_abs_cohens_d: Option<f64>,
    pub min_abs_cohens_d: Option<f64>,
    pub n_effects: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonEffects {
    pub mean_abs_cohens_d: Option<f64>,
    pub max_abs_cohens_d: Option<f64>,
    pub n_effects: usize,
}

/// |d| across all computed paired tests, overall and per comparison
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectSizeSummary {
    pub overall: OverallEffects,
    pub per_comparison: BTreeMap<String, ComparisonEffects>,
}

impl EffectSizeSummary {
    pub fn from_batch(batch: &PairedBatch) -> Self {
        let mut all = Vec::new();
        let mut by_comparison: BTreeMap<String, Vec<f64>> = BTreeMap::new();
        for (_, comparison, result) in batch.computed() {
            let d = result.cohens_d.abs();
            all.push(d);
            by_comparison.entry(comparison.to_string()).or_default().push(d);
        }

        let per_comparison = by_comparison
            .into_iter()
            .map(|(key, ds)| {
                let effects = ComparisonEffects {
                    mean_abs_cohens_d: mean(&ds),
                    max_abs_cohens_d: fold_max(&ds),
                    n_effects: ds.len(),
                };
                (key, effects)
            })
            .collect();

        Self {
            overall: OverallEffects {
                mean_abs_cohens_d: mean(&all),
                median_abs_cohens_d: median(&all),
                max_abs_cohens_d: fold_max(&all),
                min_abs_cohens_d: fold_min(&all),
                n_effects: all.len(),
            },
            per_comparison,
        }
    }
}

/// Significant test counts before and after BH correction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SignificanceCounts {
    pub wilcoxon_p005_uncorrected: usize,
    pub wilcoxon_p001_uncorrected: usize,
    pub ttest_p005_uncorrected: usize,
    pub ttest_p001_uncorrected: usize,
    pub wilcoxon_p005_bh_corrected: usize,
    pub ttest_p005_bh_corrected: usize,
    /// Computed (metric, comparison) cells
    pub total_tests: usize,
}

impl SignificanceCounts {
    /// Counts after `PairedBatch::apply_fdr` has annotated the batch
    pub fn from_batch(batch: &PairedBatch) -> Self {
        let mut counts = Self::default();
        for (_, _, result) in batch.computed() {
            counts.total_tests += 1;
            let w = &result.wilcoxon_signed_rank;
            let t = &result.paired_ttest;
            counts.wilcoxon_p005_uncorrected += usize::from(w.p_value < 0.05);
            counts.wilcoxon_p001_uncorrected += usize::from(w.p_value < 0.01);
            counts.ttest_p005_uncorrected += usize::from(t.p_value < 0.05);
            counts.ttest_p001_uncorrected += usize::from(t.p_value < 0.01);
            counts.wilcoxon_p005_bh_corrected += usize::from(w.significant_bh == Some(true));
            counts.ttest_p005_bh_corrected += usize::from(t.significant_bh == Some(true));
        }
        counts
    }
}

/// Design-level power over all computed paired tests
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PowerSummary {
    pub n_paired_observations: Option<usize>,
    pub mean_power_at_observed_d: Option<f64>,
    pub min_power: Option<f64>,
    pub max_power: Option<f64>,
    pub mean_minimum_detectable_effect_d: Option<f64>,
    pub n_adequately_powered_tests: usize,
    pub total_tests: usize,
    pub interpretation: String,
}

impl PowerSummary {
    /// Summary of the analytic t-test power of each computed test
    pub fn from_batch(batch: &PairedBatch, target_power: f64) -> Self {
        let mut n_pairs = None;
        let mut powers = Vec::new();
        let mut mdes = Vec::new();
        let mut adequately_powered = 0;
        for (_, _, result) in batch.computed() {
            let analysis = &result.power_analysis;
            n_pairs.get_or_insert(result.n_pairs);
            powers.push(analysis.power_ttest);
            if let Some(mde) = analysis.minimum_detectable_effect_d {
                mdes.push(mde);
            }
            adequately_powered += usize::from(analysis.adequately_powered);
        }

        let mean_mde = mean(&mdes);
        let interpretation = match (n_pairs, mean_mde) {
            (Some(n), Some(mde)) => format!(
                "With n={} paired observations, this design can reliably detect effects of \
                 d>={:.2} at {:.0}% power. Effects smaller than this may exist but are \
                 undetectable at this sample size.",
                n,
                mde,
                target_power * 100.0
            ),
            _ => "insufficient data".to_string(),
        };

        Self {
            n_paired_observations: n_pairs,
            mean_power_at_observed_d: mean(&powers),
            min_power: fold_min(&powers),
            max_power: fold_max(&powers),
            mean_minimum_detectable_effect_d: mean_mde,
            n_adequately_powered_tests: adequately_powered,
            total_tests: powers.len(),
            interpretation,
        }
    }
}
