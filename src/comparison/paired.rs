//! Paired comparison of two conditions on one metric
//!
//! Every group contributes one mean per condition. Only groups with a defined
//! mean under both conditions are kept, and both vectors walk the table's
//! group order, so index `i` is the same group on either side.

use crate::aggregate::{group_means, mean};
use crate::config::AnalysisConfig;
use crate::effect::{paired_effect, EffectMagnitude, PowerAnalysis, PowerEstimator};
use crate::error::{CellError, CellFailure, CellOutcome};
use crate::hypothesis::{paired_ttest, wilcoxon_signed_rank};
use crate::sample_table::{ConditionPair, GroupMeans, SampleTable};
use serde::Serialize;

/// Aligned per-group means of two conditions
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairedVectors {
    pub groups: Vec<String>,
    pub alt: Vec<f64>,
    pub base: Vec<f64>,
}

impl PairedVectors {
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// `alt - base` per group
    pub fn differences(&self) -> Vec<f64> {
        self.alt.iter().zip(&self.base).map(|(a, b)| a - b).collect()
    }
}

/// Pairwise-complete group means for `pair` on `metric`
pub fn paired_vectors(means: &GroupMeans, metric: &str, pair: &ConditionPair) -> PairedVectors {
    let mut vectors = PairedVectors::default();
    for group in means.groups() {
        let alt = means.get(group, &pair.alt, metric);
        let base = means.get(group, &pair.base, metric);
        if let (Some(alt), Some(base)) = (alt, base) {
            vectors.groups.push(group.clone());
            vectors.alt.push(alt);
            vectors.base.push(base);
        }
    }
    vectors
}

/// Statistic and p-value of one test, with BH annotations once corrected
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestSummary {
    /// Absent when the statistic is undefined or infinite
    pub statistic: Option<f64>,
    pub p_value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p_value_bh_adjusted: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub significant_bh: Option<bool>,
}

impl TestSummary {
    fn new(statistic: Option<f64>, p_value: f64) -> Self {
        Self {
            statistic,
            p_value,
            p_value_bh_adjusted: None,
            significant_bh: None,
        }
    }

    pub fn annotate(&mut self, adjusted_p: f64, significant: bool) {
        self.p_value_bh_adjusted = Some(adjusted_p);
        self.significant_bh = Some(significant);
    }
}

/// Outcome of one (metric, condition pair) paired comparison
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairedTestResult {
    pub n_pairs: usize,
    pub mean_alt_source: f64,
    pub mean_base_source: f64,
    /// Primary effect on the metric's own scale
    pub mean_difference: f64,
    /// Relative to |mean_base_source|; 0 when the base mean is exactly 0
    pub percent_difference: f64,
    /// |percent_difference| exceeds the configured limit
    pub percent_difference_unstable: bool,
    pub wilcoxon_signed_rank: TestSummary,
    pub paired_ttest: TestSummary,
    pub cohens_d: f64,
    pub effect_size_interpretation: EffectMagnitude,
    pub variance_collapse: bool,
    pub power_analysis: PowerAnalysis,
}

/// Percent difference of `mean_difference` relative to |base|
pub fn percent_difference(mean_difference: f64, base: f64) -> f64 {
    if base == 0.0 {
        0.0
    } else {
        mean_difference / base.abs() * 100.0
    }
}

/// Compare two conditions on one metric, computing group means from the table
pub fn compare(
    table: &SampleTable,
    metric: &str,
    pair: &ConditionPair,
    config: &AnalysisConfig,
    power: &mut PowerEstimator,
) -> CellOutcome<PairedTestResult> {
    compare_means(&group_means(table), metric, pair, config, power)
}

/// Compare two conditions on one metric from precomputed group means
pub fn compare_means(
    means: &GroupMeans,
    metric: &str,
    pair: &ConditionPair,
    config: &AnalysisConfig,
    power: &mut PowerEstimator,
) -> CellOutcome<PairedTestResult> {
    if means.column(&pair.alt, metric).is_empty() || means.column(&pair.base, metric).is_empty() {
        tracing::warn!("{} / {}: missing source data", metric, pair);
        return CellOutcome::failed(CellError::MissingSourceData);
    }

    let vectors = paired_vectors(means, metric, pair);
    let n = vectors.len();
    if n < config.min_pairs {
        tracing::warn!("{} / {}: insufficient data (n={})", metric, pair, n);
        return CellOutcome::Failed(CellFailure::with_n(CellError::InsufficientData, n));
    }

    let differences = vectors.differences();
    let (Some(mean_alt), Some(mean_base), Some(mean_diff)) =
        (mean(&vectors.alt), mean(&vectors.base), mean(&differences))
    else {
        return CellOutcome::Failed(CellFailure::with_n(CellError::InsufficientData, n));
    };

    let Some(ttest) = paired_ttest(&vectors.alt, &vectors.base) else {
        return CellOutcome::Failed(CellFailure::with_n(
            CellError::TestFailure("paired t-test undefined".to_string()),
            n,
        ));
    };
    let wilcoxon = wilcoxon_signed_rank(&differences);

    let pct = percent_difference(mean_diff, mean_base);
    let effect = paired_effect(&differences, config.max_effect_size);
    if effect.variance_collapse {
        tracing::warn!(
            "{} / {}: paired differences have no spread, d capped at {}",
            metric,
            pair,
            effect.d
        );
    }

    let power_analysis = power.analyze(effect.d, n);
    tracing::debug!(
        "{} / {}: n={}, d={:.4}, p_w={:.4}, p_t={:.4}",
        metric,
        pair,
        n,
        effect.d,
        wilcoxon.p_value,
        ttest.p_value
    );

    CellOutcome::Computed(PairedTestResult {
        n_pairs: n,
        mean_alt_source: mean_alt,
        mean_base_source: mean_base,
        mean_difference: mean_diff,
        percent_difference: pct,
        percent_difference_unstable: pct.abs() > config.percent_difference_limit,
        wilcoxon_signed_rank: TestSummary::new(wilcoxon.statistic, wilcoxon.p_value),
        paired_ttest: TestSummary::new(ttest.statistic, ttest.p_value),
        cohens_d: effect.d,
        effect_size_interpretation: EffectMagnitude::from_d(effect.d),
        variance_collapse: effect.variance_collapse,
        power_analysis,
    })
}
