// Two-level approximation of a random-intercept model
//
// metric ~ condition + (1 | group) is approximated in two views:
// - random effects (primary): per-group effects meanA - meanB are treated
//   as a sample of true effects and tested against zero with a one-sample t
// - pooled Welch (naive baseline): every raw observation pooled per
//   condition, ignoring groups; its degrees of freedom are overstated
//
// Random-effects p-values form their own Benjamini-Hochberg family.

use crate::aggregate::{mean, sample_std};
use crate::config::AnalysisConfig;
use crate::effect::{cohens_d_independent, paired_effect, EffectMagnitude};
use crate::error::{CellError, CellFailure, CellOutcome};
use crate::fdr::{benjamini_hochberg, FdrSummary};
use crate::hypothesis::{one_sample_ttest, welch_ttest};
use crate::sample_table::{ConditionPair, SampleTable};
use serde::Serialize;
use std::collections::BTreeMap;

/// Role label of the random-effects view in reports
pub const PRIMARY_ROLE: &str = "primary";
/// Role label of the pooled view in reports
pub const BASELINE_ROLE: &str = "naive_baseline";

/// Test of the mean per-group effect against zero
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RandomEffects {
    pub role: &'static str,
    pub mean_effect: f64,
    /// Sample sd of per-group effects / sqrt(n_groups)
    pub se_effect: f64,
    pub t_statistic: Option<f64>,
    pub p_value: f64,
    pub df: f64,
    /// Paired d over per-group condition means
    pub cohens_d: f64,
    pub effect_interpretation: EffectMagnitude,
    pub variance_collapse: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub p_value_bh_adjusted: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub significant_bh: Option<bool>,
}

/// Welch's t-test on all raw observations, group structure ignored
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PooledWelch {
    pub role: &'static str,
    pub t_statistic: Option<f64>,
    pub p_value: f64,
    pub df: f64,
    pub cohens_d: f64,
    pub effect_interpretation: EffectMagnitude,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MixedEffectsResult {
    pub n_groups: usize,
    pub n_samples_a: usize,
    pub n_samples_b: usize,
    pub random_effects: RandomEffects,
    pub sample_level_welch: CellOutcome<PooledWelch>,
}

/// metric -> comparison key -> result
pub type MixedEffectsResults = BTreeMap<String, BTreeMap<String, CellOutcome<MixedEffectsResult>>>;

/// Mixed-effects approximation for one (metric, condition pair)
///
/// Groups qualify when both cells hold at least one observation; fewer than
/// `config.min_pairs` qualifying groups yields `InsufficientGroups`.
pub fn mixed_effects(
    table: &SampleTable,
    metric: &str,
    pair: &ConditionPair,
    config: &AnalysisConfig,
) -> CellOutcome<MixedEffectsResult> {
    let mut means_a = Vec::new();
    let mut means_b = Vec::new();
    let mut pooled_a = Vec::new();
    let mut pooled_b = Vec::new();

    for group in table.groups() {
        let a = table.cell(group, &pair.alt, metric);
        let b = table.cell(group, &pair.base, metric);
        let (Some(mean_a), Some(mean_b)) = (mean(a), mean(b)) else {
            continue;
        };
        means_a.push(mean_a);
        means_b.push(mean_b);
        pooled_a.extend_from_slice(a);
        pooled_b.extend_from_slice(b);
    }

    let n_groups = means_a.len();
    if n_groups < config.min_pairs {
        tracing::warn!(
            "{} / {}: insufficient groups for mixed effects (n={})",
            metric,
            pair,
            n_groups
        );
        return CellOutcome::Failed(CellFailure::with_n(CellError::InsufficientGroups, n_groups));
    }

    let effects: Vec<f64> = means_a.iter().zip(&means_b).map(|(a, b)| a - b).collect();
    let (Some(mean_effect), Some(sd_effect), Some(ttest)) = (
        mean(&effects),
        sample_std(&effects),
        one_sample_ttest(&effects, 0.0),
    ) else {
        return CellOutcome::Failed(CellFailure::with_n(CellError::InsufficientGroups, n_groups));
    };
    let effect = paired_effect(&effects, config.max_effect_size);

    let random_effects = RandomEffects {
        role: PRIMARY_ROLE,
        mean_effect,
        se_effect: sd_effect / (n_groups as f64).sqrt(),
        t_statistic: ttest.statistic,
        p_value: ttest.p_value,
        df: ttest.df,
        cohens_d: effect.d,
        effect_interpretation: EffectMagnitude::from_d(effect.d),
        variance_collapse: effect.variance_collapse,
        p_value_bh_adjusted: None,
        significant_bh: None,
    };

    let sample_level_welch = match welch_ttest(&pooled_a, &pooled_b) {
        Ok(welch) => {
            let d = cohens_d_independent(&pooled_a, &pooled_b);
            CellOutcome::Computed(PooledWelch {
                role: BASELINE_ROLE,
                t_statistic: welch.statistic,
                p_value: welch.p_value,
                df: welch.df,
                cohens_d: d,
                effect_interpretation: EffectMagnitude::from_d(d),
            })
        }
        Err(e) => {
            tracing::warn!("{} / {}: pooled Welch test failed: {:#}", metric, pair, e);
            CellOutcome::failed(CellError::TestFailure(format!("{:#}", e)))
        }
    };

    tracing::debug!(
        "{} / {}: random-effects d={:.4} p={:.4} over {} groups",
        metric,
        pair,
        random_effects.cohens_d,
        random_effects.p_value,
        n_groups
    );

    CellOutcome::Computed(MixedEffectsResult {
        n_groups,
        n_samples_a: pooled_a.len(),
        n_samples_b: pooled_b.len(),
        random_effects,
        sample_level_welch,
    })
}

/// Every (metric, comparison) mixed-effects result of a table
pub fn mixed_effects_all(
    table: &SampleTable,
    metrics: &[String],
    comparisons: &[ConditionPair],
    config: &AnalysisConfig,
) -> MixedEffectsResults {
    metrics
        .iter()
        .map(|metric| {
            let per_comparison = comparisons
                .iter()
                .map(|pair| (pair.key(), mixed_effects(table, metric, pair, config)))
                .collect();
            (metric.clone(), per_comparison)
        })
        .collect()
}

/// BH-correct the random-effects p-values as one family
///
/// Returns `None` when no cell was computed.
pub fn apply_mixed_effects_fdr(results: &mut MixedEffectsResults, alpha: f64) -> Option<FdrSummary> {
    let mut computed: Vec<&mut RandomEffects> = results
        .values_mut()
        .flat_map(BTreeMap::values_mut)
        .filter_map(CellOutcome::computed_mut)
        .map(|result| &mut result.random_effects)
        .collect();
    if computed.is_empty() {
        return None;
    }

    let p_values: Vec<f64> = computed.iter().map(|re| re.p_value).collect();
    let corrections = benjamini_hochberg(&p_values, alpha);
    for correction in &corrections {
        let re = &mut computed[correction.original_index];
        re.p_value_bh_adjusted = Some(correction.adjusted_p);
        re.significant_bh = Some(correction.significant_bh);
    }
    Some(FdrSummary::new(&corrections, alpha))
}
