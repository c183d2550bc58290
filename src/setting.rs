//! Single-turn vs multi-turn comparison of one metric
//!
//! Observations are pooled across groups within each setting, so this is an
//! independent-samples comparison (Welch), not a paired one.

use crate::aggregate::mean;
use crate::comparison::percent_difference;
use crate::effect::{cohens_d_independent, EffectMagnitude};
use crate::error::{CellError, CellOutcome};
use crate::hypothesis::welch_ttest;
use crate::sample_table::SampleTable;
use serde::Serialize;
use std::collections::BTreeMap;

/// Metric compared across settings unless told otherwise
pub const DEFAULT_SETTING_METRIC: &str = "word_diversity";
/// Key of the comparison over all conditions pooled together
pub const COMBINED_KEY: &str = "ALL_SOURCES_COMBINED";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    MultiTurnHigher,
    SingleTurnHigher,
    NoDifference,
}

impl Direction {
    fn of(difference: f64) -> Self {
        if difference > 0.0 {
            Direction::MultiTurnHigher
        } else if difference < 0.0 {
            Direction::SingleTurnHigher
        } else {
            Direction::NoDifference
        }
    }
}

/// Pooled mean and count of one condition in one setting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingSummary {
    pub mean: Option<f64>,
    pub n: usize,
}

/// Multi-turn minus single-turn for one condition (or all combined)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingDifference {
    pub mean_difference: f64,
    pub percent_difference: f64,
    pub t_statistic: Option<f64>,
    pub ttest_ind_p_value: f64,
    pub cohens_d: f64,
    pub effect_size_interpretation: EffectMagnitude,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SettingComparison {
    pub metric: String,
    pub single_turn: BTreeMap<String, SettingSummary>,
    pub multi_turn: BTreeMap<String, SettingSummary>,
    pub comparison: BTreeMap<String, CellOutcome<SettingDifference>>,
}

fn summarize(values: &[f64]) -> SettingSummary {
    SettingSummary {
        mean: mean(values),
        n: values.len(),
    }
}

fn difference(single: &[f64], multi: &[f64]) -> CellOutcome<SettingDifference> {
    if single.len() < 2 || multi.len() < 2 {
        return CellOutcome::failed(CellError::InsufficientData);
    }
    let (Some(single_mean), Some(multi_mean)) = (mean(single), mean(multi)) else {
        return CellOutcome::failed(CellError::InsufficientData);
    };

    let welch = match welch_ttest(multi, single) {
        Ok(welch) => welch,
        Err(e) => {
            tracing::warn!("Setting comparison Welch test failed: {:#}", e);
            return CellOutcome::failed(CellError::TestFailure(format!("{:#}", e)));
        }
    };

    let diff = multi_mean - single_mean;
    let d = cohens_d_independent(multi, single);
    CellOutcome::Computed(SettingDifference {
        mean_difference: diff,
        percent_difference: percent_difference(diff, single_mean),
        t_statistic: welch.statistic,
        ttest_ind_p_value: welch.p_value,
        cohens_d: d,
        effect_size_interpretation: EffectMagnitude::from_d(d),
        direction: Direction::of(diff),
    })
}

/// Compare `metric` between a single-turn and a multi-turn table
///
/// Each condition is compared on its own pooled observations; the combined
/// entry concatenates every condition's pool.
pub fn compare_settings(
    single_turn: &SampleTable,
    multi_turn: &SampleTable,
    conditions: &[String],
    metric: &str,
) -> SettingComparison {
    let mut result = SettingComparison {
        metric: metric.to_string(),
        single_turn: BTreeMap::new(),
        multi_turn: BTreeMap::new(),
        comparison: BTreeMap::new(),
    };
    let mut all_single = Vec::new();
    let mut all_multi = Vec::new();

    for condition in conditions {
        let single = single_turn.pooled(condition, metric);
        let multi = multi_turn.pooled(condition, metric);
        result.single_turn.insert(condition.clone(), summarize(&single));
        result.multi_turn.insert(condition.clone(), summarize(&multi));
        result
            .comparison
            .insert(condition.clone(), difference(&single, &multi));
        all_single.extend(single);
        all_multi.extend(multi);
    }

    result
        .comparison
        .insert(COMBINED_KEY.to_string(), difference(&all_single, &all_multi));
    result
}
