// Report assembly
//
// - ReportAssembler: runs aggregation, paired tests, BH correction, mixed
//   effects, dispersion, setting and seed analyses for one dataset
// - Report: the immutable, serializable result with stable snake_case keys
// - compare_reports: read-only cross-dataset sensitivity comparison
//
// The assembler owns the configuration and the power estimator; power
// estimates are memoised across every dataset it assembles.

mod cross_dataset;
mod domain;
mod summary;

pub use cross_dataset::{
    compare_reports, CellSensitivity, CrossDatasetComparison, DatasetEffect, DatasetSensitivity,
    INDETERMINATE,
};
pub use domain::{analyze_by_domain, DomainAnalysis, DomainSummary};
pub use summary::{
    ComparisonEffects, EffectSizeSummary, OverallEffects, PowerSummary, SignificanceCounts,
};

use crate::aggregate::{grand_means_from, group_means, sample_level_stats, GrandMean, SampleStats};
use crate::comparison::{compare_all, PairedResults};
use crate::config::AnalysisConfig;
use crate::dispersion::{cross_condition_cv_all, mean_cv_by_metric, CvPerGroup};
use crate::effect::PowerEstimator;
use crate::error::{CellOutcome, Result};
use crate::extract::{ExperimentVersion, ExtractedDataset};
use crate::fdr::FdrSummary;
use crate::mixed_effects::{apply_mixed_effects_fdr, mixed_effects_all, MixedEffectsResults};
use crate::seeds::{analyze_seeds, SeedAnalysis};
use crate::setting::{compare_settings, SettingComparison, DEFAULT_SETTING_METRIC};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Description of the analyzed design
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Design {
    pub dataset: String,
    pub experiment_version: ExperimentVersion,
    pub conditions: Vec<String>,
    pub comparisons: Vec<String>,
    pub metrics: Vec<String>,
    pub n_groups: usize,
    pub n_observations: usize,
    pub alpha: f64,
    pub power_simulations: usize,
    pub seed: u64,
}

/// Complete analysis of one dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub design: Design,
    /// condition -> metric -> summary of group means
    pub grand_means: BTreeMap<String, BTreeMap<String, CellOutcome<GrandMean>>>,
    /// metric -> condition -> summary of raw observations
    pub sample_level_stats: BTreeMap<String, BTreeMap<String, SampleStats>>,
    pub paired_tests: PairedResults,
    pub fdr_correction_summary: FdrSummary,
    pub mixed_effects: MixedEffectsResults,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mixed_effects_fdr: Option<FdrSummary>,
    pub effect_size_summary: EffectSizeSummary,
    pub significance_counts: SignificanceCounts,
    pub power_analysis_summary: PowerSummary,
    pub cross_source_cv_per_group: CvPerGroup,
    pub mean_cv_across_groups: BTreeMap<String, Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setting_comparison: Option<SettingComparison>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed_distribution_analysis: Option<SeedAnalysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain_analysis: Option<DomainAnalysis>,
}

impl Report {
    /// SHA-256 of the canonical JSON encoding, hex encoded
    ///
    /// Two runs over the same data with the same configuration yield the same
    /// fingerprint.
    pub fn fingerprint(&self) -> Result<String> {
        let canonical = serde_json::to_vec(self)?;
        Ok(hex::encode(Sha256::digest(&canonical)))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Builds reports from extracted datasets
#[derive(Debug, Clone)]
pub struct ReportAssembler {
    config: AnalysisConfig,
    power: PowerEstimator,
    setting_metric: String,
    include_seeds: bool,
}

impl ReportAssembler {
    /// Create an assembler; the configuration is validated up front
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let power = PowerEstimator::new(&config);
        Ok(Self {
            config,
            power,
            setting_metric: DEFAULT_SETTING_METRIC.to_string(),
            include_seeds: true,
        })
    }

    /// Metric used by the single-turn vs multi-turn comparison
    pub fn with_setting_metric(mut self, metric: impl Into<String>) -> Self {
        self.setting_metric = metric.into();
        self
    }

    pub fn with_seed_analysis(mut self, include: bool) -> Self {
        self.include_seeds = include;
        self
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn assemble(&mut self, dataset: &ExtractedDataset) -> Report {
        let layout = &dataset.layout;
        let table = &dataset.single_turn;
        tracing::info!(
            "Assembling report for {} ({} metrics x {} comparisons)",
            dataset.label,
            layout.metrics.len(),
            layout.comparisons.len()
        );

        let means = group_means(table);
        let grand_means = grand_means_from(&means, &layout.conditions, &layout.metrics);
        let sample_level_stats = sample_level_stats(table, &layout.conditions, &layout.metrics);

        let mut batch = compare_all(
            table,
            &layout.metrics,
            &layout.comparisons,
            &self.config,
            &mut self.power,
        );
        let fdr_correction_summary = batch.apply_fdr(self.config.alpha);
        tracing::info!(
            "FDR: {}/{} significant after correction ({} uncorrected)",
            fdr_correction_summary.n_significant_fdr,
            fdr_correction_summary.total_tests,
            fdr_correction_summary.n_significant_uncorrected
        );

        let mut mixed_effects =
            mixed_effects_all(table, &layout.metrics, &layout.comparisons, &self.config);
        let mixed_effects_fdr = apply_mixed_effects_fdr(&mut mixed_effects, self.config.alpha);

        let cross_source_cv_per_group =
            cross_condition_cv_all(&means, &layout.metrics, &layout.conditions);
        let mean_cv_across_groups = mean_cv_by_metric(&cross_source_cv_per_group, &layout.metrics);

        let setting_comparison = (!dataset.multi_turn.is_empty()).then(|| {
            compare_settings(
                table,
                &dataset.multi_turn,
                &layout.conditions,
                &self.setting_metric,
            )
        });

        let seed_distribution_analysis =
            (self.include_seeds && !dataset.seeds.is_empty()).then(|| analyze_seeds(&dataset.seeds));

        let domain_analysis = (!dataset.domains.is_empty()).then(|| {
            analyze_by_domain(table, &dataset.domains, &layout.metrics, &layout.conditions)
        });

        let effect_size_summary = EffectSizeSummary::from_batch(&batch);
        let significance_counts = SignificanceCounts::from_batch(&batch);
        let power_analysis_summary = PowerSummary::from_batch(&batch, self.config.target_power);

        Report {
            design: Design {
                dataset: dataset.label.clone(),
                experiment_version: layout.version,
                conditions: layout.conditions.clone(),
                comparisons: layout.comparison_keys(),
                metrics: layout.metrics.clone(),
                n_groups: table.groups().len(),
                n_observations: table.n_observations(),
                alpha: self.config.alpha,
                power_simulations: self.config.power_simulations,
                seed: self.config.seed,
            },
            grand_means,
            sample_level_stats,
            paired_tests: batch.results,
            fdr_correction_summary,
            mixed_effects,
            mixed_effects_fdr,
            effect_size_summary,
            significance_counts,
            power_analysis_summary,
            cross_source_cv_per_group,
            mean_cv_across_groups,
            setting_comparison,
            seed_distribution_analysis,
            domain_analysis,
        }
    }
}
