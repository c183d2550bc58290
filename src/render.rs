//! Human-readable rendering of reports
//!
//! `text_report` prints the console summary, `markdown_tables` the Markdown
//! tables for grand means and paired tests, and `cross_dataset_text` /
//! `cross_dataset_markdown` the sensitivity comparison across datasets.

use crate::comparison::PairedTestResult;
use crate::error::{CellFailure, CellOutcome};
use crate::report::{CrossDatasetComparison, Report};
use crate::seeds::SeedOutcome;

fn or_na(value: Option<f64>, precision: usize) -> String {
    match value {
        Some(v) => format!("{:.*}", precision, v),
        None => "N/A".to_string(),
    }
}

fn failure_text(failure: &CellFailure) -> String {
    match failure.n_pairs {
        Some(n) => format!("{} (n={})", failure.error, n),
        None => failure.error.to_string(),
    }
}

/// `*` when either raw p-value is below alpha, `[BH]` when either survives BH
fn markers(result: &PairedTestResult, alpha: f64) -> String {
    let w = &result.wilcoxon_signed_rank;
    let t = &result.paired_ttest;
    let mut out = String::new();
    if w.p_value < alpha || t.p_value < alpha {
        out.push_str(" *");
    }
    if w.significant_bh == Some(true) || t.significant_bh == Some(true) {
        out.push_str(" [BH]");
    }
    out
}

fn paired_line(result: &PairedTestResult, alpha: f64) -> String {
    let mut line = format!(
        "diff={:+.4}% | d={:.4} ({}) power={:.2}",
        result.percent_difference,
        result.cohens_d,
        result.effect_size_interpretation,
        result.power_analysis.power_ttest
    );
    if result.variance_collapse {
        line.push_str(" [collapse]");
    }
    if result.percent_difference_unstable {
        line.push_str(" [unstable %]");
    }
    line.push_str(&markers(result, alpha));
    line
}

/// Console summary of one report
pub fn text_report(report: &Report) -> String {
    let design = &report.design;
    let alpha = design.alpha;
    let mut out = String::new();

    out.push_str(&format!("\n{}\n", "=".repeat(60)));
    out.push_str(&format!(
        "Analyzing: {} (format: {})\n",
        design.dataset, design.experiment_version
    ));
    out.push_str(&format!("Metrics: {}\n", design.metrics.join(", ")));
    out.push_str(&format!("Sources: {}\n", design.conditions.join(", ")));
    out.push_str(&format!("{}\n", "=".repeat(60)));

    out.push_str("\n--- Grand Means ---\n");
    for metric in &design.metrics {
        out.push_str(&format!("  {}:\n", metric));
        for condition in &design.conditions {
            let Some(cell) = report.grand_means.get(condition).and_then(|m| m.get(metric)) else {
                continue;
            };
            match cell {
                CellOutcome::Computed(gm) => out.push_str(&format!(
                    "    {}: mean={:.6}, std={}, n={}\n",
                    condition,
                    gm.mean,
                    or_na(gm.std, 6),
                    gm.n_groups
                )),
                CellOutcome::Failed(failure) => {
                    out.push_str(&format!("    {}: {}\n", condition, failure_text(failure)))
                }
            }
        }
    }

    let fdr = &report.fdr_correction_summary;
    out.push_str("\n--- FDR Correction ---\n");
    out.push_str(&format!("  Total tests: {}\n", fdr.total_tests));
    out.push_str(&format!(
        "  Significant (uncorrected p<{}): {}\n",
        alpha, fdr.n_significant_uncorrected
    ));
    out.push_str(&format!(
        "  Significant (BH-adjusted p<{}): {}\n",
        alpha, fdr.n_significant_fdr
    ));
    out.push_str(&format!(
        "  Expected false positives (uncorrected): {:.2}\n",
        fdr.expected_false_positives_uncorrected
    ));

    out.push_str("\n--- Paired Tests ---\n");
    for (metric, per_comparison) in &report.paired_tests {
        for (key, cell) in per_comparison {
            let body = match cell {
                CellOutcome::Computed(result) => paired_line(result, alpha),
                CellOutcome::Failed(failure) => failure_text(failure),
            };
            out.push_str(&format!("  {} | {}: {}\n", metric, key, body));
        }
    }

    out.push_str("\n--- Mixed-Effects Analysis (all samples) ---\n");
    for (metric, per_comparison) in &report.mixed_effects {
        for (key, cell) in per_comparison {
            let Some(me) = cell.computed() else {
                continue;
            };
            let re = &me.random_effects;
            let welch = match &me.sample_level_welch {
                CellOutcome::Computed(w) => format!("Welch d={:.4} p={:.4}", w.cohens_d, w.p_value),
                CellOutcome::Failed(failure) => format!("Welch {}", failure_text(failure)),
            };
            out.push_str(&format!(
                "  {} | {}: RE d={:.4} p={:.4} (n_samples={}+{}) | {}\n",
                metric, key, re.cohens_d, re.p_value, me.n_samples_a, me.n_samples_b, welch
            ));
        }
    }
    if let Some(me_fdr) = &report.mixed_effects_fdr {
        out.push_str(&format!(
            "\n  Mixed-effects FDR: {}/{} significant after BH correction\n",
            me_fdr.n_significant_fdr, me_fdr.total_tests
        ));
    }

    out.push_str("\n--- Cross-Source CV% ---\n");
    for (metric, cv) in &report.mean_cv_across_groups {
        out.push_str(&format!("  {}: mean CV = {}%\n", metric, or_na(*cv, 4)));
    }

    if let Some(seeds) = &report.seed_distribution_analysis {
        out.push_str("\n--- Seed Distribution Analysis ---\n");
        for (source, outcome) in &seeds.per_source {
            match outcome {
                SeedOutcome::Analyzed(stats) => out.push_str(&format!(
                    "  {}: n={}, KS p={:.4} ({}), autocorr={:.4}\n",
                    source,
                    stats.n_seeds,
                    stats.ks_uniformity.p_value,
                    if stats.ks_uniformity.uniform_at_005 { "uniform" } else { "NON-UNIFORM" },
                    stats.lag1_autocorrelation
                )),
                SeedOutcome::Skipped { error, n } => {
                    out.push_str(&format!("  {}: {} (n={})\n", source, error, n))
                }
            }
        }
        for (pair, ks) in &seeds.pairwise_distribution_tests {
            out.push_str(&format!(
                "  {}: KS p={:.4} ({})\n",
                pair,
                ks.p_value,
                if ks.distributions_differ_005 { "DIFFERENT" } else { "same" }
            ));
        }
    }

    let effects = &report.effect_size_summary.overall;
    let counts = &report.significance_counts;
    out.push_str("\n--- Summary ---\n");
    out.push_str(&format!("  Mean |d|: {}\n", or_na(effects.mean_abs_cohens_d, 4)));
    out.push_str(&format!("  Max |d|: {}\n", or_na(effects.max_abs_cohens_d, 4)));
    out.push_str(&format!(
        "  Significant (uncorrected): Wilcoxon={}, t-test={}\n",
        counts.wilcoxon_p005_uncorrected, counts.ttest_p005_uncorrected
    ));
    out.push_str(&format!(
        "  Significant (BH-corrected): Wilcoxon={}, t-test={}\n",
        counts.wilcoxon_p005_bh_corrected, counts.ttest_p005_bh_corrected
    ));

    let power = &report.power_analysis_summary;
    out.push_str("\n--- Power Analysis ---\n");
    out.push_str(&format!(
        "  n paired observations: {}\n",
        power
            .n_paired_observations
            .map_or_else(|| "N/A".to_string(), |n| n.to_string())
    ));
    out.push_str(&format!(
        "  MDE: d>={}\n",
        or_na(power.mean_minimum_detectable_effect_d, 3)
    ));
    out.push_str(&format!(
        "  Mean power at observed effects: {}\n",
        or_na(power.mean_power_at_observed_d, 3)
    ));
    out.push_str(&format!(
        "  Adequately powered: {}/{}\n",
        power.n_adequately_powered_tests, power.total_tests
    ));
    out.push_str(&format!("  {}\n", power.interpretation));

    out
}

/// Markdown tables: grand means and paired tests
pub fn markdown_tables(report: &Report) -> String {
    let design = &report.design;
    let mut out = format!("# {} ({})\n", design.dataset, design.experiment_version);

    out.push_str("\n## Grand means\n\n");
    out.push_str(&format!("| Metric | {} |\n", design.conditions.join(" | ")));
    out.push_str(&format!("|--------|{}\n", "------|".repeat(design.conditions.len())));
    for metric in &design.metrics {
        let cells: Vec<String> = design
            .conditions
            .iter()
            .map(|condition| {
                report
                    .grand_means
                    .get(condition)
                    .and_then(|m| m.get(metric))
                    .and_then(CellOutcome::computed)
                    .map_or_else(|| "N/A".to_string(), |gm| format!("{:.4}", gm.mean))
            })
            .collect();
        out.push_str(&format!("| {} | {} |\n", metric, cells.join(" | ")));
    }

    out.push_str("\n## Paired tests\n\n");
    out.push_str("| Metric | Comparison | n | Diff % | Cohen's d | Effect | Wilcoxon p | t-test p | BH |\n");
    out.push_str("|--------|------------|---|--------|-----------|--------|------------|----------|----|\n");
    for (metric, per_comparison) in &report.paired_tests {
        for (key, cell) in per_comparison {
            match cell {
                CellOutcome::Computed(r) => {
                    let bh = r.wilcoxon_signed_rank.significant_bh == Some(true)
                        || r.paired_ttest.significant_bh == Some(true);
                    out.push_str(&format!(
                        "| {} | {} | {} | {:+.2} | {:.3} | {} | {:.4} | {:.4} | {} |\n",
                        metric,
                        key,
                        r.n_pairs,
                        r.percent_difference,
                        r.cohens_d,
                        r.effect_size_interpretation,
                        r.wilcoxon_signed_rank.p_value,
                        r.paired_ttest.p_value,
                        if bh { "yes" } else { "no" }
                    ));
                }
                CellOutcome::Failed(failure) => out.push_str(&format!(
                    "| {} | {} | - | - | - | {} | - | - | - |\n",
                    metric,
                    key,
                    failure_text(failure)
                )),
            }
        }
    }

    out
}

/// Console summary of a cross-dataset comparison
pub fn cross_dataset_text(comparison: &CrossDatasetComparison) -> String {
    let mut out = String::from("\n--- Cross-Dataset Sensitivity ---\n");
    out.push_str(&format!("  Datasets: {}\n", comparison.datasets.join(", ")));
    for (label, sensitivity) in &comparison.overall_sensitivity {
        out.push_str(&format!(
            "  {}: mean |d|={}, max |d|={} over {} effects\n",
            label,
            or_na(sensitivity.mean_abs_cohens_d, 4),
            or_na(sensitivity.max_abs_cohens_d, 4),
            sensitivity.n_effects
        ));
    }
    out.push_str(&format!(
        "  More sensitive: {} | less sensitive: {}\n",
        comparison.more_sensitive, comparison.less_sensitive
    ));

    for (metric, per_comparison) in &comparison.per_metric_comparison {
        for (key, cell) in per_comparison {
            out.push_str(&format!(
                "  {} | {}: most sensitive={} ratio={}\n",
                metric,
                key,
                cell.most_sensitive.as_deref().unwrap_or("N/A"),
                or_na(cell.sensitivity_ratio, 2)
            ));
        }
    }
    out
}

/// Markdown tables of a cross-dataset comparison
pub fn cross_dataset_markdown(comparison: &CrossDatasetComparison) -> String {
    let mut out = String::from("# Cross-dataset sensitivity\n\n");
    out.push_str("| Dataset | Mean abs d | Max abs d | Effects |\n");
    out.push_str("|---------|------------|-----------|---------|\n");
    for (label, sensitivity) in &comparison.overall_sensitivity {
        out.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            label,
            or_na(sensitivity.mean_abs_cohens_d, 4),
            or_na(sensitivity.max_abs_cohens_d, 4),
            sensitivity.n_effects
        ));
    }
    out.push_str(&format!(
        "\nMore sensitive: **{}**, less sensitive: **{}**\n",
        comparison.more_sensitive, comparison.less_sensitive
    ));

    out.push_str("\n| Metric | Comparison | Most sensitive | Ranking | Ratio |\n");
    out.push_str("|--------|------------|----------------|---------|-------|\n");
    for (metric, per_comparison) in &comparison.per_metric_comparison {
        for (key, cell) in per_comparison {
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                metric,
                key,
                cell.most_sensitive.as_deref().unwrap_or("N/A"),
                cell.ranking.join(" > "),
                or_na(cell.sensitivity_ratio, 2)
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalysisConfig;
    use crate::extract::{ExperimentLayout, ExtractedDataset};
    use crate::report::{compare_reports, ReportAssembler};

    fn report(label: &str, shift: f64) -> Report {
        let mut dataset = ExtractedDataset::new(label, ExperimentLayout::v1());
        let base = [0.50, 0.52, 0.48, 0.55, 0.51, 0.49, 0.53, 0.47];
        let jitter = [0.004, -0.003, 0.002, -0.001, 0.003, -0.004, 0.001, -0.002];
        for (i, (b, j)) in base.iter().zip(jitter).enumerate() {
            let prompt = format!("p{}", i);
            dataset.single_turn.extend(&prompt, "PRNG", "word_diversity", [*b]);
            dataset
                .single_turn
                .extend(&prompt, "TRNG", "word_diversity", [b + shift + j]);
        }
        let config = AnalysisConfig {
            power_simulations: 100,
            ..AnalysisConfig::default()
        };
        ReportAssembler::new(config).unwrap().assemble(&dataset)
    }

    #[test]
    fn test_text_report_sections() {
        let text = text_report(&report("model-x", 0.05));
        assert!(text.contains("Analyzing: model-x (format: v1)"));
        assert!(text.contains("--- Grand Means ---"));
        assert!(text.contains("--- FDR Correction ---"));
        assert!(text.contains("--- Power Analysis ---"));
        assert!(!text.contains("--- Seed Distribution Analysis ---"));
    }

    #[test]
    fn test_text_report_markers() {
        let text = text_report(&report("model-x", 0.05));
        let line = text
            .lines()
            .find(|l| l.contains("word_diversity | TRNG_vs_PRNG"))
            .unwrap();
        assert!(line.contains(" *"));
        assert!(line.contains("[BH]"));
        assert!(text.contains("word_diversity | QRNG_vs_PRNG: missing source data"));
    }

    #[test]
    fn test_markdown_tables_rows() {
        let md = markdown_tables(&report("model-x", 0.05));
        assert!(md.starts_with("# model-x (v1)"));
        assert!(md.contains("| Metric | PRNG | TRNG | QRNG |"));
        assert!(md.contains("| word_diversity | TRNG_vs_PRNG | 8 |"));
        assert!(md.contains("| shannon_char | QRNG_vs_TRNG | - | - | - | missing source data |"));
    }

    #[test]
    fn test_cross_dataset_text() {
        let comparison = compare_reports(&[report("a", 0.01), report("b", 0.08)]);
        let text = cross_dataset_text(&comparison);
        assert!(text.contains("Datasets: a, b"));
        assert!(text.contains("More sensitive: b | less sensitive: a"));
    }

    #[test]
    fn test_cross_dataset_markdown() {
        let comparison = compare_reports(&[report("a", 0.01), report("b", 0.08)]);
        let md = cross_dataset_markdown(&comparison);
        assert!(md.starts_with("# Cross-dataset sensitivity"));
        assert!(md.contains("| Dataset | Mean abs d | Max abs d | Effects |"));
        assert!(md.contains("More sensitive: **b**, less sensitive: **a**"));
        assert!(md.contains("| word_diversity | TRNG_vs_PRNG | b | b > a |"));
    }
}
