//! Comprehensive property-based tests for pre-commit hook
//!
//! Covers the core guarantees of the comparison engine using proptest.
//! Designed to run under 30 seconds as a pre-commit quality gate.
//!
//! Core properties tested:
//! 1. Pairing only uses groups present under both conditions
//! 2. Degenerate inputs never produce NaN or infinite effect sizes
//! 3. Benjamini-Hochberg adjusted p-values are bounded and monotone
//! 4. Power is monotone in effect size and sample size
//! 5. Report assembly is deterministic

use entropy_compare::aggregate::group_means;
use entropy_compare::comparison::{paired_vectors, percent_difference};
use entropy_compare::effect::{paired_effect, power_paired_ttest, PowerEstimator};
use entropy_compare::extract::{ExperimentLayout, ExtractedDataset};
use entropy_compare::fdr::benjamini_hochberg;
use entropy_compare::hypothesis::wilcoxon_signed_rank;
use entropy_compare::{AnalysisConfig, ConditionPair, ReportAssembler, SampleTable};
use proptest::prelude::*;

fn table_with_gaps(alt: &[Option<f64>], base: &[Option<f64>]) -> SampleTable {
    let mut table = SampleTable::new();
    for (i, (a, b)) in alt.iter().zip(base).enumerate() {
        let group = format!("g{}", i);
        table.ensure_group(&group);
        table.record(&group, "A", "x", *a);
        table.record(&group, "B", "x", *b);
    }
    table
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_pairing_uses_complete_groups_only(
        cells in prop::collection::vec(
            (prop::option::of(-100.0f64..100.0), prop::option::of(-100.0f64..100.0)),
            0..20,
        ),
    ) {
        let (alt, base): (Vec<_>, Vec<_>) = cells.iter().copied().unzip();
        let table = table_with_gaps(&alt, &base);
        let vectors = paired_vectors(&group_means(&table), "x", &ConditionPair::new("A", "B"));

        let expected = cells.iter().filter(|(a, b)| a.is_some() && b.is_some()).count();
        prop_assert_eq!(vectors.len(), expected);
        prop_assert_eq!(vectors.alt.len(), vectors.base.len());
        prop_assert_eq!(vectors.groups.len(), expected);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_effect_size_always_finite(
        differences in prop::collection::vec(-1e6f64..1e6, 0..30),
        constant in -50.0f64..50.0,
        n_constant in 0usize..10,
    ) {
        let effect = paired_effect(&differences, 10.0);
        prop_assert!(effect.d.is_finite());
        prop_assert!(effect.d.abs() <= 10.0);

        // a constant shift has no spread at all
        let constant_diffs = vec![constant; n_constant];
        let effect = paired_effect(&constant_diffs, 10.0);
        prop_assert!(effect.d.is_finite());
        prop_assert!(effect.d.abs() <= 10.0);
    }

    #[test]
    fn prop_percent_difference_safe_on_zero_base(diff in -1e6f64..1e6) {
        prop_assert_eq!(percent_difference(diff, 0.0), 0.0);
    }

    #[test]
    fn prop_wilcoxon_p_value_in_unit_interval(
        differences in prop::collection::vec(-10.0f64..10.0, 0..60),
    ) {
        let result = wilcoxon_signed_rank(&differences);
        prop_assert!(result.p_value >= 0.0 && result.p_value <= 1.0);
        if let Some(statistic) = result.statistic {
            prop_assert!(statistic >= 0.0);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_bh_adjusted_bounded_and_monotone(
        p_values in prop::collection::vec(0.0f64..=1.0, 1..50),
    ) {
        let corrections = benjamini_hochberg(&p_values, 0.05);
        prop_assert_eq!(corrections.len(), p_values.len());

        for c in &corrections {
            prop_assert!(c.adjusted_p >= c.p_value - 1e-15);
            prop_assert!(c.adjusted_p <= 1.0);
            prop_assert_eq!(c.p_value, p_values[c.original_index]);
        }

        // smaller raw p never gets a larger adjusted p
        let mut by_raw: Vec<_> = corrections.iter().collect();
        by_raw.sort_by(|a, b| a.p_value.total_cmp(&b.p_value));
        for pair in by_raw.windows(2) {
            prop_assert!(pair[0].adjusted_p <= pair[1].adjusted_p + 1e-15);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_ttest_power_monotone(
        d in 0.0f64..2.0,
        step in 0.01f64..1.0,
        n in 3usize..100,
    ) {
        let alpha = 0.05;
        let lower = power_paired_ttest(d, n, alpha);
        let higher_d = power_paired_ttest(d + step, n, alpha);
        let higher_n = power_paired_ttest(d + step, n + 10, alpha);

        prop_assert!(lower >= 0.0 && lower <= 1.0);
        prop_assert!(higher_d >= lower - 1e-9);
        prop_assert!(higher_n >= higher_d - 1e-9);
    }

    #[test]
    fn prop_power_at_zero_effect_is_alpha(n in 3usize..200, alpha in 0.01f64..0.2) {
        prop_assert!((power_paired_ttest(0.0, n, alpha) - alpha).abs() < 1e-12);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(10))]

    #[test]
    fn prop_report_assembly_is_deterministic(
        base in prop::collection::vec(0.3f64..0.7, 3..8),
        shifts in prop::collection::vec(-0.05f64..0.05, 8),
        seed in 0u64..1000,
    ) {
        let mut dataset = ExtractedDataset::new("prop", ExperimentLayout::v1());
        for (i, b) in base.iter().enumerate() {
            let group = format!("p{}", i);
            dataset.single_turn.extend(&group, "PRNG", "word_diversity", [*b]);
            dataset.single_turn.extend(&group, "TRNG", "word_diversity", [b + shifts[i]]);
            dataset.single_turn.extend(&group, "QRNG", "word_diversity", [b - shifts[i] / 2.0]);
        }
        let config = AnalysisConfig {
            power_simulations: 50,
            seed,
            ..AnalysisConfig::default()
        };

        let first = ReportAssembler::new(config.clone()).unwrap().assemble(&dataset);
        let second = ReportAssembler::new(config.clone()).unwrap().assemble(&dataset);
        prop_assert_eq!(first.fingerprint().unwrap(), second.fingerprint().unwrap());

        // memoised estimates match fresh ones
        let mut estimator = PowerEstimator::new(&config);
        let fresh = estimator.wilcoxon(0.5, base.len());
        prop_assert_eq!(fresh, estimator.wilcoxon(0.5, base.len()));
    }
}
