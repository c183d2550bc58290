use super::*;

#[test]
fn test_wilcoxon_exact_all_positive() {
    // W- = 0, P(W <= 0) = 1/32 for n = 5
    let result = wilcoxon_signed_rank(&[1.0, 2.0, 3.0, 4.0, 5.0]);
    assert_eq!(result.statistic, Some(0.0));
    assert!((result.p_value - 0.0625).abs() < 1e-12);
}

#[test]
fn test_wilcoxon_exact_with_one_negative() {
    // W- = 2; sums 0, 1, 2 each reachable once -> 3/32
    let result = wilcoxon_signed_rank(&[1.0, -2.0, 3.0, 4.0, 5.0]);
    assert_eq!(result.statistic, Some(2.0));
    assert!((result.p_value - 0.1875).abs() < 1e-12);
}

#[test]
fn test_wilcoxon_sign_symmetry() {
    let a = wilcoxon_signed_rank(&[0.3, -1.2, 2.5, 0.7, 1.9, -0.4]);
    let b = wilcoxon_signed_rank(&[-0.3, 1.2, -2.5, -0.7, -1.9, 0.4]);
    assert_eq!(a, b);
}

#[test]
fn test_wilcoxon_all_zero_differences() {
    let result = wilcoxon_signed_rank(&[0.0; 6]);
    assert_eq!(result.statistic, None);
    assert_eq!(result.p_value, 1.0);
}

#[test]
fn test_wilcoxon_ties_use_corrected_normal_approximation() {
    // ranks 1.5, 1.5, 3; one tie group of size 2
    let result = wilcoxon_signed_rank(&[1.0, 1.0, 2.0]);
    let variance: f64 = (3.0 * 4.0 * 7.0 - 0.5 * 6.0) / 24.0;
    let expected = 2.0 * standard_normal_cdf(-3.0 / variance.sqrt());
    assert_eq!(result.statistic, Some(0.0));
    assert!((result.p_value - expected).abs() < 1e-12);
}

#[test]
fn test_wilcoxon_zeros_are_dropped_before_ranking() {
    let result = wilcoxon_signed_rank(&[0.0, 1.0, 2.0, 3.0]);
    let expected = 2.0 * standard_normal_cdf(-3.0 / 3.5_f64.sqrt());
    assert_eq!(result.n_nonzero, 3);
    assert!((result.p_value - expected).abs() < 1e-12);
}

#[test]
fn test_signed_rank_null_is_a_distribution() {
    let null = SignedRankNull::new(10);
    assert_eq!(null.n(), 10);
    assert!((null.cdf(55.0) - 1.0).abs() < 1e-12);
    assert_eq!(null.cdf(-1.0), 0.0);
    // symmetric around n(n+1)/4 = 27.5
    assert!((null.cdf(27.0) - 0.5).abs() < 1e-12);
}

#[test]
fn test_wilcoxon_large_sample_uses_approximation() {
    let diffs: Vec<f64> = (1..=60).map(|i| i as f64 * if i % 3 == 0 { -1.0 } else { 1.0 }).collect();
    let result = wilcoxon_signed_rank(&diffs);
    assert!(result.p_value > 0.0 && result.p_value < 0.05);
}

#[test]
fn test_paired_ttest_matches_reference() {
    // one-sample t on [1, 2, 3, 4]: t = 3.8730, p = 0.03047 (df = 3)
    let result = paired_ttest(&[1.0, 2.0, 3.0, 4.0], &[0.0, 0.0, 0.0, 0.0]).unwrap();
    assert!((result.statistic.unwrap() - 3.872983346207417).abs() < 1e-9);
    assert!((result.p_value - 0.030466).abs() < 1e-4);
    assert_eq!(result.df, 3.0);
}

#[test]
fn test_ttest_zero_spread() {
    let same = one_sample_ttest(&[0.0, 0.0, 0.0], 0.0).unwrap();
    assert_eq!(same.statistic, Some(0.0));
    assert_eq!(same.p_value, 1.0);

    let shifted = one_sample_ttest(&[2.0, 2.0, 2.0], 0.0).unwrap();
    assert_eq!(shifted.statistic, None);
    assert_eq!(shifted.p_value, 0.0);
}

#[test]
fn test_ttest_needs_two_values() {
    assert!(one_sample_ttest(&[1.0], 0.0).is_none());
    assert!(paired_ttest(&[], &[]).is_none());
}

#[test]
fn test_welch_ttest_detects_shift() {
    let result = welch_ttest(&[1.0, 2.0, 3.0, 4.0, 5.0], &[6.0, 7.0, 8.0, 9.0, 10.0]).unwrap();
    assert!(result.p_value < 0.01, "p = {}", result.p_value);
}

#[test]
fn test_welch_ttest_exact_figures() {
    // equal sizes and variances: t = -5 / sqrt(2.5 / 5 * 2) = -5, df = 8
    let result = welch_ttest(&[1.0, 2.0, 3.0, 4.0, 5.0], &[6.0, 7.0, 8.0, 9.0, 10.0]).unwrap();
    assert_eq!(result.statistic, Some(-5.0));
    assert_eq!(result.df, 8.0);
}

#[test]
fn test_welch_ttest_resolves_tiny_spread() {
    // offsets far below f32 resolution at this scale
    let a = [100.0, 100.00005, 100.0001];
    let b = [100.0002, 100.00025, 100.0003];
    let result = welch_ttest(&a, &b).unwrap();
    // sd = 0.00005 in both, difference 0.0002: t = -0.0002 / (0.00005 * sqrt(2/3))
    let expected = -0.0002 / (0.00005 * (2.0_f64 / 3.0).sqrt());
    assert!((result.statistic.unwrap() - expected).abs() < 1e-6 * expected.abs());
    assert!((result.df - 4.0).abs() < 1e-6);
}

#[test]
fn test_welch_ttest_rejects_zero_spread() {
    assert!(welch_ttest(&[1.0, 1.0], &[2.0, 2.0]).is_err());
}

#[test]
fn test_welch_ttest_rejects_tiny_samples() {
    assert!(welch_ttest(&[1.0], &[2.0, 3.0]).is_err());
}

#[test]
fn test_standard_normal_cdf() {
    assert!((standard_normal_cdf(0.0) - 0.5).abs() < 1e-15);
    assert!((standard_normal_cdf(1.959963984540054) - 0.975).abs() < 1e-9);
}
