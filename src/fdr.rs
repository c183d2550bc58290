//! Benjamini-Hochberg false discovery rate correction
//!
//! The step-up procedure over one family of p-values. Results keep a mapping
//! back to each input position so callers can re-attach adjusted values to
//! the test that produced them.

use serde::Serialize;

/// BH outcome for one input p-value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BhCorrection {
    /// Position of the p-value in the input slice
    pub original_index: usize,
    pub p_value: f64,
    /// 1-based rank in ascending p-value order (stable for ties)
    pub rank: usize,
    pub adjusted_p: f64,
    pub significant_bh: bool,
}

/// Benjamini-Hochberg adjusted p-values, returned in input order
///
/// Adjusted p = p * n / rank capped at 1.0, then a running minimum from the
/// largest rank downward enforces step-up monotonicity. An entry is
/// significant when its adjusted p is strictly below `alpha`.
///
/// # Example
/// ```
/// use entropy_compare::fdr::benjamini_hochberg;
///
/// let corrected = benjamini_hochberg(&[0.04, 0.01], 0.05);
/// assert_eq!(corrected[1].rank, 1);
/// assert!((corrected[1].adjusted_p - 0.02).abs() < 1e-12);
/// assert!((corrected[0].adjusted_p - 0.04).abs() < 1e-12);
/// ```
pub fn benjamini_hochberg(p_values: &[f64], alpha: f64) -> Vec<BhCorrection> {
    let n = p_values.len();
    if n == 0 {
        return Vec::new();
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| p_values[a].total_cmp(&p_values[b]));

    let mut adjusted: Vec<f64> = order
        .iter()
        .enumerate()
        .map(|(i, &idx)| (p_values[idx] * n as f64 / (i + 1) as f64).min(1.0))
        .collect();
    for i in (0..n.saturating_sub(1)).rev() {
        adjusted[i] = adjusted[i].min(adjusted[i + 1]);
    }

    let mut corrections: Vec<Option<BhCorrection>> = vec![None; n];
    for (i, &idx) in order.iter().enumerate() {
        corrections[idx] = Some(BhCorrection {
            original_index: idx,
            p_value: p_values[idx],
            rank: i + 1,
            adjusted_p: adjusted[i],
            significant_bh: adjusted[i] < alpha,
        });
    }
    corrections.into_iter().flatten().collect()
}

/// Family-level summary of one BH correction
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FdrSummary {
    pub total_tests: usize,
    pub alpha: f64,
    pub method: String,
    pub n_significant_uncorrected: usize,
    pub n_significant_fdr: usize,
    /// Expected false positives if every null were true and nothing corrected
    pub expected_false_positives_uncorrected: f64,
}

impl FdrSummary {
    pub fn new(corrections: &[BhCorrection], alpha: f64) -> Self {
        Self {
            total_tests: corrections.len(),
            alpha,
            method: "Benjamini-Hochberg".to_string(),
            n_significant_uncorrected: corrections.iter().filter(|c| c.p_value < alpha).count(),
            n_significant_fdr: corrections.iter().filter(|c| c.significant_bh).count(),
            expected_false_positives_uncorrected: corrections.len() as f64 * alpha,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bh_reference_sequence() {
        let p = [0.001, 0.01, 0.02, 0.03, 0.04, 0.3, 0.4, 0.5, 0.6, 0.9];
        let expected = [
            0.01,
            0.05,
            0.2 / 3.0,
            0.075,
            0.08,
            0.5,
            4.0 / 7.0,
            0.625,
            2.0 / 3.0,
            0.9,
        ];
        let corrected = benjamini_hochberg(&p, 0.05);
        for (c, e) in corrected.iter().zip(expected) {
            assert!((c.adjusted_p - e).abs() < 1e-12, "{} vs {}", c.adjusted_p, e);
        }
        // 0.01 * 10 / 2 lands exactly on alpha, which is not strictly below it
        let significant: Vec<usize> = corrected
            .iter()
            .filter(|c| c.significant_bh)
            .map(|c| c.original_index)
            .collect();
        assert_eq!(significant, vec![0]);

        let summary = FdrSummary::new(&corrected, 0.05);
        assert_eq!(summary.total_tests, 10);
        assert_eq!(summary.n_significant_uncorrected, 5);
        assert_eq!(summary.n_significant_fdr, 1);
        assert!((summary.expected_false_positives_uncorrected - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_bh_preserves_input_order() {
        let corrected = benjamini_hochberg(&[0.5, 0.001, 0.2], 0.05);
        let ranks: Vec<usize> = corrected.iter().map(|c| c.rank).collect();
        assert_eq!(ranks, vec![3, 1, 2]);
        let indices: Vec<usize> = corrected.iter().map(|c| c.original_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[test]
    fn test_bh_running_minimum() {
        // raw: 0.04*3/1 = 0.12, 0.045*3/2 = 0.0675, 0.05*3/3 = 0.05
        let corrected = benjamini_hochberg(&[0.04, 0.045, 0.05], 0.1);
        for c in &corrected {
            assert!((c.adjusted_p - 0.05).abs() < 1e-12);
            assert!(c.significant_bh);
        }
    }

    #[test]
    fn test_bh_caps_at_one_and_handles_empty() {
        let corrected = benjamini_hochberg(&[1.0, 1.0], 0.05);
        assert!(corrected.iter().all(|c| c.adjusted_p == 1.0));
        assert!(benjamini_hochberg(&[], 0.05).is_empty());
    }
}
