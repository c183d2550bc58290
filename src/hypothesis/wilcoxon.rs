// Wilcoxon signed-rank test on paired differences
//
// Zero differences are dropped before ranking ("wilcox" zero handling).
// The two-sided statistic is T = min(W+, W-).

use super::ttest::standard_normal_cdf;
use serde::Serialize;

/// Largest sample size for which the exact null distribution is used
pub const EXACT_MAX_N: usize = 50;

/// Result of a two-sided signed-rank test
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignedRankOutcome {
    /// min(W+, W-); absent when every difference is zero
    pub statistic: Option<f64>,
    pub p_value: f64,
    /// Differences left after dropping zeros
    #[serde(skip)]
    pub n_nonzero: usize,
}

/// Exact null distribution of W+ for n untied, nonzero differences
///
/// Built once per n and reused; the power simulation evaluates thousands of
/// samples of the same size against it.
#[derive(Debug, Clone)]
pub struct SignedRankNull {
    n: usize,
    cdf: Vec<f64>,
}

impl SignedRankNull {
    pub fn new(n: usize) -> Self {
        let max_sum = n * (n + 1) / 2;
        let mut counts = vec![0.0_f64; max_sum + 1];
        counts[0] = 1.0;
        for rank in 1..=n {
            for s in (rank..=max_sum).rev() {
                counts[s] += counts[s - rank];
            }
        }
        let total = 2.0_f64.powi(n as i32);
        let mut cdf = Vec::with_capacity(counts.len());
        let mut running = 0.0;
        for c in counts {
            running += c;
            cdf.push(running / total);
        }
        Self { n, cdf }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// P(W <= w) under H0
    pub fn cdf(&self, w: f64) -> f64 {
        if w < 0.0 {
            return 0.0;
        }
        let idx = w.floor() as usize;
        self.cdf.get(idx).copied().unwrap_or(1.0)
    }

    /// Two-sided p-value for T = min(W+, W-)
    pub fn two_sided_p(&self, statistic: f64) -> f64 {
        (2.0 * self.cdf(statistic)).min(1.0)
    }
}

struct RankedDifferences {
    w_plus: f64,
    w_minus: f64,
    n_nonzero: usize,
    n_zero: usize,
    /// Sizes of tie groups with more than one member
    ties: Vec<usize>,
}

fn rank_differences(differences: &[f64]) -> RankedDifferences {
    let nonzero: Vec<f64> = differences.iter().copied().filter(|d| *d != 0.0).collect();
    let n_zero = differences.len() - nonzero.len();

    let mut order: Vec<usize> = (0..nonzero.len()).collect();
    order.sort_by(|&a, &b| nonzero[a].abs().total_cmp(&nonzero[b].abs()));

    let mut ranks = vec![0.0; nonzero.len()];
    let mut ties = Vec::new();
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && nonzero[order[j + 1]].abs() == nonzero[order[i]].abs() {
            j += 1;
        }
        // positions i..=j share the average of ranks i+1..=j+1
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for &idx in &order[i..=j] {
            ranks[idx] = avg_rank;
        }
        if j > i {
            ties.push(j - i + 1);
        }
        i = j + 1;
    }

    let mut w_plus = 0.0;
    let mut w_minus = 0.0;
    for (d, r) in nonzero.iter().zip(&ranks) {
        if *d > 0.0 {
            w_plus += r;
        } else {
            w_minus += r;
        }
    }

    RankedDifferences {
        w_plus,
        w_minus,
        n_nonzero: nonzero.len(),
        n_zero,
        ties,
    }
}

fn normal_approximation(ranked: &RankedDifferences, statistic: f64) -> f64 {
    let n = ranked.n_nonzero as f64;
    let expected = n * (n + 1.0) / 4.0;
    let tie_adjustment: f64 = ranked
        .ties
        .iter()
        .map(|&t| {
            let t = t as f64;
            t * (t * t - 1.0)
        })
        .sum();
    let variance = (n * (n + 1.0) * (2.0 * n + 1.0) - 0.5 * tie_adjustment) / 24.0;
    if variance <= 0.0 {
        return 1.0;
    }
    let z = (statistic - expected) / variance.sqrt();
    (2.0 * standard_normal_cdf(-z.abs())).min(1.0)
}

/// Two-sided Wilcoxon signed-rank test on paired differences
///
/// When every difference is exactly zero the test is undefined; the outcome
/// then carries no statistic and p = 1.0 (no evidence of a difference).
///
/// # Example
/// ```
/// use entropy_compare::hypothesis::wilcoxon_signed_rank;
///
/// let result = wilcoxon_signed_rank(&[0.0, 0.0, 0.0]);
/// assert_eq!(result.statistic, None);
/// assert_eq!(result.p_value, 1.0);
/// ```
pub fn wilcoxon_signed_rank(differences: &[f64]) -> SignedRankOutcome {
    wilcoxon_with_null(differences, None)
}

/// Same as [`wilcoxon_signed_rank`], reusing a prebuilt exact distribution
/// when its size matches
pub(crate) fn wilcoxon_with_null(
    differences: &[f64],
    null: Option<&SignedRankNull>,
) -> SignedRankOutcome {
    let ranked = rank_differences(differences);
    if ranked.n_nonzero == 0 {
        return SignedRankOutcome {
            statistic: None,
            p_value: 1.0,
            n_nonzero: 0,
        };
    }

    let statistic = ranked.w_plus.min(ranked.w_minus);
    let exact = ranked.n_zero == 0 && ranked.ties.is_empty() && ranked.n_nonzero <= EXACT_MAX_N;

    let p_value = if exact {
        match null.filter(|d| d.n() == ranked.n_nonzero) {
            Some(dist) => dist.two_sided_p(statistic),
            None => SignedRankNull::new(ranked.n_nonzero).two_sided_p(statistic),
        }
    } else {
        normal_approximation(&ranked, statistic)
    };

    SignedRankOutcome {
        statistic: Some(statistic),
        p_value,
        n_nonzero: ranked.n_nonzero,
    }
}
