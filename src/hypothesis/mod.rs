// Hypothesis tests used by the comparison engine
//
// - Wilcoxon signed-rank (two-sided): exact null distribution for small
//   untied samples, normal approximation with tie correction otherwise
// - One-sample and paired t-tests via statrs' Student's t distribution
// - Welch's unequal-variance t-test with Welch-Satterthwaite df
//
// All tests are total on finite input: degenerate cases map to documented
// values instead of NaN or panics.

mod ttest;
mod wilcoxon;

pub use ttest::{one_sample_ttest, paired_ttest, standard_normal_cdf, welch_ttest, TTestOutcome};
pub use wilcoxon::{wilcoxon_signed_rank, SignedRankNull, SignedRankOutcome, EXACT_MAX_N};
pub(crate) use wilcoxon::wilcoxon_with_null;

#[cfg(test)]
mod tests;
