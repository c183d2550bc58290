// Student's t-tests
//
// One-sample, paired and Welch tests are all computed in f64 with statrs'
// Student's t distribution. Welch uses the Welch-Satterthwaite degrees of
// freedom.

use crate::aggregate::{mean, sample_std, sample_variance};
use anyhow::Result;
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};
use statrs::function::erf::erfc;

/// Result of a two-sided t-test
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TTestOutcome {
    /// t statistic; absent when it is infinite (zero spread, nonzero mean)
    pub statistic: Option<f64>,
    pub p_value: f64,
    pub df: f64,
}

/// Standard normal CDF
pub fn standard_normal_cdf(x: f64) -> f64 {
    0.5 * erfc(-x / std::f64::consts::SQRT_2)
}

/// Two-sided p-value of a t statistic
fn two_sided_p(t: f64, df: f64) -> f64 {
    match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => (2.0 * dist.cdf(-t.abs())).min(1.0),
        Err(e) => {
            tracing::warn!("Invalid t distribution (df={}): {}", df, e);
            1.0
        }
    }
}

/// One-sample two-sided t-test of `values` against `mu`
///
/// Returns `None` below two values. With zero spread the outcome is
/// t = 0, p = 1 when the mean equals `mu`, otherwise an infinite statistic
/// (reported as absent) with p = 0.
pub fn one_sample_ttest(values: &[f64], mu: f64) -> Option<TTestOutcome> {
    let n = values.len();
    let m = mean(values)?;
    let sd = sample_std(values)?;
    let df = (n - 1) as f64;
    let shift = m - mu;

    if sd == 0.0 {
        return Some(if shift == 0.0 {
            TTestOutcome {
                statistic: Some(0.0),
                p_value: 1.0,
                df,
            }
        } else {
            TTestOutcome {
                statistic: None,
                p_value: 0.0,
                df,
            }
        });
    }

    let t = shift / (sd / (n as f64).sqrt());
    Some(TTestOutcome {
        statistic: Some(t),
        p_value: two_sided_p(t, df),
        df,
    })
}

/// Paired two-sided t-test on aligned samples (`x - y`)
pub fn paired_ttest(x: &[f64], y: &[f64]) -> Option<TTestOutcome> {
    let differences: Vec<f64> = x.iter().zip(y).map(|(a, b)| a - b).collect();
    one_sample_ttest(&differences, 0.0)
}

/// Welch's independent t-test (`a` vs `b`)
///
/// Both samples need at least two values and at least one of them some
/// spread. The statistic, degrees of freedom and p-value stay in f64.
pub fn welch_ttest(a: &[f64], b: &[f64]) -> Result<TTestOutcome> {
    if a.len() < 2 || b.len() < 2 {
        anyhow::bail!("Need at least 2 samples per distribution for t-test");
    }

    let (Some(mean_a), Some(mean_b), Some(var_a), Some(var_b)) =
        (mean(a), mean(b), sample_variance(a), sample_variance(b))
    else {
        anyhow::bail!("Need at least 2 samples per distribution for t-test");
    };

    let (na, nb) = (a.len() as f64, b.len() as f64);
    let (se2_a, se2_b) = (var_a / na, var_b / nb);
    let se2 = se2_a + se2_b;
    if se2 <= 0.0 {
        anyhow::bail!("zero variance in both samples");
    }

    let t = (mean_a - mean_b) / se2.sqrt();
    let df = se2 * se2 / (se2_a * se2_a / (na - 1.0) + se2_b * se2_b / (nb - 1.0));
    let p_value = two_sided_p(t, df);
    if !(t.is_finite() && p_value.is_finite()) {
        anyhow::bail!("Welch t-test produced a non-finite result");
    }

    Ok(TTestOutcome {
        statistic: Some(t),
        p_value,
        df,
    })
}
