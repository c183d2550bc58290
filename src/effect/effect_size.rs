//! Standardized effect sizes (Cohen's d)

use crate::aggregate::{mean, sample_std, sample_variance};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Relative spread below which paired differences count as collapsed
pub const COLLAPSE_TOLERANCE: f64 = 1e-9;

/// Conventional magnitude label of |d|
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EffectMagnitude {
    Negligible,
    Small,
    Medium,
    Large,
}

impl EffectMagnitude {
    /// Classify |d| with thresholds 0.2 / 0.5 / 0.8
    pub fn from_d(d: f64) -> Self {
        let magnitude = d.abs();
        if magnitude < 0.2 {
            EffectMagnitude::Negligible
        } else if magnitude < 0.5 {
            EffectMagnitude::Small
        } else if magnitude < 0.8 {
            EffectMagnitude::Medium
        } else {
            EffectMagnitude::Large
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EffectMagnitude::Negligible => "negligible",
            EffectMagnitude::Small => "small",
            EffectMagnitude::Medium => "medium",
            EffectMagnitude::Large => "large",
        }
    }
}

impl fmt::Display for EffectMagnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cohen's d of a set of paired differences: mean / sample sd
///
/// Returns 0.0 when the differences have no spread or fewer than two values.
pub fn cohens_d_from_differences(differences: &[f64]) -> f64 {
    match (mean(differences), sample_std(differences)) {
        (Some(m), Some(sd)) if sd > 0.0 => m / sd,
        _ => 0.0,
    }
}

/// Paired Cohen's d of `x - y`
///
/// # Example
/// ```
/// use entropy_compare::effect::cohens_d_paired;
///
/// assert_eq!(cohens_d_paired(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]), 0.0);
/// ```
pub fn cohens_d_paired(x: &[f64], y: &[f64]) -> f64 {
    let differences: Vec<f64> = x.iter().zip(y).map(|(a, b)| a - b).collect();
    cohens_d_from_differences(&differences)
}

/// Independent-samples Cohen's d with pooled standard deviation
///
/// Returns 0.0 when the pooled sd is 0 or a sample has fewer than two values.
pub fn cohens_d_independent(x: &[f64], y: &[f64]) -> f64 {
    let (Some(mx), Some(my)) = (mean(x), mean(y)) else {
        return 0.0;
    };
    let (Some(vx), Some(vy)) = (sample_variance(x), sample_variance(y)) else {
        return 0.0;
    };
    let nx = x.len() as f64;
    let ny = y.len() as f64;
    let pooled = (((nx - 1.0) * vx + (ny - 1.0) * vy) / (nx + ny - 2.0)).sqrt();
    if pooled > 0.0 {
        (mx - my) / pooled
    } else {
        0.0
    }
}

/// Paired effect size guarded against variance collapse
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairedEffect {
    pub d: f64,
    /// Differences are (near) constant and nonzero
    pub variance_collapse: bool,
}

/// Paired Cohen's d with |d| capped at `max_effect_size`
///
/// A nonzero mean difference with sd <= `COLLAPSE_TOLERANCE * |mean|` is a
/// variance collapse: d is reported at the cap with the sign of the mean and
/// the result is flagged. Identical inputs stay at d = 0.
pub fn paired_effect(differences: &[f64], max_effect_size: f64) -> PairedEffect {
    let (Some(m), Some(sd)) = (mean(differences), sample_std(differences)) else {
        return PairedEffect {
            d: 0.0,
            variance_collapse: false,
        };
    };

    if m != 0.0 && sd <= COLLAPSE_TOLERANCE * m.abs() {
        return PairedEffect {
            d: max_effect_size.copysign(m),
            variance_collapse: true,
        };
    }

    let d = cohens_d_from_differences(differences);
    PairedEffect {
        d: d.clamp(-max_effect_size, max_effect_size),
        variance_collapse: false,
    }
}
