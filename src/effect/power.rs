// Statistical power for paired designs
//
// - Paired t-test power: analytic, via the non-central t distribution
// - Wilcoxon power: Monte Carlo under N(d, 1) differences with an injected RNG
// - Minimum detectable effect: bisection over d for the t-test power curve
//
// `PowerEstimator` ties the three to an `AnalysisConfig`, seeds a fresh
// ChaCha8 stream per (n, d) cell and memoises results so repeated cells in a
// report cost one simulation.

use super::noncentral_t::noncentral_t_cdf;
use crate::config::AnalysisConfig;
use crate::hypothesis::{wilcoxon_with_null, SignedRankNull, EXACT_MAX_N};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};
use std::collections::HashMap;

/// Smallest n for which power is defined
pub const MIN_POWER_N: usize = 3;
/// |d| below which power equals the type I error rate
const NULL_EFFECT: f64 = 1e-10;
const MDE_UPPER: f64 = 5.0;
const MDE_ITERATIONS: usize = 50;

/// Power of a two-sided paired t-test for effect size `d` with `n` pairs
///
/// Non-decreasing in |d| and in n; equals `alpha` at d = 0 and 0 for n < 3.
pub fn power_paired_ttest(d: f64, n: usize, alpha: f64) -> f64 {
    if n < MIN_POWER_N {
        return 0.0;
    }
    if d.abs() < NULL_EFFECT {
        return alpha;
    }

    let df = (n - 1) as f64;
    let ncp = d * (n as f64).sqrt();
    let t_crit = match StudentsT::new(0.0, 1.0, df) {
        Ok(dist) => dist.inverse_cdf(1.0 - alpha / 2.0),
        Err(e) => {
            tracing::warn!("Invalid t distribution (df={}): {}", df, e);
            return 0.0;
        }
    };

    let power = 1.0 - noncentral_t_cdf(t_crit, df, ncp) + noncentral_t_cdf(-t_crit, df, ncp);
    power.clamp(0.0, 1.0)
}

/// Monte Carlo power of a two-sided Wilcoxon signed-rank test
///
/// Each simulation draws `n` differences from N(d, 1) and counts a rejection
/// when p < `alpha`. Deterministic for a given RNG state.
pub fn power_wilcoxon_paired<R: Rng + ?Sized>(
    d: f64,
    n: usize,
    alpha: f64,
    simulations: usize,
    rng: &mut R,
) -> f64 {
    if n < MIN_POWER_N || simulations == 0 {
        return 0.0;
    }
    if d.abs() < NULL_EFFECT {
        return alpha;
    }
    let shifted = match Normal::new(d, 1.0) {
        Ok(dist) => dist,
        Err(e) => {
            tracing::warn!("Invalid effect size {} for simulation: {}", d, e);
            return 0.0;
        }
    };

    let null = (n <= EXACT_MAX_N).then(|| SignedRankNull::new(n));
    let mut differences = vec![0.0; n];
    let mut rejections = 0usize;
    for _ in 0..simulations {
        for value in differences.iter_mut() {
            *value = shifted.sample(rng);
        }
        if wilcoxon_with_null(&differences, null.as_ref()).p_value < alpha {
            rejections += 1;
        }
    }

    rejections as f64 / simulations as f64
}

/// Smallest |d| reaching `target_power` with a paired t-test of `n` pairs
///
/// Bisection over [0, 5]; `None` below three pairs.
pub fn minimum_detectable_effect(n: usize, alpha: f64, target_power: f64) -> Option<f64> {
    if n < MIN_POWER_N {
        return None;
    }
    let mut lo = 0.0;
    let mut hi = MDE_UPPER;
    for _ in 0..MDE_ITERATIONS {
        let mid = (lo + hi) / 2.0;
        if power_paired_ttest(mid, n, alpha) < target_power {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Some(hi)
}

/// Power block attached to each paired comparison
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PowerAnalysis {
    pub observed_d: f64,
    pub power_wilcoxon: f64,
    pub power_ttest: f64,
    pub minimum_detectable_effect_d: Option<f64>,
    pub adequately_powered: bool,
    pub note: String,
}

/// Config-bound power calculator with per-cell memoisation
#[derive(Debug, Clone)]
pub struct PowerEstimator {
    alpha: f64,
    target_power: f64,
    simulations: usize,
    seed: u64,
    wilcoxon_cache: HashMap<(usize, u64), f64>,
    mde_cache: HashMap<usize, Option<f64>>,
}

impl PowerEstimator {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            alpha: config.alpha,
            target_power: config.target_power,
            simulations: config.power_simulations,
            seed: config.seed,
            wilcoxon_cache: HashMap::new(),
            mde_cache: HashMap::new(),
        }
    }

    /// Simulated Wilcoxon power, seeded from the configured seed
    pub fn wilcoxon(&mut self, d: f64, n: usize) -> f64 {
        let (alpha, simulations, seed) = (self.alpha, self.simulations, self.seed);
        *self
            .wilcoxon_cache
            .entry((n, d.to_bits()))
            .or_insert_with(|| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                power_wilcoxon_paired(d, n, alpha, simulations, &mut rng)
            })
    }

    pub fn ttest(&self, d: f64, n: usize) -> f64 {
        power_paired_ttest(d, n, self.alpha)
    }

    pub fn minimum_detectable_effect(&mut self, n: usize) -> Option<f64> {
        let (alpha, target) = (self.alpha, self.target_power);
        *self
            .mde_cache
            .entry(n)
            .or_insert_with(|| minimum_detectable_effect(n, alpha, target))
    }

    /// Full power block for an observed paired effect
    ///
    /// Power is evaluated at |d|; the adequacy flag follows the analytic
    /// t-test power.
    pub fn analyze(&mut self, d: f64, n: usize) -> PowerAnalysis {
        let observed_d = d.abs();
        let power_wilcoxon = self.wilcoxon(observed_d, n);
        let power_ttest = self.ttest(observed_d, n);
        let mde = self.minimum_detectable_effect(n);
        let adequately_powered = power_ttest >= self.target_power;
        let note = match mde {
            Some(mde) => format!(
                "At n={}, {:.0}% power requires d>={:.3}",
                n,
                self.target_power * 100.0,
                mde
            ),
            None => format!("Power is undefined with n={}", n),
        };

        PowerAnalysis {
            observed_d,
            power_wilcoxon,
            power_ttest,
            minimum_detectable_effect_d: mde,
            adequately_powered,
            note,
        }
    }

    pub fn cached_cells(&self) -> usize {
        self.wilcoxon_cache.len()
    }
}
