// Seed distribution analysis
//
// Characterizes the 32-bit seeds each entropy source handed to the sampler:
// - Kolmogorov-Smirnov uniformity on seeds normalized to [0, 1)
// - Chi-squared goodness of fit over 16 equal-width bins
// - Lag-1 autocorrelation in generation order
// - Pairwise two-sample KS between sources
//
// KS p-values use the asymptotic Kolmogorov distribution with the
// Stephens small-sample correction.

use crate::aggregate::{mean, sample_std};
use crate::error::CellError;
use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF};
use std::collections::BTreeMap;

/// Fewest seeds for which distribution tests are run
pub const MIN_SEEDS: usize = 10;
pub const CHI_SQUARED_BINS: usize = 16;
const SEED_RANGE: f64 = 4_294_967_296.0;
const SIGNIFICANCE: f64 = 0.05;

/// Seeds per condition, conditions in first-insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeedSet {
    conditions: Vec<String>,
    seeds: BTreeMap<String, Vec<u64>>,
}

impl SeedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one seed, reduced modulo 2^32
    pub fn push(&mut self, condition: &str, seed: u64) {
        if !self.seeds.contains_key(condition) {
            self.conditions.push(condition.to_string());
        }
        self.seeds
            .entry(condition.to_string())
            .or_default()
            .push(seed & 0xFFFF_FFFF);
    }

    pub fn conditions(&self) -> &[String] {
        &self.conditions
    }

    pub fn seeds(&self, condition: &str) -> &[u64] {
        self.seeds.get(condition).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.seeds.values().all(Vec::is_empty)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KsUniformity {
    pub statistic: f64,
    pub p_value: f64,
    pub uniform_at_005: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChiSquaredUniformity {
    pub statistic: f64,
    pub p_value: f64,
    pub n_bins: usize,
    pub uniform_at_005: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeedStats {
    pub n_seeds: usize,
    pub mean_normalized: f64,
    pub std_normalized: Option<f64>,
    pub min: u64,
    pub max: u64,
    pub ks_uniformity: KsUniformity,
    pub chi2_uniformity: ChiSquaredUniformity,
    pub lag1_autocorrelation: f64,
}

/// Per-condition outcome; too few seeds serializes as `{"error", "n"}`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SeedOutcome {
    Analyzed(SeedStats),
    Skipped { error: CellError, n: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TwoSampleKs {
    pub ks_statistic: f64,
    pub p_value: f64,
    pub distributions_differ_005: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeedAnalysis {
    pub per_source: BTreeMap<String, SeedOutcome>,
    pub pairwise_distribution_tests: BTreeMap<String, TwoSampleKs>,
}

/// Kolmogorov survival function Q(lambda) = 2 sum (-1)^(j-1) exp(-2 j^2 lambda^2)
fn kolmogorov_q(lambda: f64) -> f64 {
    let a2 = -2.0 * lambda * lambda;
    let mut sign = 2.0;
    let mut sum = 0.0;
    let mut previous = 0.0;
    for j in 1..=100 {
        let j = j as f64;
        let term = sign * (a2 * j * j).exp();
        sum += term;
        if term.abs() <= 1e-3 * previous || term.abs() <= 1e-8 * sum {
            return sum.clamp(0.0, 1.0);
        }
        sign = -sign;
        previous = term.abs();
    }
    // no convergence: lambda is near 0
    1.0
}

fn ks_p_value(statistic: f64, effective_n: f64) -> f64 {
    let root = effective_n.sqrt();
    kolmogorov_q((root + 0.12 + 0.11 / root) * statistic)
}

fn normalize(seeds: &[u64]) -> Vec<f64> {
    seeds.iter().map(|&s| s as f64 / SEED_RANGE).collect()
}

/// One-sample KS statistic against U(0, 1)
fn ks_uniform_statistic(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len() as f64;
    sorted
        .iter()
        .enumerate()
        .map(|(i, &x)| {
            let cdf = x.clamp(0.0, 1.0);
            let above = (i + 1) as f64 / n - cdf;
            let below = cdf - i as f64 / n;
            above.max(below)
        })
        .fold(0.0, f64::max)
}

/// Two-sample KS statistic: sup |F1 - F2|
fn ks_two_sample_statistic(a: &[f64], b: &[f64]) -> f64 {
    let mut a = a.to_vec();
    let mut b = b.to_vec();
    a.sort_by(f64::total_cmp);
    b.sort_by(f64::total_cmp);
    let (na, nb) = (a.len() as f64, b.len() as f64);

    let (mut i, mut j) = (0, 0);
    let mut d: f64 = 0.0;
    while i < a.len() && j < b.len() {
        let x = a[i].min(b[j]);
        while i < a.len() && a[i] <= x {
            i += 1;
        }
        while j < b.len() && b[j] <= x {
            j += 1;
        }
        d = d.max((i as f64 / na - j as f64 / nb).abs());
    }
    d
}

fn chi_squared_uniformity(values: &[f64]) -> ChiSquaredUniformity {
    let mut observed = [0usize; CHI_SQUARED_BINS];
    for &x in values {
        let bin = ((x * CHI_SQUARED_BINS as f64) as usize).min(CHI_SQUARED_BINS - 1);
        observed[bin] += 1;
    }
    let expected = values.len() as f64 / CHI_SQUARED_BINS as f64;
    let statistic: f64 = observed
        .iter()
        .map(|&o| (o as f64 - expected).powi(2) / expected)
        .sum();

    let p_value = match ChiSquared::new((CHI_SQUARED_BINS - 1) as f64) {
        Ok(dist) => 1.0 - dist.cdf(statistic),
        Err(e) => {
            tracing::warn!("Invalid chi-squared distribution: {}", e);
            1.0
        }
    };

    ChiSquaredUniformity {
        statistic,
        p_value,
        n_bins: CHI_SQUARED_BINS,
        uniform_at_005: p_value > SIGNIFICANCE,
    }
}

/// Lag-1 autocorrelation normalized by the population variance
fn lag1_autocorrelation(values: &[f64]) -> f64 {
    let n = values.len();
    let Some(m) = mean(values) else {
        return 0.0;
    };
    if n < 3 {
        return 0.0;
    }
    let var_pop = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n as f64;
    if var_pop <= 0.0 {
        return 0.0;
    }
    let covariance: f64 = values
        .windows(2)
        .map(|w| (w[0] - m) * (w[1] - m))
        .sum();
    covariance / ((n - 1) as f64 * var_pop)
}

fn analyze_source(seeds: &[u64]) -> SeedOutcome {
    let n = seeds.len();
    if n < MIN_SEEDS {
        return SeedOutcome::Skipped {
            error: CellError::TooFewSeeds,
            n,
        };
    }

    let normalized = normalize(seeds);
    let raw: Vec<f64> = seeds.iter().map(|&s| s as f64).collect();
    let ks_statistic = ks_uniform_statistic(&normalized);
    let ks_p = ks_p_value(ks_statistic, n as f64);

    SeedOutcome::Analyzed(SeedStats {
        n_seeds: n,
        mean_normalized: mean(&normalized).unwrap_or(0.0),
        std_normalized: sample_std(&normalized),
        min: seeds.iter().copied().min().unwrap_or(0),
        max: seeds.iter().copied().max().unwrap_or(0),
        ks_uniformity: KsUniformity {
            statistic: ks_statistic,
            p_value: ks_p,
            uniform_at_005: ks_p > SIGNIFICANCE,
        },
        chi2_uniformity: chi_squared_uniformity(&normalized),
        lag1_autocorrelation: lag1_autocorrelation(&raw),
    })
}

/// Distribution tests for every condition and every pair of conditions
pub fn analyze_seeds(set: &SeedSet) -> SeedAnalysis {
    let per_source = set
        .conditions()
        .iter()
        .map(|c| (c.clone(), analyze_source(set.seeds(c))))
        .collect();

    let mut pairwise = BTreeMap::new();
    let conditions = set.conditions();
    for (i, first) in conditions.iter().enumerate() {
        for second in &conditions[i + 1..] {
            let a = normalize(set.seeds(first));
            let b = normalize(set.seeds(second));
            if a.is_empty() || b.is_empty() {
                continue;
            }
            let statistic = ks_two_sample_statistic(&a, &b);
            let (na, nb) = (a.len() as f64, b.len() as f64);
            let p_value = ks_p_value(statistic, na * nb / (na + nb));
            pairwise.insert(
                format!("{}_vs_{}", first, second),
                TwoSampleKs {
                    ks_statistic: statistic,
                    p_value,
                    distributions_differ_005: p_value < SIGNIFICANCE,
                },
            );
        }
    }

    tracing::debug!("Analyzed seeds for {} sources", set.conditions().len());
    SeedAnalysis {
        per_source,
        pairwise_distribution_tests: pairwise,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn uniform_seeds(seed: u64, n: usize) -> Vec<u64> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..n).map(|_| u64::from(rng.gen::<u32>())).collect()
    }

    #[test]
    fn test_kolmogorov_q_limits() {
        assert_eq!(kolmogorov_q(0.0), 1.0);
        assert!(kolmogorov_q(3.0) < 1e-6);
        // Q(1.36) ~= 0.049
        assert!((kolmogorov_q(1.36) - 0.0494).abs() < 1e-3);
    }

    #[test]
    fn test_uniform_seeds_look_uniform() {
        let mut set = SeedSet::new();
        for s in uniform_seeds(3, 2000) {
            set.push("QRNG", s);
        }
        let analysis = analyze_seeds(&set);
        let SeedOutcome::Analyzed(stats) = &analysis.per_source["QRNG"] else {
            panic!("expected analyzed seeds");
        };
        assert_eq!(stats.n_seeds, 2000);
        assert!((stats.mean_normalized - 0.5).abs() < 0.05);
        assert!(stats.ks_uniformity.statistic < 0.05);
        assert!(stats.lag1_autocorrelation.abs() < 0.1);
        assert_eq!(stats.chi2_uniformity.n_bins, 16);
    }

    #[test]
    fn test_clustered_seeds_are_not_uniform() {
        let mut set = SeedSet::new();
        for i in 0..200u64 {
            set.push("PRNG", i * 1000);
        }
        let analysis = analyze_seeds(&set);
        let SeedOutcome::Analyzed(stats) = &analysis.per_source["PRNG"] else {
            panic!("expected analyzed seeds");
        };
        assert!(!stats.ks_uniformity.uniform_at_005);
        assert!(!stats.chi2_uniformity.uniform_at_005);
        assert!(stats.lag1_autocorrelation > 0.9);
    }

    #[test]
    fn test_too_few_seeds() {
        let mut set = SeedSet::new();
        for i in 0..4 {
            set.push("TRNG", i);
        }
        let analysis = analyze_seeds(&set);
        let json = serde_json::to_value(&analysis.per_source["TRNG"]).unwrap();
        assert_eq!(json["error"], "too few seeds");
        assert_eq!(json["n"], 4);
    }

    #[test]
    fn test_pairwise_ks_detects_shifted_source() {
        let mut set = SeedSet::new();
        for s in uniform_seeds(1, 300) {
            set.push("PRNG", s);
        }
        for s in uniform_seeds(2, 300) {
            set.push("TRNG", s / 4);
        }
        let analysis = analyze_seeds(&set);
        let pair = &analysis.pairwise_distribution_tests["PRNG_vs_TRNG"];
        assert!(pair.distributions_differ_005);
        assert!(pair.ks_statistic > 0.5);
    }

    #[test]
    fn test_seeds_are_reduced_to_32_bits() {
        let mut set = SeedSet::new();
        set.push("PRNG", (1u64 << 32) + 7);
        assert_eq!(set.seeds("PRNG"), &[7]);
        assert!(set.seeds("QRNG").is_empty());
    }
}
