// Configuration for the paired condition comparison engine
//
// Every tunable of the analysis lives here and is passed explicitly into the
// report assembler. Nothing is read from process-wide state.

use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for one analysis run
///
/// # Example
/// ```
/// use entropy_compare::config::AnalysisConfig;
///
/// let config = AnalysisConfig::default();
/// assert_eq!(config.alpha, 0.05);
/// assert_eq!(config.power_simulations, 5000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Significance level for paired tests, BH correction and power analysis
    pub alpha: f64,

    /// Power at which the minimum detectable effect is reported and above
    /// which a test counts as adequately powered
    pub target_power: f64,

    /// Monte Carlo iterations for the Wilcoxon power estimate
    pub power_simulations: usize,

    /// Seed for the Wilcoxon power simulation
    ///
    /// Each (n, d) cell gets a fresh generator from this seed, so estimates do
    /// not depend on the order cells are evaluated in.
    pub seed: u64,

    /// Minimum number of paired groups before any statistic is computed
    pub min_pairs: usize,

    /// Cap on |d| when the spread of paired differences collapses to
    /// (almost) zero while the mean difference does not
    pub max_effect_size: f64,

    /// |percent difference| above which the figure is flagged unstable
    pub percent_difference_limit: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            target_power: 0.80,
            power_simulations: 5000,
            seed: 42,
            min_pairs: 3,
            max_effect_size: 10.0,
            percent_difference_limit: 1000.0,
        }
    }
}

impl AnalysisConfig {
    /// Stricter significance and a tighter power estimate
    pub fn strict() -> Self {
        Self {
            alpha: 0.01,
            power_simulations: 10_000,
            ..Self::default()
        }
    }

    /// Looser significance and a cheap power estimate for quick looks
    pub fn exploratory() -> Self {
        Self {
            alpha: 0.10,
            power_simulations: 1000,
            ..Self::default()
        }
    }

    /// Parse a configuration from TOML; missing keys take their defaults
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "alpha must be in (0, 1), got {}",
                self.alpha
            )));
        }

        if !(self.target_power > 0.0 && self.target_power < 1.0) {
            return Err(AnalysisError::InvalidConfig(format!(
                "target_power must be in (0, 1), got {}",
                self.target_power
            )));
        }

        if self.power_simulations == 0 {
            return Err(AnalysisError::InvalidConfig(
                "power_simulations must be > 0".to_string(),
            ));
        }

        if self.min_pairs < 2 {
            return Err(AnalysisError::InvalidConfig(format!(
                "min_pairs must be >= 2, got {}",
                self.min_pairs
            )));
        }

        for (name, value) in [
            ("max_effect_size", self.max_effect_size),
            ("percent_difference_limit", self.percent_difference_limit),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(AnalysisError::InvalidConfig(format!(
                    "{} must be finite and positive, got {}",
                    name, value
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert_eq!(config.alpha, 0.05);
        assert_eq!(config.target_power, 0.80);
        assert_eq!(config.seed, 42);
        assert_eq!(config.min_pairs, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets_are_valid() {
        let strict = AnalysisConfig::strict();
        assert_eq!(strict.alpha, 0.01);
        assert_eq!(strict.power_simulations, 10_000);
        assert!(strict.validate().is_ok());

        let exploratory = AnalysisConfig::exploratory();
        assert_eq!(exploratory.alpha, 0.10);
        assert!(exploratory.validate().is_ok());
    }

    #[test]
    #[allow(clippy::field_reassign_with_default)]
    fn test_invalid_alpha() {
        let mut config = AnalysisConfig::default();
        config.alpha = 1.5;
        assert!(config.validate().is_err());
        config.alpha = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    #[allow(clippy::field_reassign_with_default)]
    fn test_invalid_min_pairs() {
        let mut config = AnalysisConfig::default();
        config.min_pairs = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    #[allow(clippy::field_reassign_with_default)]
    fn test_invalid_simulations() {
        let mut config = AnalysisConfig::default();
        config.power_simulations = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    #[allow(clippy::field_reassign_with_default)]
    fn test_invalid_caps() {
        let mut config = AnalysisConfig::default();
        config.max_effect_size = f64::INFINITY;
        assert!(config.validate().is_err());

        let mut config = AnalysisConfig::default();
        config.percent_difference_limit = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_toml_rejects_nan_caps() {
        for input in ["max_effect_size = nan\n", "percent_difference_limit = nan\n"] {
            let result = AnalysisConfig::from_toml_str(input);
            assert!(
                matches!(result, Err(AnalysisError::InvalidConfig(_))),
                "{:?}",
                result
            );
        }
    }

    #[test]
    fn test_from_toml_partial() {
        let config = AnalysisConfig::from_toml_str("alpha = 0.01\nseed = 7\n").unwrap();
        assert_eq!(config.alpha, 0.01);
        assert_eq!(config.seed, 7);
        assert_eq!(config.power_simulations, 5000);
    }

    #[test]
    fn test_from_toml_rejects_invalid() {
        assert!(AnalysisConfig::from_toml_str("alpha = 2.0").is_err());
        assert!(AnalysisConfig::from_toml_str("alpha = \"high\"").is_err());
    }
}
