// Effect sizes and power analysis
//
// - Cohen's d (paired and independent) with magnitude labels
// - Non-central t distribution (AS 243) for analytic t-test power
// - Simulated Wilcoxon power and minimum detectable effect

mod effect_size;
mod noncentral_t;
mod power;

pub use effect_size::{
    cohens_d_from_differences, cohens_d_independent, cohens_d_paired, paired_effect,
    EffectMagnitude, PairedEffect, COLLAPSE_TOLERANCE,
};
pub use noncentral_t::noncentral_t_cdf;
pub use power::{
    minimum_detectable_effect, power_paired_ttest, power_wilcoxon_paired, PowerAnalysis,
    PowerEstimator, MIN_POWER_N,
};
