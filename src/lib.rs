//! entropy-compare - Paired condition comparison engine
//!
//! This library compares per-group measurements taken under several
//! conditions (entropy sources driving LLM sampling) and assembles a
//! structured statistical report: group and grand means, paired Wilcoxon and
//! t-tests, effect sizes with power analysis, Benjamini-Hochberg correction,
//! a random-effects view over all samples, and cross-condition dispersion.

pub mod aggregate;
pub mod cli;
pub mod comparison;
pub mod config;
pub mod dispersion;
pub mod effect;
pub mod error;
pub mod extract;
pub mod fdr;
pub mod hypothesis;
pub mod mixed_effects;
pub mod render;
pub mod report;
pub mod sample_table;
pub mod seeds;
pub mod setting;

pub use config::AnalysisConfig;
pub use error::{AnalysisError, CellError, CellOutcome, Result};
pub use report::{Report, ReportAssembler};
pub use sample_table::{ConditionPair, SampleTable};
