//! CLI argument parsing for entropy-compare

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the analysis report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Full JSON report (default)
    Json,
    /// Human-readable console summary
    Text,
    /// Markdown tables
    Markdown,
}

#[derive(Parser, Debug)]
#[command(name = "entropy-compare")]
#[command(version)]
#[command(
    about = "Paired statistical comparison of entropy-source conditions in LLM experiments",
    long_about = None
)]
pub struct Cli {
    /// Experiment JSON files; two or more add a cross-dataset comparison
    #[arg(value_name = "INPUT", required = true)]
    pub inputs: Vec<PathBuf>,

    /// Write the report to this file instead of stdout
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Load analysis settings from a TOML file
    #[arg(long = "config", value_name = "FILE.toml")]
    pub config: Option<PathBuf>,

    /// Significance level (overrides the config file)
    #[arg(long = "alpha", value_name = "ALPHA")]
    pub alpha: Option<f64>,

    /// Monte Carlo iterations for the Wilcoxon power estimate
    #[arg(long = "simulations", value_name = "N")]
    pub simulations: Option<usize>,

    /// Seed for the power simulation
    #[arg(long = "seed", value_name = "SEED")]
    pub seed: Option<u64>,

    /// Metric for the single-turn vs multi-turn comparison
    #[arg(long = "setting-metric", value_name = "METRIC")]
    pub setting_metric: Option<String>,

    /// Output format
    #[arg(long = "format", value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Skip the seed distribution analysis
    #[arg(long = "skip-seeds")]
    pub skip_seeds: bool,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_single_input_defaults() {
        let cli = Cli::parse_from(["entropy-compare", "results.json"]);
        assert_eq!(cli.inputs, vec![PathBuf::from("results.json")]);
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(cli.output.is_none());
        assert!(cli.alpha.is_none());
        assert!(!cli.skip_seeds);
        assert!(!cli.debug);
    }

    #[test]
    fn test_cli_requires_input() {
        assert!(Cli::try_parse_from(["entropy-compare"]).is_err());
    }

    #[test]
    fn test_cli_multiple_inputs() {
        let cli = Cli::parse_from(["entropy-compare", "a.json", "b.json", "-o", "out.json"]);
        assert_eq!(cli.inputs.len(), 2);
        assert_eq!(cli.output, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from([
            "entropy-compare",
            "--alpha",
            "0.01",
            "--simulations",
            "1000",
            "--seed",
            "7",
            "--setting-metric",
            "mtld",
            "r.json",
        ]);
        assert_eq!(cli.alpha, Some(0.01));
        assert_eq!(cli.simulations, Some(1000));
        assert_eq!(cli.seed, Some(7));
        assert_eq!(cli.setting_metric.as_deref(), Some("mtld"));
    }

    #[test]
    fn test_cli_format_and_flags() {
        let cli = Cli::parse_from([
            "entropy-compare",
            "--format",
            "markdown",
            "--skip-seeds",
            "--debug",
            "--config",
            "analysis.toml",
            "r.json",
        ]);
        assert_eq!(cli.format, OutputFormat::Markdown);
        assert!(cli.skip_seeds);
        assert!(cli.debug);
        assert_eq!(cli.config, Some(PathBuf::from("analysis.toml")));
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["entropy-compare", "--format", "csv", "r.json"]).is_err());
    }
}
