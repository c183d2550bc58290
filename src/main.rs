use anyhow::{Context, Result};
use clap::Parser;
use entropy_compare::cli::{Cli, OutputFormat};
use entropy_compare::config::AnalysisConfig;
use entropy_compare::extract;
use entropy_compare::render;
use entropy_compare::report::{compare_reports, CrossDatasetComparison, Report, ReportAssembler};
use serde::Serialize;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::DEBUG.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

/// JSON document for two or more inputs
#[derive(Serialize)]
struct MultiDatasetOutput<'a> {
    reports: &'a [Report],
    cross_dataset_comparison: &'a CrossDatasetComparison,
}

/// Config file (if any) with command-line overrides applied
fn load_config(args: &Cli) -> Result<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => AnalysisConfig::from_toml_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AnalysisConfig::default(),
    };
    if let Some(alpha) = args.alpha {
        config.alpha = alpha;
    }
    if let Some(simulations) = args.simulations {
        config.power_simulations = simulations;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    Ok(config)
}

fn write_output(content: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote: {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let config = load_config(&args)?;
    let mut assembler = ReportAssembler::new(config)
        .context("Invalid analysis configuration")?
        .with_seed_analysis(!args.skip_seeds);
    if let Some(metric) = &args.setting_metric {
        assembler = assembler.with_setting_metric(metric.clone());
    }

    let mut reports = Vec::with_capacity(args.inputs.len());
    for input in &args.inputs {
        let dataset = extract::load_file(input)
            .with_context(|| format!("Failed to load {}", input.display()))?;
        reports.push(assembler.assemble(&dataset));
    }

    let comparison = (reports.len() >= 2).then(|| compare_reports(&reports));

    match args.format {
        OutputFormat::Json => {
            let content = match &comparison {
                Some(cross) => serde_json::to_string_pretty(&MultiDatasetOutput {
                    reports: &reports,
                    cross_dataset_comparison: cross,
                })?,
                None => serde_json::to_string_pretty(&reports[0])?,
            };
            write_output(&content, args.output.as_deref())?;
        }
        OutputFormat::Text => {
            let mut content: String = reports.iter().map(render::text_report).collect();
            if let Some(cross) = &comparison {
                content.push_str(&render::cross_dataset_text(cross));
            }
            write_output(&content, args.output.as_deref())?;
        }
        OutputFormat::Markdown => {
            let mut content = reports
                .iter()
                .map(render::markdown_tables)
                .collect::<Vec<_>>()
                .join("\n");
            if let Some(cross) = &comparison {
                content.push('\n');
                content.push_str(&render::cross_dataset_markdown(cross));
            }
            write_output(&content, args.output.as_deref())?;
        }
    }

    Ok(())
}
