//! Extraction adapters from experiment JSON to `SampleTable`s
//!
//! Two record layouts are understood:
//!
//! - **v1**: `single_turn.{prompt}.{source}.samples[].metrics.{metric}` and
//!   `multi_turn.{conversation}.{source}[].turns[].metrics.{metric}`, with the
//!   generation seed on each single-turn sample.
//! - **v2** (`"experiment_version": "v2"`): the same blocks nested under each
//!   element of `streams[]`, aggregated across streams. Prompts may carry a
//!   `domain` label and seeds live in `seed_distributions.{source}.seeds_32bit`.
//!
//! The layout fixes the condition set, the comparisons and the metrics; the
//! engine never discovers conditions from data content.

use crate::error::{AnalysisError, Result};
use crate::sample_table::{ConditionPair, SampleTable};
use crate::seeds::SeedSet;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

const V1_METRICS: [&str; 4] = ["shannon_char", "shannon_word", "word_diversity", "length_words"];
const V2_EXTRA_METRICS: [&str; 3] = ["mtld", "distinct_2", "repetition_ratio"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperimentVersion {
    V1,
    V2,
}

impl fmt::Display for ExperimentVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExperimentVersion::V1 => write!(f, "v1"),
            ExperimentVersion::V2 => write!(f, "v2"),
        }
    }
}

/// Conditions, comparisons and metrics of one experiment design
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperimentLayout {
    pub version: ExperimentVersion,
    pub conditions: Vec<String>,
    pub comparisons: Vec<ConditionPair>,
    pub metrics: Vec<String>,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl ExperimentLayout {
    /// PRNG / TRNG / QRNG with the four core text metrics
    pub fn v1() -> Self {
        Self {
            version: ExperimentVersion::V1,
            conditions: owned(&["PRNG", "TRNG", "QRNG"]),
            comparisons: vec![
                ConditionPair::new("TRNG", "PRNG"),
                ConditionPair::new("QRNG", "PRNG"),
                ConditionPair::new("QRNG", "TRNG"),
            ],
            metrics: owned(&V1_METRICS),
        }
    }

    /// PRNG / TRNG / HMIX with the length-corrected metrics added
    pub fn v2() -> Self {
        let mut metrics = owned(&V1_METRICS);
        metrics.extend(owned(&V2_EXTRA_METRICS));
        Self {
            version: ExperimentVersion::V2,
            conditions: owned(&["PRNG", "TRNG", "HMIX"]),
            comparisons: vec![
                ConditionPair::new("TRNG", "PRNG"),
                ConditionPair::new("HMIX", "PRNG"),
                ConditionPair::new("HMIX", "TRNG"),
            ],
            metrics,
        }
    }

    pub fn for_version(version: ExperimentVersion) -> Self {
        match version {
            ExperimentVersion::V1 => Self::v1(),
            ExperimentVersion::V2 => Self::v2(),
        }
    }

    /// Caller-defined layout; every compared condition must be declared
    pub fn custom(
        version: ExperimentVersion,
        conditions: Vec<String>,
        comparisons: Vec<ConditionPair>,
        metrics: Vec<String>,
    ) -> Result<Self> {
        for pair in &comparisons {
            for condition in [&pair.alt, &pair.base] {
                if !conditions.contains(condition) {
                    return Err(AnalysisError::UnknownCondition(condition.clone()));
                }
            }
        }
        Ok(Self {
            version,
            conditions,
            comparisons,
            metrics,
        })
    }

    pub fn comparison_keys(&self) -> Vec<String> {
        self.comparisons.iter().map(ConditionPair::key).collect()
    }
}

/// Everything the report needs from one experiment record
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedDataset {
    /// Dataset label, the model name when present
    pub label: String,
    pub layout: ExperimentLayout,
    pub single_turn: SampleTable,
    pub multi_turn: SampleTable,
    pub seeds: SeedSet,
    /// group -> domain label
    pub domains: BTreeMap<String, String>,
}

impl ExtractedDataset {
    /// Empty dataset for a layout, to be filled by hand
    pub fn new(label: impl Into<String>, layout: ExperimentLayout) -> Self {
        Self {
            label: label.into(),
            layout,
            single_turn: SampleTable::new(),
            multi_turn: SampleTable::new(),
            seeds: SeedSet::new(),
            domains: BTreeMap::new(),
        }
    }
}

/// `v2` when `experiment_version` says so, `v1` otherwise
pub fn detect_version(record: &Value) -> ExperimentVersion {
    match record.get("experiment_version").and_then(Value::as_str) {
        Some("v2") => ExperimentVersion::V2,
        _ => ExperimentVersion::V1,
    }
}

fn object<'a>(value: &'a Value, key: &str) -> Option<&'a Map<String, Value>> {
    value.get(key).and_then(Value::as_object)
}

fn array<'a>(value: &'a Value, key: &str) -> &'a [Value] {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Record every layout metric of one `metrics` object; null entries are absent
fn record_metrics(
    table: &mut SampleTable,
    group: &str,
    condition: &str,
    metrics: &[String],
    holder: &Value,
) {
    let Some(values) = object(holder, "metrics") else {
        return;
    };
    for metric in metrics {
        table.record(group, condition, metric, values.get(metric).and_then(Value::as_f64));
    }
}

/// Seed reduced modulo 2^32, whatever JSON number shape it arrived in
fn seed_value(value: &Value) -> Option<u64> {
    const MODULUS: u128 = 1 << 32;
    if let Some(v) = value.as_u64() {
        return Some(v & 0xFFFF_FFFF);
    }
    if let Some(v) = value.as_i64() {
        return Some(i128::from(v).rem_euclid(MODULUS as i128) as u64);
    }
    if let Some(v) = value.as_str().and_then(|s| s.parse::<u128>().ok()) {
        return Some((v % MODULUS) as u64);
    }
    value
        .as_f64()
        .filter(|v| v.is_finite())
        .map(|v| v.rem_euclid(MODULUS as f64) as u64)
}

fn extract_single_turn(
    block: &Map<String, Value>,
    layout: &ExperimentLayout,
    dataset: &mut ExtractedDataset,
    seeds_from_samples: bool,
) {
    for (prompt, sources) in block {
        dataset.single_turn.ensure_group(prompt);
        if let Some(domain) = sources.get("domain").and_then(Value::as_str) {
            dataset.domains.insert(prompt.clone(), domain.to_string());
        }
        let Some(sources) = sources.as_object() else {
            continue;
        };

        for condition in &layout.conditions {
            let Some(source) = sources.get(condition) else {
                continue;
            };
            for sample in array(source, "samples") {
                record_metrics(
                    &mut dataset.single_turn,
                    prompt,
                    condition,
                    &layout.metrics,
                    sample,
                );
            }
        }

        if seeds_from_samples {
            for (name, source) in sources {
                for sample in array(source, "samples") {
                    if let Some(seed) = sample.get("seed").and_then(seed_value) {
                        dataset.seeds.push(name, seed);
                    }
                }
            }
        }
    }
}

fn extract_multi_turn(
    block: &Map<String, Value>,
    layout: &ExperimentLayout,
    table: &mut SampleTable,
) {
    for (conversation, sources) in block {
        // `{"skipped": true, "reason": ...}` carries no conversations
        let Some(sources) = sources.as_object() else {
            continue;
        };
        for condition in &layout.conditions {
            let Some(runs) = sources.get(condition).and_then(Value::as_array) else {
                continue;
            };
            for run in runs {
                for turn in array(run, "turns") {
                    record_metrics(table, conversation, condition, &layout.metrics, turn);
                }
            }
        }
    }
}

fn extract_seed_distributions(block: &Map<String, Value>, seeds: &mut SeedSet) {
    for (condition, info) in block {
        for seed in array(info, "seeds_32bit").iter().filter_map(seed_value) {
            seeds.push(condition, seed);
        }
    }
}

/// Extract a dataset from a parsed experiment record
pub fn from_value(record: &Value) -> Result<ExtractedDataset> {
    if !record.is_object() {
        return Err(AnalysisError::MalformedInput(
            "experiment record must be a JSON object".to_string(),
        ));
    }

    let version = detect_version(record);
    let layout = ExperimentLayout::for_version(version);
    let label = record
        .get("model")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();
    let mut dataset = ExtractedDataset::new(label, layout.clone());

    match version {
        ExperimentVersion::V1 => {
            if let Some(block) = object(record, "single_turn") {
                extract_single_turn(block, &layout, &mut dataset, true);
            }
            if let Some(block) = object(record, "multi_turn") {
                extract_multi_turn(block, &layout, &mut dataset.multi_turn);
            }
        }
        ExperimentVersion::V2 => {
            let streams = record.get("streams").and_then(Value::as_array).ok_or_else(|| {
                AnalysisError::MalformedInput("v2 record without a streams array".to_string())
            })?;
            for stream in streams {
                if let Some(block) = object(stream, "single_turn") {
                    extract_single_turn(block, &layout, &mut dataset, false);
                }
                if let Some(block) = object(stream, "multi_turn") {
                    extract_multi_turn(block, &layout, &mut dataset.multi_turn);
                }
                if let Some(block) = object(stream, "seed_distributions") {
                    extract_seed_distributions(block, &mut dataset.seeds);
                }
            }
        }
    }

    if dataset.single_turn.is_empty() {
        tracing::warn!("{}: no single-turn observations found", dataset.label);
    }
    tracing::info!(
        "Extracted {} ({}): {} groups, {} observations",
        dataset.label,
        version,
        dataset.single_turn.groups().len(),
        dataset.single_turn.n_observations()
    );
    Ok(dataset)
}

/// Read and extract an experiment JSON file
pub fn load_file(path: impl AsRef<Path>) -> Result<ExtractedDataset> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let record: Value = serde_json::from_str(&content)?;
    from_value(&record)
}
