//! Error types for the comparison engine
//!
//! Two tiers: `AnalysisError` is fatal and only raised at the boundary
//! (configuration, input loading); `CellError` is a recoverable per-cell
//! marker carried inside reports so one bad (metric, comparison) never aborts
//! the batch.

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Fatal errors for analysis setup and input handling
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Malformed experiment record: {0}")]
    MalformedInput(String),

    #[error("Unknown condition '{0}' in comparison list")]
    UnknownCondition(String),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for fallible analysis setup
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Recoverable failure attached to a single result cell
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CellError {
    /// One of the two conditions has no data at all for this metric
    #[error("missing source data")]
    MissingSourceData,

    /// Fewer paired groups than the configured minimum
    #[error("insufficient data")]
    InsufficientData,

    /// Too few groups with samples under both conditions
    #[error("insufficient prompts with data")]
    InsufficientGroups,

    /// No observations for a descriptive summary
    #[error("no data")]
    NoData,

    /// Not enough seeds for distribution tests
    #[error("too few seeds")]
    TooFewSeeds,

    /// The underlying test implementation failed
    #[error("{0}")]
    TestFailure(String),
}

impl Serialize for CellError {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Error marker serialized in place of a computed result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellFailure {
    pub error: CellError,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_pairs: Option<usize>,
}

impl CellFailure {
    pub fn new(error: CellError) -> Self {
        Self {
            error,
            n_pairs: None,
        }
    }

    pub fn with_n(error: CellError, n: usize) -> Self {
        Self {
            error,
            n_pairs: Some(n),
        }
    }
}

/// Either a computed result or the failure marker that replaced it
///
/// Serialized untagged: consumers look for an `error` key before reading
/// numeric fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellOutcome<T> {
    Computed(T),
    Failed(CellFailure),
}

impl<T> CellOutcome<T> {
    pub fn failed(error: CellError) -> Self {
        CellOutcome::Failed(CellFailure::new(error))
    }

    pub fn computed(&self) -> Option<&T> {
        match self {
            CellOutcome::Computed(value) => Some(value),
            CellOutcome::Failed(_) => None,
        }
    }

    pub fn computed_mut(&mut self) -> Option<&mut T> {
        match self {
            CellOutcome::Computed(value) => Some(value),
            CellOutcome::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&CellFailure> {
        match self {
            CellOutcome::Computed(_) => None,
            CellOutcome::Failed(failure) => Some(failure),
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, CellOutcome::Computed(_))
    }
}
