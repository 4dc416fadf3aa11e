//! Error types for artifact loading and claim scoring

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while loading the model artifact. Always fatal at startup.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model artifact {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid model artifact: {0}")]
    Invalid(String),

    #[error("unsupported model artifact: {0}")]
    Unsupported(String),

    #[error("ONNX runtime error: {0}")]
    Onnx(String),
}

/// Columns that did not line up with what the pipeline was fitted on
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaMismatch {
    pub missing: Vec<String>,
    pub unexpected: Vec<String>,
    pub mistyped: Vec<String>,
}

impl SchemaMismatch {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty() && self.mistyped.is_empty()
    }
}

impl fmt::Display for SchemaMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.missing.is_empty() {
            parts.push(format!("missing [{}]", self.missing.join(", ")));
        }
        if !self.unexpected.is_empty() {
            parts.push(format!("unexpected [{}]", self.unexpected.join(", ")));
        }
        if !self.mistyped.is_empty() {
            parts.push(format!("mistyped [{}]", self.mistyped.join(", ")));
        }
        write!(f, "{}", parts.join("; "))
    }
}

/// Request-level failures, returned to the caller as-is
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("feature record does not match the model schema: {0}")]
    SchemaMismatch(SchemaMismatch),

    #[error("unknown feature '{0}' in overrides")]
    UnknownFeature(String),

    #[error("feature '{feature}' must be numeric, got {value}")]
    NonNumericFeature { feature: String, value: String },

    #[error("{field} = {value} is outside the accepted range {min}..={max}")]
    InvalidInput {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("pipeline returned an invalid probability: {0}")]
    InvalidProbability(f64),

    #[error("inference failed: {0}")]
    Inference(String),
}
