//! Fraud classification pipelines: preprocessing followed by a classifier

use crate::error::{ArtifactError, ScoringError};
use crate::models::preprocess::Preprocessor;
use crate::types::feature::FeatureRecord;

/// A loaded preprocessing + classification pipeline.
///
/// Implementations are immutable after construction and shared across callers.
pub trait FraudPipeline: Send + Sync {
    /// Pipeline name for logs
    fn name(&self) -> &str;

    /// Probability of the positive (fraud) class for one completed record
    fn predict_proba(&self, record: &FeatureRecord) -> Result<f64, ScoringError>;
}

/// Binary logistic regression over an encoded feature vector
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    coefficients: Vec<f64>,
    intercept: f64,
}

impl LogisticRegression {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Result<Self, ArtifactError> {
        if coefficients.is_empty() {
            return Err(ArtifactError::Invalid("logistic regression has no coefficients".to_string()));
        }
        if !intercept.is_finite() || coefficients.iter().any(|w| !w.is_finite()) {
            return Err(ArtifactError::Invalid(
                "logistic regression has non-finite parameters".to_string(),
            ));
        }
        Ok(Self {
            coefficients,
            intercept,
        })
    }

    pub fn width(&self) -> usize {
        self.coefficients.len()
    }

    /// Linear predictor `intercept + w · x`
    pub fn decision_function(&self, x: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(x)
                .map(|(w, v)| w * v)
                .sum::<f64>()
    }

    /// Positive-class probability
    pub fn predict_proba(&self, x: &[f64]) -> f64 {
        sigmoid(self.decision_function(x))
    }
}

/// Numerically stable logistic function
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Preprocessor and logistic regression evaluated in-process
#[derive(Debug, Clone)]
pub struct LinearPipeline {
    name: String,
    preprocessor: Preprocessor,
    classifier: LogisticRegression,
}

impl LinearPipeline {
    pub fn new(
        name: impl Into<String>,
        preprocessor: Preprocessor,
        classifier: LogisticRegression,
    ) -> Result<Self, ArtifactError> {
        if preprocessor.output_width() != classifier.width() {
            return Err(ArtifactError::Invalid(format!(
                "classifier expects {} inputs but the preprocessor produces {}",
                classifier.width(),
                preprocessor.output_width()
            )));
        }
        Ok(Self {
            name: name.into(),
            preprocessor,
            classifier,
        })
    }
}

impl FraudPipeline for LinearPipeline {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict_proba(&self, record: &FeatureRecord) -> Result<f64, ScoringError> {
        let encoded = self.preprocessor.transform(record)?;
        Ok(self.classifier.predict_proba(&encoded))
    }
}
