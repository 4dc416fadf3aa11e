//! Model artifact loader.
//!
//! The artifact is a JSON export of the fitted training pipeline:
//!
//! ```json
//! {
//!   "model_name": "insurance-fraud-logreg",
//!   "numeric": [{"name": "age", "mean": 38.9, "scale": 9.1}],
//!   "categorical": [{"name": "policy_state", "categories": ["IL", "IN", "OH"]}],
//!   "classifier": {"kind": "logistic_regression", "coefficients": [0.1, 0.2, 0.3, 0.4], "intercept": -1.2}
//! }
//! ```
//!
//! Exporting a fitted scikit-learn pipeline (`ColumnTransformer` of a
//! `StandardScaler` and a `OneHotEncoder(handle_unknown="ignore")`, followed
//! by `LogisticRegression`) maps as follows:
//!
//! - `numeric`: one entry per scaler input column, in fit order, with
//!   `mean = scaler.mean_[i]` and `scale = scaler.scale_[i]`
//! - `categorical`: one entry per encoder input column, in fit order, with
//!   `categories = encoder.categories_[i]`
//! - `classifier.coefficients = clf.coef_[0]` and
//!   `classifier.intercept = clf.intercept_[0]`
//!
//! The coefficient order is the transformer's output order: all scaled
//! numeric columns first, then each categorical column's one-hot block.
//!
//! With the `onnx` feature the classifier may instead be
//! `{"kind": "onnx", "path": "fraud_model.onnx"}`, resolved relative to the
//! artifact file.

use crate::error::ArtifactError;
use crate::models::pipeline::{FraudPipeline, LinearPipeline, LogisticRegression};
use crate::models::preprocess::{CategoricalColumn, NumericColumn, Preprocessor};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Serialized training pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub model_name: String,
    #[serde(default)]
    pub numeric: Vec<NumericColumn>,
    #[serde(default)]
    pub categorical: Vec<CategoricalColumn>,
    pub classifier: ClassifierSpec,
}

/// Classifier stage of the artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassifierSpec {
    LogisticRegression { coefficients: Vec<f64>, intercept: f64 },
    Onnx { path: PathBuf },
}

/// Loads model artifacts into ready-to-use pipelines
pub struct ModelLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
}

impl ModelLoader {
    pub fn new() -> Self {
        Self::with_threads(1)
    }

    pub fn with_threads(onnx_threads: usize) -> Self {
        Self {
            onnx_threads: onnx_threads.max(1),
        }
    }

    /// Read and parse an artifact file without building the pipeline
    pub fn read_artifact<P: AsRef<Path>>(&self, path: P) -> Result<ModelArtifact, ArtifactError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ArtifactError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the artifact at `path` into a pipeline
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<Arc<dyn FraudPipeline>, ArtifactError> {
        let path = path.as_ref();

        info!(path = %path.display(), "Loading model artifact");

        let artifact = self.read_artifact(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let pipeline = self.build(artifact, base_dir)?;

        info!(model = %pipeline.name(), "Model artifact loaded successfully");
        Ok(pipeline)
    }

    /// Build a pipeline from an already parsed artifact
    pub fn build(
        &self,
        artifact: ModelArtifact,
        base_dir: &Path,
    ) -> Result<Arc<dyn FraudPipeline>, ArtifactError> {
        let preprocessor = Preprocessor::new(artifact.numeric, artifact.categorical)?;

        info!(
            model = %artifact.model_name,
            input_columns = preprocessor.input_columns(),
            encoded_width = preprocessor.output_width(),
            "Preprocessor ready"
        );

        match artifact.classifier {
            ClassifierSpec::LogisticRegression {
                coefficients,
                intercept,
            } => {
                let classifier = LogisticRegression::new(coefficients, intercept)?;
                let pipeline = LinearPipeline::new(artifact.model_name, preprocessor, classifier)?;
                Ok(Arc::new(pipeline))
            }
            ClassifierSpec::Onnx { path } => {
                self.build_onnx(&artifact.model_name, &base_dir.join(path), preprocessor)
            }
        }
    }

    #[cfg(feature = "onnx")]
    fn build_onnx(
        &self,
        name: &str,
        path: &Path,
        preprocessor: Preprocessor,
    ) -> Result<Arc<dyn FraudPipeline>, ArtifactError> {
        let pipeline =
            crate::models::onnx::OnnxPipeline::load(name, path, preprocessor, self.onnx_threads)?;
        Ok(Arc::new(pipeline))
    }

    #[cfg(not(feature = "onnx"))]
    fn build_onnx(
        &self,
        name: &str,
        path: &Path,
        _preprocessor: Preprocessor,
    ) -> Result<Arc<dyn FraudPipeline>, ArtifactError> {
        tracing::warn!(
            model = %name,
            path = %path.display(),
            onnx_threads = self.onnx_threads,
            "ONNX classifier requested but support is not compiled in"
        );
        Err(ArtifactError::Unsupported(format!(
            "'{}' uses an ONNX classifier; rebuild with --features onnx",
            name
        )))
    }
}

impl Default for ModelLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const ARTIFACT: &str = r#"{
        "model_name": "tiny",
        "numeric": [{"name": "witnesses", "mean": 1.0, "scale": 1.0}],
        "categorical": [{"name": "police_report_available", "categories": ["NO", "YES"]}],
        "classifier": {"kind": "logistic_regression", "coefficients": [-0.5, 1.0, -1.0], "intercept": 0.0}
    }"#;

    fn write_artifact(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_logistic_artifact() {
        let file = write_artifact(ARTIFACT);
        let pipeline = ModelLoader::new().load(file.path()).unwrap();
        assert_eq!(pipeline.name(), "tiny");
    }

    #[test]
    fn test_missing_file() {
        let result = ModelLoader::new().load("does/not/exist.json");
        assert!(matches!(result, Err(ArtifactError::Io { .. })));
    }

    #[test]
    fn test_malformed_json() {
        let file = write_artifact("{ not json");
        let result = ModelLoader::new().load(file.path());
        assert!(matches!(result, Err(ArtifactError::Parse { .. })));
    }

    #[test]
    fn test_coefficient_width_mismatch() {
        let file = write_artifact(&ARTIFACT.replace("[-0.5, 1.0, -1.0]", "[-0.5, 1.0]"));
        let result = ModelLoader::new().load(file.path());
        assert!(matches!(result, Err(ArtifactError::Invalid(_))));
    }

    #[cfg(not(feature = "onnx"))]
    #[test]
    fn test_onnx_classifier_needs_feature() {
        let file = write_artifact(
            r#"{
                "model_name": "onnx-model",
                "numeric": [{"name": "age", "mean": 0.0, "scale": 1.0}],
                "classifier": {"kind": "onnx", "path": "fraud_model.onnx"}
            }"#,
        );
        let result = ModelLoader::new().load(file.path());
        assert!(matches!(result, Err(ArtifactError::Unsupported(_))));
    }
}
