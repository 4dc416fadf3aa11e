//! ONNX Runtime classifier stage.
//!
//! Preprocessing runs in Rust; the exported classifier receives a
//! `[1, width]` f32 tensor and returns class probabilities.

use crate::error::{ArtifactError, ScoringError};
use crate::models::pipeline::FraudPipeline;
use crate::models::preprocess::Preprocessor;
use crate::types::feature::FeatureRecord;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Preprocessor plus an ONNX classifier session
pub struct OnnxPipeline {
    name: String,
    preprocessor: Preprocessor,
    /// Running a session needs exclusive access
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
}

impl OnnxPipeline {
    /// Load the classifier from `path`
    pub fn load<P: AsRef<Path>>(
        name: &str,
        path: P,
        preprocessor: Preprocessor,
        onnx_threads: usize,
    ) -> Result<Self, ArtifactError> {
        let path = path.as_ref();

        info!(model = %name, path = %path.display(), threads = onnx_threads, "Loading ONNX classifier");

        let session = build_session(path, onnx_threads)
            .map_err(|e| ArtifactError::Onnx(format!("{}: {}", path.display(), e)))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("prob"))
            .map(|o| o.name.clone())
            .ok_or_else(|| {
                ArtifactError::Invalid(format!(
                    "{} has no probability output; export the classifier without zipmap",
                    path.display()
                ))
            })?;

        info!(
            model = %name,
            input = %input_name,
            output = %output_name,
            "ONNX classifier loaded"
        );

        Ok(Self {
            name: name.to_string(),
            preprocessor,
            session: Mutex::new(session),
            input_name,
            output_name,
        })
    }
}

fn build_session(path: &Path, onnx_threads: usize) -> ort::Result<Session> {
    Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)?
        .with_intra_threads(onnx_threads)?
        .commit_from_file(path)
}

impl FraudPipeline for OnnxPipeline {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict_proba(&self, record: &FeatureRecord) -> Result<f64, ScoringError> {
        let features: Vec<f32> = self
            .preprocessor
            .transform(record)?
            .into_iter()
            .map(|v| v as f32)
            .collect();

        let shape = vec![1_i64, features.len() as i64];
        let input_tensor = Tensor::from_array((shape, features))
            .map_err(|e| ScoringError::Inference(format!("failed to create input tensor: {}", e)))?;

        let mut session = self
            .session
            .lock()
            .map_err(|e| ScoringError::Inference(format!("session lock poisoned: {}", e)))?;

        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_tensor])
            .map_err(|e| ScoringError::Inference(e.to_string()))?;

        let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
            ScoringError::Inference(format!("missing output '{}'", self.output_name))
        })?;
        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| ScoringError::Inference(e.to_string()))?;

        // [1, n_classes] - fraud is class index 1
        let dims: Vec<i64> = shape.iter().copied().collect();
        let prob = match dims.as_slice() {
            [1, n] if *n >= 2 => data[1],
            [1, 1] | [1] => data[0],
            _ => {
                return Err(ScoringError::Inference(format!(
                    "unexpected probability shape {:?}",
                    dims
                )))
            }
        };

        debug!(model = %self.name, prob = prob, "Extracted fraud probability");
        Ok(prob as f64)
    }
}
