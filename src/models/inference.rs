//! Inference adapter: pipeline probability to binary fraud decision

use crate::config::AppConfig;
use crate::error::{ArtifactError, ScoringError};
use crate::models::loader::ModelLoader;
use crate::models::pipeline::FraudPipeline;
use crate::types::feature::FeatureRecord;
use crate::types::prediction::FraudPrediction;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Holds the loaded pipeline and the decision threshold
#[derive(Clone)]
pub struct InferenceEngine {
    pipeline: Arc<dyn FraudPipeline>,
    threshold: f64,
}

impl InferenceEngine {
    /// Load the configured artifact. Failure here is fatal for the process.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let loader = ModelLoader::with_threads(config.model.onnx_threads);
        let pipeline = loader
            .load(&config.model.artifact_path)
            .with_context(|| {
                format!(
                    "Failed to load model artifact from {}",
                    config.model.artifact_path.display()
                )
            })?;

        info!(
            model = %pipeline.name(),
            threshold = config.detection.threshold,
            "Inference engine initialized"
        );

        Ok(Self::with_pipeline(pipeline, config.detection.threshold)?)
    }

    /// Wrap an already constructed pipeline. The threshold must lie in [0, 1].
    pub fn with_pipeline(
        pipeline: Arc<dyn FraudPipeline>,
        threshold: f64,
    ) -> Result<Self, ArtifactError> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ArtifactError::Invalid(format!(
                "decision threshold must be within [0, 1], got {}",
                threshold
            )));
        }
        Ok(Self {
            pipeline,
            threshold,
        })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn model_name(&self) -> &str {
        self.pipeline.name()
    }

    /// Score one completed record.
    ///
    /// `label` is 1 iff the fraud probability is at or above the threshold.
    pub fn predict(&self, record: &FeatureRecord) -> Result<FraudPrediction, ScoringError> {
        let start = Instant::now();

        let probability = self.pipeline.predict_proba(record)?;
        if !(0.0..=1.0).contains(&probability) {
            return Err(ScoringError::InvalidProbability(probability));
        }

        let prediction = FraudPrediction::from_probability(probability, self.threshold);

        debug!(
            model = %self.pipeline.name(),
            probability = probability,
            label = prediction.label,
            inference_time_us = start.elapsed().as_micros() as u64,
            "Inference complete"
        );

        Ok(prediction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema;
    use crate::types::feature::FeatureOverrides;

    /// Returns a fixed probability, or fails
    struct FixedPipeline(Result<f64, String>);

    impl FraudPipeline for FixedPipeline {
        fn name(&self) -> &str {
            "fixed"
        }

        fn predict_proba(&self, _record: &FeatureRecord) -> Result<f64, ScoringError> {
            self.0.clone().map_err(ScoringError::Inference)
        }
    }

    fn engine(prob: Result<f64, String>) -> InferenceEngine {
        InferenceEngine::with_pipeline(Arc::new(FixedPipeline(prob)), 0.3).unwrap()
    }

    fn record() -> FeatureRecord {
        schema::complete(&FeatureOverrides::new()).unwrap()
    }

    #[test]
    fn test_threshold_boundary_inclusive() {
        assert_eq!(engine(Ok(0.3)).predict(&record()).unwrap().label, 1);
        assert_eq!(engine(Ok(0.2999)).predict(&record()).unwrap().label, 0);
        assert_eq!(engine(Ok(0.95)).predict(&record()).unwrap().label, 1);
    }

    #[test]
    fn test_predict_is_deterministic() {
        let engine = engine(Ok(0.42));
        let record = record();

        let first = engine.predict(&record).unwrap();
        let second = engine.predict(&record).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_pipeline_errors_propagate() {
        let result = engine(Err("boom".to_string())).predict(&record());
        assert!(matches!(result, Err(ScoringError::Inference(msg)) if msg == "boom"));
    }

    #[test]
    fn test_invalid_probability_rejected() {
        assert!(matches!(
            engine(Ok(1.5)).predict(&record()),
            Err(ScoringError::InvalidProbability(_))
        ));
        assert!(matches!(
            engine(Ok(f64::NAN)).predict(&record()),
            Err(ScoringError::InvalidProbability(_))
        ));
    }

    #[test]
    fn test_threshold_outside_unit_interval_rejected() {
        for threshold in [f64::NAN, -0.1, 1.5] {
            let result = InferenceEngine::with_pipeline(Arc::new(FixedPipeline(Ok(0.5))), threshold);
            assert!(
                matches!(result, Err(ArtifactError::Invalid(_))),
                "threshold {} should be rejected",
                threshold
            );
        }

        let engine = InferenceEngine::with_pipeline(Arc::new(FixedPipeline(Ok(0.5))), 1.0).unwrap();
        assert_eq!(engine.threshold(), 1.0);
        assert_eq!(engine.model_name(), "fixed");
        assert_eq!(engine.predict(&record()).unwrap().label, 0);
    }

    #[test]
    fn test_missing_artifact_is_fatal() {
        let mut config = AppConfig::default();
        config.model.artifact_path = "missing/model.json".into();

        let err = InferenceEngine::new(&config).err().unwrap();
        assert!(err.to_string().contains("Failed to load model artifact"));
    }
}
