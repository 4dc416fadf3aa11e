//! Claim scorer: validation, schema completion and inference in one call

use crate::config::AppConfig;
use crate::error::ScoringError;
use crate::models::inference::InferenceEngine;
use crate::schema::{SchemaCompleter, NO_POLICE_BUT_INJURY, NO_WITNESS_HIGH_SEVERITY};
use crate::types::claim::{validate_overrides, ClaimInput};
use crate::types::feature::FeatureOverrides;
use crate::types::prediction::{FraudPrediction, ScoredClaim};
use anyhow::Result;
use tracing::debug;

/// Entry point for callers holding raw claim details
#[derive(Clone)]
pub struct ClaimScorer {
    completer: SchemaCompleter,
    engine: InferenceEngine,
    validate_input: bool,
}

impl ClaimScorer {
    /// Build a scorer from configuration, loading the model artifact
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let engine = InferenceEngine::new(config)?;
        Ok(Self::new(
            SchemaCompleter::new(config.schema.unknown_keys),
            engine,
            config.schema.validate_input,
        ))
    }

    pub fn new(completer: SchemaCompleter, engine: InferenceEngine, validate_input: bool) -> Self {
        Self {
            completer,
            engine,
            validate_input,
        }
    }

    pub fn engine(&self) -> &InferenceEngine {
        &self.engine
    }

    /// Range-check the claim fields of an override set when input validation is enabled
    pub fn check_overrides(&self, overrides: &FeatureOverrides) -> Result<(), ScoringError> {
        if self.validate_input {
            validate_overrides(overrides)?;
        }
        Ok(())
    }

    /// Score the six user-entered claim values
    pub fn assess(&self, claim: &ClaimInput) -> Result<FraudPrediction, ScoringError> {
        self.assess_overrides(&claim.to_overrides())
    }

    /// Score an arbitrary override set
    pub fn assess_overrides(
        &self,
        overrides: &FeatureOverrides,
    ) -> Result<FraudPrediction, ScoringError> {
        self.check_overrides(overrides)?;
        let record = self.completer.complete(overrides)?;
        self.engine.predict(&record)
    }

    /// Score an override set and wrap the result with its derived flags
    pub fn score(&self, overrides: &FeatureOverrides) -> Result<ScoredClaim, ScoringError> {
        self.check_overrides(overrides)?;
        let record = self.completer.complete(overrides)?;
        let prediction = self.engine.predict(&record)?;

        let scored = ScoredClaim::new(&prediction).with_flags(
            record.flag(NO_POLICE_BUT_INJURY),
            record.flag(NO_WITNESS_HIGH_SEVERITY),
        );
        debug!(
            prediction_id = %scored.prediction_id,
            probability = scored.probability,
            label = scored.label,
            "Claim scored"
        );
        Ok(scored)
    }
}
