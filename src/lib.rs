//! Claim Fraud Detector Library
//!
//! Completes partially entered insurance claims into the feature schema a
//! trained classifier expects and turns the classifier's fraud probability
//! into a binary decision.

pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod schema;
pub mod scorer;
pub mod types;

pub use config::AppConfig;
pub use error::{ArtifactError, SchemaMismatch, ScoringError};
pub use models::inference::InferenceEngine;
pub use models::pipeline::FraudPipeline;
pub use schema::{complete, SchemaCompleter, UnknownKeyPolicy};
pub use scorer::ClaimScorer;
pub use types::{ClaimInput, FeatureOverrides, FeatureRecord, FeatureValue, FraudPrediction};
