//! Type definitions for claim fraud scoring

pub mod claim;
pub mod feature;
pub mod prediction;

pub use claim::{validate_overrides, ClaimInput, IncidentSeverity, PoliceReport};
pub use feature::{FeatureOverrides, FeatureRecord, FeatureValue};
pub use prediction::{FraudPrediction, ScoredClaim};
