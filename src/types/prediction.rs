//! Prediction results and the scored-claim output envelope

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default decision threshold on the fraud probability
pub const DEFAULT_DECISION_THRESHOLD: f64 = 0.3;

/// Binary decision plus the probability behind it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FraudPrediction {
    /// 1 = potentially fraudulent, 0 = not
    pub label: u8,
    /// Positive-class probability (0.0 - 1.0)
    pub probability: f64,
    /// Threshold that produced `label`
    pub threshold: f64,
}

impl FraudPrediction {
    /// Label `probability` against `threshold` (inclusive)
    pub fn from_probability(probability: f64, threshold: f64) -> Self {
        Self {
            label: u8::from(probability >= threshold),
            probability,
            threshold,
        }
    }

    pub fn is_fraud(&self) -> bool {
        self.label == 1
    }

    /// Human-readable verdict
    pub fn headline(&self) -> &'static str {
        if self.is_fraud() {
            "High Fraud Risk Detected"
        } else {
            "Low Fraud Risk"
        }
    }
}

/// Output record for one scored claim
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredClaim {
    /// Unique prediction identifier
    pub prediction_id: String,

    /// Scoring timestamp
    pub scored_at: DateTime<Utc>,

    pub label: u8,

    pub probability: f64,

    pub threshold: f64,

    /// Derived flag: no police report but an injury claim
    pub no_police_but_injury: bool,

    /// Derived flag: no witnesses for major damage
    pub no_witness_high_severity: bool,
}

impl ScoredClaim {
    pub fn new(prediction: &FraudPrediction) -> Self {
        Self {
            prediction_id: uuid::Uuid::new_v4().to_string(),
            scored_at: Utc::now(),
            label: prediction.label,
            probability: prediction.probability,
            threshold: prediction.threshold,
            no_police_but_injury: false,
            no_witness_high_severity: false,
        }
    }

    /// Attach the derived fraud-signal flags
    pub fn with_flags(mut self, no_police_but_injury: bool, no_witness_high_severity: bool) -> Self {
        self.no_police_but_injury = no_police_but_injury;
        self.no_witness_high_severity = no_witness_high_severity;
        self
    }

    /// The decision this claim was scored with
    pub fn prediction(&self) -> FraudPrediction {
        FraudPrediction {
            label: self.label,
            probability: self.probability,
            threshold: self.threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_is_inclusive() {
        let at = FraudPrediction::from_probability(0.3, DEFAULT_DECISION_THRESHOLD);
        let below = FraudPrediction::from_probability(0.299_999, DEFAULT_DECISION_THRESHOLD);

        assert_eq!(at.label, 1);
        assert_eq!(below.label, 0);
        assert_eq!(at.headline(), "High Fraud Risk Detected");
        assert_eq!(below.headline(), "Low Fraud Risk");
    }

    #[test]
    fn test_scored_claim_carries_prediction() {
        let prediction = FraudPrediction::from_probability(0.72, 0.3);
        let scored = ScoredClaim::new(&prediction).with_flags(true, false);

        let json = serde_json::to_string(&scored).unwrap();
        let back: ScoredClaim = serde_json::from_str(&json).unwrap();

        assert_eq!(back.label, 1);
        assert_eq!(back.probability, 0.72);
        assert!(back.no_police_but_injury);
        assert_eq!(back.prediction_id, scored.prediction_id);
        assert_eq!(back.prediction(), prediction);
        assert_eq!(back.prediction().headline(), "High Fraud Risk Detected");
    }
}
