//! Caller-facing claim input: the six values a claims handler enters

use crate::error::ScoringError;
use crate::schema::{
    AGE, INCIDENT_SEVERITY, POLICE_REPORT_AVAILABLE, POLICY_ANNUAL_PREMIUM, TOTAL_CLAIM_AMOUNT,
    WITNESSES,
};
use crate::types::feature::FeatureOverrides;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const AGE_RANGE: (i64, i64) = (18, 100);
pub const PREMIUM_RANGE: (i64, i64) = (5_000, 300_000);
pub const TOTAL_CLAIM_RANGE: (i64, i64) = (1_000, 2_000_000);
pub const WITNESSES_RANGE: (i64, i64) = (0, 5);

/// Incident severity levels offered to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum IncidentSeverity {
    #[serde(rename = "Trivial Damage")]
    #[value(name = "trivial")]
    TrivialDamage,
    #[serde(rename = "Minor Damage")]
    #[value(name = "minor")]
    MinorDamage,
    #[serde(rename = "Major Damage")]
    #[value(name = "major")]
    MajorDamage,
}

impl IncidentSeverity {
    /// Category string the model was trained on
    pub fn as_str(&self) -> &'static str {
        match self {
            IncidentSeverity::TrivialDamage => "Trivial Damage",
            IncidentSeverity::MinorDamage => "Minor Damage",
            IncidentSeverity::MajorDamage => "Major Damage",
        }
    }
}

impl fmt::Display for IncidentSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a police report is on file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum PoliceReport {
    Yes,
    No,
}

impl PoliceReport {
    pub fn as_str(&self) -> &'static str {
        match self {
            PoliceReport::Yes => "YES",
            PoliceReport::No => "NO",
        }
    }
}

impl fmt::Display for PoliceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Claim details entered by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimInput {
    /// Customer age in years
    pub age: i64,

    /// Annual policy premium
    pub policy_annual_premium: i64,

    /// Total amount claimed
    pub total_claim_amount: i64,

    pub incident_severity: IncidentSeverity,

    pub police_report_available: PoliceReport,

    /// Number of witnesses to the incident
    pub witnesses: i64,
}

impl ClaimInput {
    /// Check every field against its accepted range (bounds inclusive)
    pub fn validate(&self) -> Result<(), ScoringError> {
        check_range(AGE, self.age as f64, AGE_RANGE)?;
        check_range(POLICY_ANNUAL_PREMIUM, self.policy_annual_premium as f64, PREMIUM_RANGE)?;
        check_range(TOTAL_CLAIM_AMOUNT, self.total_claim_amount as f64, TOTAL_CLAIM_RANGE)?;
        check_range(WITNESSES, self.witnesses as f64, WITNESSES_RANGE)?;
        Ok(())
    }

    /// The six-key override set for schema completion
    pub fn to_overrides(&self) -> FeatureOverrides {
        FeatureOverrides::new()
            .with(AGE, self.age)
            .with(POLICY_ANNUAL_PREMIUM, self.policy_annual_premium)
            .with(TOTAL_CLAIM_AMOUNT, self.total_claim_amount)
            .with(INCIDENT_SEVERITY, self.incident_severity.as_str())
            .with(POLICE_REPORT_AVAILABLE, self.police_report_available.as_str())
            .with(WITNESSES, self.witnesses)
    }
}

impl Default for ClaimInput {
    fn default() -> Self {
        Self {
            age: 35,
            policy_annual_premium: 45_000,
            total_claim_amount: 120_000,
            incident_severity: IncidentSeverity::TrivialDamage,
            police_report_available: PoliceReport::Yes,
            witnesses: 0,
        }
    }
}

/// Range-checked claim fields and their accepted bounds
const RANGED_FIELDS: [(&str, (i64, i64)); 4] = [
    (AGE, AGE_RANGE),
    (POLICY_ANNUAL_PREMIUM, PREMIUM_RANGE),
    (TOTAL_CLAIM_AMOUNT, TOTAL_CLAIM_RANGE),
    (WITNESSES, WITNESSES_RANGE),
];

/// Range-check the claim fields present in an override set.
///
/// Absent fields fall back to in-range defaults and non-numeric values are
/// left for schema completion and inference to report.
pub fn validate_overrides(overrides: &FeatureOverrides) -> Result<(), ScoringError> {
    for (field, bounds) in RANGED_FIELDS {
        if let Some(value) = overrides.get(field).and_then(|v| v.as_f64()) {
            check_range(field, value, bounds)?;
        }
    }
    Ok(())
}

fn check_range(field: &'static str, value: f64, (min, max): (i64, i64)) -> Result<(), ScoringError> {
    if (min as f64..=max as f64).contains(&value) {
        Ok(())
    } else {
        Err(ScoringError::InvalidInput {
            field,
            value,
            min: min as f64,
            max: max as f64,
        })
    }
}
