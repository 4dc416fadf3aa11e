//! Schema completion for fraud model inference.
//!
//! Merges caller overrides onto the default claim profile and recomputes the
//! engineered ratios and fraud-signal flags, producing a row with the exact
//! columns the classifier was trained on.

use crate::error::ScoringError;
use crate::types::feature::{FeatureOverrides, FeatureRecord, FeatureValue};
use serde::Deserialize;
use tracing::debug;

pub const AGE: &str = "age";
pub const POLICY_ANNUAL_PREMIUM: &str = "policy_annual_premium";
pub const TOTAL_CLAIM_AMOUNT: &str = "total_claim_amount";
pub const INJURY_CLAIM: &str = "injury_claim";
pub const PROPERTY_CLAIM: &str = "property_claim";
pub const VEHICLE_CLAIM: &str = "vehicle_claim";
pub const WITNESSES: &str = "witnesses";
pub const INCIDENT_SEVERITY: &str = "incident_severity";
pub const POLICE_REPORT_AVAILABLE: &str = "police_report_available";

pub const CLAIM_TO_PREMIUM_RATIO: &str = "claim_to_premium_ratio";
pub const INJURY_CLAIM_RATIO: &str = "injury_claim_ratio";
pub const PROPERTY_CLAIM_RATIO: &str = "property_claim_ratio";
pub const VEHICLE_CLAIM_RATIO: &str = "vehicle_claim_ratio";
pub const NO_POLICE_BUT_INJURY: &str = "no_police_but_injury";
pub const NO_WITNESS_HIGH_SEVERITY: &str = "no_witness_high_severity";

/// Features that are always recomputed, whatever the caller supplied
pub const DERIVED_FEATURES: [&str; 6] = [
    CLAIM_TO_PREMIUM_RATIO,
    INJURY_CLAIM_RATIO,
    PROPERTY_CLAIM_RATIO,
    VEHICLE_CLAIM_RATIO,
    NO_POLICE_BUT_INJURY,
    NO_WITNESS_HIGH_SEVERITY,
];

/// Compile-time default for one schema column
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DefaultValue {
    Int(i64),
    Float(f64),
    Category(&'static str),
}

impl DefaultValue {
    pub fn to_feature_value(self) -> FeatureValue {
        match self {
            DefaultValue::Int(v) => FeatureValue::Int(v),
            DefaultValue::Float(v) => FeatureValue::Float(v),
            DefaultValue::Category(s) => FeatureValue::Category(s.to_string()),
        }
    }
}

/// Neutral claim used for every feature the caller leaves out.
///
/// Order matches the training-time column order.
pub const DEFAULT_PROFILE: [(&str, DefaultValue); 45] = [
    // Core numeric (18)
    ("months_as_customer", DefaultValue::Int(12)),
    (AGE, DefaultValue::Int(35)),
    (POLICY_ANNUAL_PREMIUM, DefaultValue::Int(40000)),
    ("policy_deductable", DefaultValue::Int(500)),
    ("umbrella_limit", DefaultValue::Int(0)),
    ("capital-gains", DefaultValue::Int(0)),
    ("capital-loss", DefaultValue::Int(0)),
    ("bodily_injuries", DefaultValue::Int(0)),
    (WITNESSES, DefaultValue::Int(0)),
    ("number_of_vehicles_involved", DefaultValue::Int(1)),
    (TOTAL_CLAIM_AMOUNT, DefaultValue::Int(100000)),
    (INJURY_CLAIM, DefaultValue::Int(30000)),
    (PROPERTY_CLAIM, DefaultValue::Int(30000)),
    (VEHICLE_CLAIM, DefaultValue::Int(40000)),
    ("incident_hour_of_the_day", DefaultValue::Int(12)),
    ("policy_age_days", DefaultValue::Int(365)),
    ("incident_month", DefaultValue::Int(6)),
    ("incident_dayofweek", DefaultValue::Int(2)),
    // Engineered ratios (4)
    (CLAIM_TO_PREMIUM_RATIO, DefaultValue::Float(2.0)),
    (INJURY_CLAIM_RATIO, DefaultValue::Float(0.3)),
    (PROPERTY_CLAIM_RATIO, DefaultValue::Float(0.3)),
    (VEHICLE_CLAIM_RATIO, DefaultValue::Float(0.4)),
    // Fraud signal flags (2)
    (NO_POLICE_BUT_INJURY, DefaultValue::Int(0)),
    (NO_WITNESS_HIGH_SEVERITY, DefaultValue::Int(0)),
    // Categorical (20)
    ("policy_state", DefaultValue::Category("OH")),
    ("policy_csl", DefaultValue::Category("250/500")),
    ("insured_sex", DefaultValue::Category("MALE")),
    ("insured_education_level", DefaultValue::Category("High School")),
    ("insured_occupation", DefaultValue::Category("adm-clerical")),
    ("insured_hobbies", DefaultValue::Category("reading")),
    ("insured_relationship", DefaultValue::Category("husband")),
    ("incident_type", DefaultValue::Category("Single Vehicle Collision")),
    ("collision_type", DefaultValue::Category("Front Collision")),
    (INCIDENT_SEVERITY, DefaultValue::Category("Minor Damage")),
    ("authorities_contacted", DefaultValue::Category("Police")),
    ("incident_state", DefaultValue::Category("OH")),
    ("incident_city", DefaultValue::Category("Columbus")),
    ("incident_location", DefaultValue::Category("Unknown")),
    ("property_damage", DefaultValue::Category("NO")),
    (POLICE_REPORT_AVAILABLE, DefaultValue::Category("YES")),
    ("auto_make", DefaultValue::Category("Toyota")),
    ("auto_model", DefaultValue::Category("Camry")),
    ("auto_year", DefaultValue::Int(2018)),
    ("insured_zip", DefaultValue::Category("43004")),
    // Identifier-like numeric
    ("policy_number", DefaultValue::Int(0)),
];

/// What to do with override keys that are not part of the default profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownKeyPolicy {
    /// Append unknown keys to the row; the pipeline decides whether it accepts them
    #[default]
    PassThrough,
    /// Fail completion on the first unknown key
    Reject,
}

/// Builds complete feature records from partial caller input.
#[derive(Debug, Clone, Default)]
pub struct SchemaCompleter {
    unknown_keys: UnknownKeyPolicy,
}

impl SchemaCompleter {
    pub fn new(unknown_keys: UnknownKeyPolicy) -> Self {
        Self { unknown_keys }
    }

    pub fn unknown_key_policy(&self) -> UnknownKeyPolicy {
        self.unknown_keys
    }

    /// Complete `overrides` into a full feature record.
    ///
    /// Derived ratios and flags are recomputed from the merged values, so any
    /// caller-supplied value for them is overwritten.
    pub fn complete(&self, overrides: &FeatureOverrides) -> Result<FeatureRecord, ScoringError> {
        let mut record = default_record();

        for (name, value) in overrides.iter() {
            if !record.contains(name) && self.unknown_keys == UnknownKeyPolicy::Reject {
                return Err(ScoringError::UnknownFeature(name.to_string()));
            }
            if record.set(name, value.clone()) {
                debug!(feature = %name, "Passing through feature outside the default profile");
            }
        }

        // Ratios, in this order, from post-merge values
        let premium = numeric(&record, POLICY_ANNUAL_PREMIUM)?.max(1.0);
        let claim_amount = numeric(&record, TOTAL_CLAIM_AMOUNT)?;
        record.set(CLAIM_TO_PREMIUM_RATIO, claim_amount / premium);

        let total_claim = claim_amount.max(1.0);
        let injury_claim = numeric(&record, INJURY_CLAIM)?;
        record.set(INJURY_CLAIM_RATIO, injury_claim / total_claim);
        let property_claim = numeric(&record, PROPERTY_CLAIM)?;
        record.set(PROPERTY_CLAIM_RATIO, property_claim / total_claim);
        let vehicle_claim = numeric(&record, VEHICLE_CLAIM)?;
        record.set(VEHICLE_CLAIM_RATIO, vehicle_claim / total_claim);

        // Fraud signal flags
        let no_police = category_is(&record, POLICE_REPORT_AVAILABLE, "NO");
        let no_police_but_injury = no_police && injury_claim > 0.0;
        record.set(NO_POLICE_BUT_INJURY, i64::from(no_police_but_injury));

        let no_witnesses = record
            .get(WITNESSES)
            .and_then(FeatureValue::as_f64)
            .map_or(false, |w| w == 0.0);
        let major_damage = category_is(&record, INCIDENT_SEVERITY, "Major Damage");
        record.set(
            NO_WITNESS_HIGH_SEVERITY,
            i64::from(no_witnesses && major_damage),
        );

        Ok(record)
    }

    /// Number of columns in a completed record without pass-through keys
    pub fn feature_count(&self) -> usize {
        DEFAULT_PROFILE.len()
    }

    /// Schema column names in row order
    pub fn feature_names(&self) -> Vec<&'static str> {
        DEFAULT_PROFILE.iter().map(|(name, _)| *name).collect()
    }
}

/// Complete overrides with the default pass-through policy
pub fn complete(overrides: &FeatureOverrides) -> Result<FeatureRecord, ScoringError> {
    SchemaCompleter::default().complete(overrides)
}

fn default_record() -> FeatureRecord {
    let mut record = FeatureRecord::with_capacity(DEFAULT_PROFILE.len());
    for (name, value) in DEFAULT_PROFILE {
        record.set(name, value.to_feature_value());
    }
    record
}

fn numeric(record: &FeatureRecord, name: &str) -> Result<f64, ScoringError> {
    // Every name passed here is in the default profile, so the column exists
    let value = record
        .get(name)
        .ok_or_else(|| ScoringError::UnknownFeature(name.to_string()))?;
    value.as_f64().ok_or_else(|| ScoringError::NonNumericFeature {
        feature: name.to_string(),
        value: value.to_string(),
    })
}

fn category_is(record: &FeatureRecord, name: &str, expected: &str) -> bool {
    record.get(name).and_then(FeatureValue::as_category) == Some(expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ratio(record: &FeatureRecord, name: &str) -> f64 {
        record.get(name).and_then(FeatureValue::as_f64).unwrap()
    }

    fn scenario_one() -> FeatureOverrides {
        FeatureOverrides::new()
            .with("age", 35_i64)
            .with(POLICY_ANNUAL_PREMIUM, 45000_i64)
            .with(TOTAL_CLAIM_AMOUNT, 120000_i64)
            .with(INCIDENT_SEVERITY, "Minor Damage")
            .with(POLICE_REPORT_AVAILABLE, "YES")
            .with(WITNESSES, 0_i64)
    }

    #[test]
    fn test_empty_overrides_yield_full_schema() {
        let completer = SchemaCompleter::default();
        let record = completer.complete(&FeatureOverrides::new()).unwrap();

        assert_eq!(record.len(), completer.feature_count());
        let names: Vec<&str> = record.column_names().collect();
        assert_eq!(names, completer.feature_names());
    }

    #[test]
    fn test_overrides_replace_in_place() {
        let record = complete(&scenario_one()).unwrap();

        let names: Vec<&str> = record.column_names().collect();
        assert_eq!(names, SchemaCompleter::default().feature_names());
        assert_eq!(record.get(POLICY_ANNUAL_PREMIUM), Some(&FeatureValue::Int(45000)));
        assert_eq!(record.get("months_as_customer"), Some(&FeatureValue::Int(12)));
    }

    #[test]
    fn test_default_profile_not_mutated() {
        let _ = complete(&FeatureOverrides::new().with("age", 80_i64)).unwrap();
        let record = complete(&FeatureOverrides::new()).unwrap();
        assert_eq!(record.get("age"), Some(&FeatureValue::Int(35)));
    }

    #[test]
    fn test_scenario_minor_damage_with_report() {
        let record = complete(&scenario_one()).unwrap();

        assert!((ratio(&record, CLAIM_TO_PREMIUM_RATIO) - 2.6667).abs() < 1e-3);
        assert_eq!(record.get(NO_POLICE_BUT_INJURY), Some(&FeatureValue::Int(0)));
        assert_eq!(record.get(NO_WITNESS_HIGH_SEVERITY), Some(&FeatureValue::Int(0)));
    }

    #[test]
    fn test_scenario_no_police_report_with_injury() {
        let overrides = scenario_one().with(POLICE_REPORT_AVAILABLE, "NO");
        let record = complete(&overrides).unwrap();

        assert_eq!(record.get(INJURY_CLAIM), Some(&FeatureValue::Int(30000)));
        assert!(record.flag(NO_POLICE_BUT_INJURY));
    }

    #[test]
    fn test_no_police_without_injury_is_not_flagged() {
        let overrides = scenario_one()
            .with(POLICE_REPORT_AVAILABLE, "NO")
            .with(INJURY_CLAIM, 0_i64);
        let record = complete(&overrides).unwrap();

        assert!(!record.flag(NO_POLICE_BUT_INJURY));
    }

    #[test]
    fn test_scenario_no_witness_major_damage() {
        let overrides = scenario_one().with(INCIDENT_SEVERITY, "Major Damage");
        let record = complete(&overrides).unwrap();
        assert!(record.flag(NO_WITNESS_HIGH_SEVERITY));

        let overrides = overrides.with(WITNESSES, 1_i64);
        let record = complete(&overrides).unwrap();
        assert!(!record.flag(NO_WITNESS_HIGH_SEVERITY));
    }

    #[test]
    fn test_float_zero_witnesses_counts_as_none() {
        let overrides = FeatureOverrides::new()
            .with(WITNESSES, 0.0_f64)
            .with(INCIDENT_SEVERITY, "Major Damage");
        let record = complete(&overrides).unwrap();
        assert!(record.flag(NO_WITNESS_HIGH_SEVERITY));
    }

    #[test]
    fn test_zero_premium_floors_to_one() {
        let overrides = FeatureOverrides::new()
            .with(POLICY_ANNUAL_PREMIUM, 0_i64)
            .with(TOTAL_CLAIM_AMOUNT, 5000_i64);
        let record = complete(&overrides).unwrap();

        assert_eq!(ratio(&record, CLAIM_TO_PREMIUM_RATIO), 5000.0);
    }

    #[test]
    fn test_zero_total_claim_floors_to_one() {
        let overrides = FeatureOverrides::new()
            .with(TOTAL_CLAIM_AMOUNT, 0_i64)
            .with(INJURY_CLAIM, 10_i64)
            .with(PROPERTY_CLAIM, 0_i64)
            .with(VEHICLE_CLAIM, 0_i64);
        let record = complete(&overrides).unwrap();

        assert_eq!(ratio(&record, INJURY_CLAIM_RATIO), 10.0);
        assert_eq!(ratio(&record, CLAIM_TO_PREMIUM_RATIO), 0.0);
    }

    #[test]
    fn test_claim_shares_sum_to_one() {
        let overrides = FeatureOverrides::new()
            .with(TOTAL_CLAIM_AMOUNT, 87_500_i64)
            .with(INJURY_CLAIM, 12_500_i64)
            .with(PROPERTY_CLAIM, 25_000_i64)
            .with(VEHICLE_CLAIM, 50_000_i64);
        let record = complete(&overrides).unwrap();

        let sum = ratio(&record, INJURY_CLAIM_RATIO)
            + ratio(&record, PROPERTY_CLAIM_RATIO)
            + ratio(&record, VEHICLE_CLAIM_RATIO);
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_supplied_derived_values_are_overwritten() {
        let overrides = FeatureOverrides::new()
            .with(CLAIM_TO_PREMIUM_RATIO, 99.0_f64)
            .with(NO_POLICE_BUT_INJURY, 1_i64)
            .with(NO_WITNESS_HIGH_SEVERITY, 1_i64);
        let record = complete(&overrides).unwrap();

        assert_eq!(ratio(&record, CLAIM_TO_PREMIUM_RATIO), 2.5);
        assert!(!record.flag(NO_POLICE_BUT_INJURY));
        assert!(!record.flag(NO_WITNESS_HIGH_SEVERITY));
    }

    #[test]
    fn test_unknown_key_passes_through_at_end() {
        let overrides = FeatureOverrides::new().with("adjuster_notes", "late filing");
        let record = complete(&overrides).unwrap();

        assert_eq!(record.len(), DEFAULT_PROFILE.len() + 1);
        assert_eq!(record.column_names().last(), Some("adjuster_notes"));
    }

    #[test]
    fn test_unknown_key_rejected_by_policy() {
        let completer = SchemaCompleter::new(UnknownKeyPolicy::Reject);
        let overrides = FeatureOverrides::new().with("adjuster_notes", "late filing");

        match completer.complete(&overrides) {
            Err(ScoringError::UnknownFeature(name)) => assert_eq!(name, "adjuster_notes"),
            other => panic!("expected unknown feature error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_premium_fails_fast() {
        let overrides = FeatureOverrides::new().with(POLICY_ANNUAL_PREMIUM, "lots");

        match complete(&overrides) {
            Err(ScoringError::NonNumericFeature { feature, .. }) => {
                assert_eq!(feature, POLICY_ANNUAL_PREMIUM)
            }
            other => panic!("expected non-numeric error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_witnesses_never_flags() {
        let overrides = FeatureOverrides::new()
            .with(WITNESSES, "none")
            .with(INCIDENT_SEVERITY, "Major Damage");
        let record = complete(&overrides).unwrap();
        assert!(!record.flag(NO_WITNESS_HIGH_SEVERITY));
    }
}
