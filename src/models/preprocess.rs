//! Column preprocessing fitted at training time.
//!
//! Mirrors the training pipeline's column transformer: numeric columns are
//! standardised, categorical columns one-hot encoded with unknown categories
//! ignored. Output order is all numeric columns first, then the indicator
//! block of each categorical column.

use crate::error::{ArtifactError, SchemaMismatch, ScoringError};
use crate::types::feature::{FeatureRecord, FeatureValue};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Standard scaler parameters for one numeric column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericColumn {
    pub name: String,
    pub mean: f64,
    pub scale: f64,
}

/// Fitted categories for one categorical column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalColumn {
    pub name: String,
    pub categories: Vec<String>,
}

/// Scaler + one-hot encoder over a fixed column set
#[derive(Debug, Clone)]
pub struct Preprocessor {
    numeric: Vec<NumericColumn>,
    categorical: Vec<CategoricalColumn>,
    output_width: usize,
}

impl Preprocessor {
    /// Build a preprocessor, validating the fitted parameters.
    pub fn new(
        mut numeric: Vec<NumericColumn>,
        categorical: Vec<CategoricalColumn>,
    ) -> Result<Self, ArtifactError> {
        if numeric.is_empty() && categorical.is_empty() {
            return Err(ArtifactError::Invalid("no input columns".to_string()));
        }

        let mut seen = HashSet::new();
        for name in numeric
            .iter()
            .map(|c| &c.name)
            .chain(categorical.iter().map(|c| &c.name))
        {
            if !seen.insert(name.as_str()) {
                return Err(ArtifactError::Invalid(format!("duplicate column '{}'", name)));
            }
        }

        for column in &mut numeric {
            if !column.mean.is_finite() || !column.scale.is_finite() {
                return Err(ArtifactError::Invalid(format!(
                    "non-finite scaler parameters for '{}'",
                    column.name
                )));
            }
            // Constant columns were fitted with a zero variance
            if column.scale == 0.0 {
                column.scale = 1.0;
            }
        }

        for column in &categorical {
            if column.categories.is_empty() {
                return Err(ArtifactError::Invalid(format!(
                    "categorical column '{}' has no categories",
                    column.name
                )));
            }
        }

        let output_width =
            numeric.len() + categorical.iter().map(|c| c.categories.len()).sum::<usize>();

        Ok(Self {
            numeric,
            categorical,
            output_width,
        })
    }

    /// Length of the encoded vector
    pub fn output_width(&self) -> usize {
        self.output_width
    }

    /// Number of raw input columns
    pub fn input_columns(&self) -> usize {
        self.numeric.len() + self.categorical.len()
    }

    /// Check the record's columns against the fitted column set.
    pub fn check_schema(&self, record: &FeatureRecord) -> Result<(), ScoringError> {
        let mut mismatch = SchemaMismatch::default();

        for column in &self.numeric {
            match record.get(&column.name) {
                None => mismatch.missing.push(column.name.clone()),
                Some(value) if !value.is_numeric() => mismatch.mistyped.push(column.name.clone()),
                Some(_) => {}
            }
        }
        for column in &self.categorical {
            match record.get(&column.name) {
                None => mismatch.missing.push(column.name.clone()),
                Some(FeatureValue::Category(_)) => {}
                Some(_) => mismatch.mistyped.push(column.name.clone()),
            }
        }

        let known: HashSet<&str> = self
            .numeric
            .iter()
            .map(|c| c.name.as_str())
            .chain(self.categorical.iter().map(|c| c.name.as_str()))
            .collect();
        mismatch.unexpected = record
            .column_names()
            .filter(|name| !known.contains(name))
            .map(str::to_string)
            .collect();

        if mismatch.is_empty() {
            Ok(())
        } else {
            Err(ScoringError::SchemaMismatch(mismatch))
        }
    }

    /// Encode one record into the classifier's input vector.
    pub fn transform(&self, record: &FeatureRecord) -> Result<Vec<f64>, ScoringError> {
        self.check_schema(record)?;

        let mut encoded = Vec::with_capacity(self.output_width);

        for column in &self.numeric {
            let x = record
                .get(&column.name)
                .and_then(FeatureValue::as_f64)
                .ok_or_else(|| ScoringError::Inference(format!("column '{}' vanished", column.name)))?;
            encoded.push((x - column.mean) / column.scale);
        }

        for column in &self.categorical {
            let value = record.get(&column.name).and_then(FeatureValue::as_category);
            // Unknown categories encode as all zeros
            encoded.extend(
                column
                    .categories
                    .iter()
                    .map(|c| if Some(c.as_str()) == value { 1.0 } else { 0.0 }),
            );
        }

        Ok(encoded)
    }
}
