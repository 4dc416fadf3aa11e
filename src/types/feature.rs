//! Feature values, completed feature records and per-request overrides

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A single scalar feature value.
///
/// JSON form is untagged: `35`, `2.5` or `"Major Damage"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Int(i64),
    Float(f64),
    Category(String),
}

impl FeatureValue {
    /// Numeric view of the value, `None` for categories
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Int(v) => Some(*v as f64),
            FeatureValue::Float(v) => Some(*v),
            FeatureValue::Category(_) => None,
        }
    }

    /// Category view of the value, `None` for numbers
    pub fn as_category(&self) -> Option<&str> {
        match self {
            FeatureValue::Category(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, FeatureValue::Category(_))
    }

    /// Parse a loosely typed command-line value: integer, then float, then category.
    pub fn parse_loose(raw: &str) -> Self {
        if let Ok(v) = raw.parse::<i64>() {
            FeatureValue::Int(v)
        } else if let Ok(v) = raw.parse::<f64>() {
            FeatureValue::Float(v)
        } else {
            FeatureValue::Category(raw.to_string())
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Int(v) => write!(f, "{}", v),
            FeatureValue::Float(v) => write!(f, "{}", v),
            FeatureValue::Category(s) => write!(f, "{:?}", s),
        }
    }
}

impl From<i64> for FeatureValue {
    fn from(v: i64) -> Self {
        FeatureValue::Int(v)
    }
}

impl From<f64> for FeatureValue {
    fn from(v: f64) -> Self {
        FeatureValue::Float(v)
    }
}

impl From<&str> for FeatureValue {
    fn from(v: &str) -> Self {
        FeatureValue::Category(v.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(v: String) -> Self {
        FeatureValue::Category(v)
    }
}

/// Ordered list of named values. Insertion keeps the first position of a key,
/// later writes replace the value in place.
#[derive(Debug, Clone, Default, PartialEq)]
struct OrderedValues(Vec<(String, FeatureValue)>);

impl OrderedValues {
    fn position(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|(k, _)| k == name)
    }

    fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.0.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    fn upsert(&mut self, name: String, value: FeatureValue) -> bool {
        match self.position(&name) {
            Some(idx) => {
                self.0[idx].1 = value;
                false
            }
            None => {
                self.0.push((name, value));
                true
            }
        }
    }
}

/// One completed row handed to the classifier.
///
/// Rows are built by [`crate::schema::SchemaCompleter`]; the column order is the
/// default profile order with any pass-through keys appended.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    columns: OrderedValues,
}

impl FeatureRecord {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            columns: OrderedValues(Vec::with_capacity(capacity)),
        }
    }

    /// Value of a column, if present
    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.columns.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.position(name).is_some()
    }

    /// Set a column, replacing in place when it already exists.
    ///
    /// Returns `true` when the column was appended.
    pub(crate) fn set(&mut self, name: impl Into<String>, value: impl Into<FeatureValue>) -> bool {
        self.columns.upsert(name.into(), value.into())
    }

    /// Column names in row order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.0.iter().map(|(k, _)| k.as_str())
    }

    /// `(name, value)` pairs in row order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.columns.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.columns.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.0.is_empty()
    }

    /// Read a derived 0/1 flag
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.get(name), Some(FeatureValue::Int(1)))
    }
}

impl Serialize for FeatureRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Caller-supplied values overlaying the default profile.
///
/// Deserializes from a JSON object, keeping the key order of the input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureOverrides {
    values: OrderedValues,
}

impl FeatureOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an override. A repeated key keeps its first position and takes the new value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FeatureValue>) {
        self.values.upsert(name.into(), value.into());
    }

    /// Builder-style [`FeatureOverrides::insert`]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FeatureValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.values.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<FeatureValue>> FromIterator<(K, V)> for FeatureOverrides {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut overrides = FeatureOverrides::new();
        for (k, v) in iter {
            overrides.insert(k, v);
        }
        overrides
    }
}

impl Serialize for FeatureOverrides {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FeatureOverrides {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OverridesVisitor;

        impl<'de> Visitor<'de> for OverridesVisitor {
            type Value = FeatureOverrides;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping feature names to numbers or strings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut overrides = FeatureOverrides::new();
                while let Some((name, value)) = access.next_entry::<String, FeatureValue>()? {
                    overrides.insert(name, value);
                }
                Ok(overrides)
            }
        }

        deserializer.deserialize_map(OverridesVisitor)
    }
}
