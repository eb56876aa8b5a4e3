//! Equality predicates for metadata store queries.

use serde::{Deserialize, Serialize};

/// Filter comparison operator.
///
/// The metadata store contract only requires equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    /// Exact equality.
    Eq,
}

/// A filter value: a string or an explicit null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// A string value.
    String(String),
    /// Null / no value. Matches a null or absent field.
    Null,
}

impl FilterValue {
    /// Build a value from an optional string, mapping `None` to null.
    pub fn from_option(value: Option<&str>) -> Self {
        match value {
            Some(v) => Self::String(v.to_string()),
            None => Self::Null,
        }
    }
}

/// A single filter condition on a named document field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterField {
    /// The document field name to filter on.
    pub field: String,
    /// The comparison operator.
    pub op: FilterOp,
    /// The value to compare against.
    pub value: FilterValue,
}

impl FilterField {
    /// Create an equality predicate.
    pub fn eq(field: impl Into<String>, value: FilterValue) -> Self {
        Self {
            field: field.into(),
            op: FilterOp::Eq,
            value,
        }
    }

    /// Evaluate the predicate against a JSON document body.
    pub fn matches(&self, doc: &serde_json::Value) -> bool {
        let actual = doc.get(&self.field);
        match (self.op, &self.value) {
            (FilterOp::Eq, FilterValue::Null) => {
                matches!(actual, None | Some(serde_json::Value::Null))
            }
            (FilterOp::Eq, FilterValue::String(expected)) => {
                actual.and_then(|v| v.as_str()) == Some(expected.as_str())
            }
        }
    }
}

/// Evaluate all predicates (logical AND).
pub fn matches_all(predicates: &[FilterField], doc: &serde_json::Value) -> bool {
    predicates.iter().all(|p| p.matches(doc))
}
