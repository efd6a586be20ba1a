//! Parameter maps and sheet properties.
//!
//! Values are plain JSON values. Parameters pass through to the runtime
//! untouched; properties describe a sheet and generate its identity.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Insertion-ordered name → value map.
pub type ValueMap = IndexMap<String, Value>;

/// Keyword parameters handed to a sheet or projection constructor.
pub type Parameters = ValueMap;

/// Canonical property key order. Only these keys survive canonicalisation,
/// and they always appear in this order.
pub const PROPERTY_ORDER: [&str; 7] = [
    "eye", "level", "cone", "polarity", "SF", "opponent", "surround",
];

/// Text form of a value as used for identities and match tests.
///
/// Strings render bare and booleans and null render as `True`, `False` and
/// `None`, so `surround = true` yields the identity suffix `True`. Numbers
/// and containers render as compact JSON.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

/// Ordered descriptive properties of a sheet (level, polarity, SF, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties(ValueMap);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Text form of one property value.
    pub fn text(&self, key: &str) -> Option<String> {
        self.0.get(key).map(value_text)
    }

    pub fn level(&self) -> Option<String> {
        self.text("level")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Restrict to [`PROPERTY_ORDER`] keys, in that order. Other keys are dropped.
    pub fn canonicalize(&self) -> Self {
        let entries = PROPERTY_ORDER
            .iter()
            .filter_map(|key| self.0.get(*key).map(|v| ((*key).to_string(), v.clone())));
        Self(entries.collect())
    }

    /// Concatenated text of all values, in stored order.
    pub fn identity(&self) -> String {
        self.0.values().map(value_text).collect()
    }
}

impl From<ValueMap> for Properties {
    fn from(map: ValueMap) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl fmt::Display for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (idx, (key, value)) in self.0.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{key:?}: {value}")?;
        }
        write!(f, "}}")
    }
}
