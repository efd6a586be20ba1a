//! Global parameter store.
//!
//! Stands in for command-line parameter plumbing: models register their
//! declared parameters here, and values set externally (e.g. `-p name=value`)
//! override whatever the model or its caller chose.

use serde_json::Value;
use topo_kernel::{TopoError, ValueMap};
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GlobalParams {
    defaults: ValueMap,
    overrides: ValueMap,
}

impl GlobalParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `name=value`. The value is read as JSON, falling back to a
    /// plain string.
    pub fn parse_assignment(assignment: &str) -> Result<(String, Value), TopoError> {
        let (name, raw) = assignment.split_once('=').ok_or_else(|| {
            TopoError::InvalidConfiguration(format!(
                "parameter assignment `{assignment}` must look like name=value"
            ))
        })?;
        let name = name.trim();
        if name.is_empty() {
            return Err(TopoError::InvalidConfiguration(format!(
                "parameter assignment `{assignment}` has an empty name"
            )));
        }
        let raw = raw.trim();
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        Ok((name.to_string(), value))
    }

    /// External override; beats both declared defaults and caller values.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.overrides.insert(name.into(), value);
    }

    /// Declare a parameter with its default. Existing defaults are kept.
    pub fn add(&mut self, name: impl Into<String>, default: Value) {
        self.defaults.entry(name.into()).or_insert(default);
    }

    /// Current value of every declared parameter.
    pub fn get_param_values(&self) -> ValueMap {
        self.defaults
            .iter()
            .map(|(name, default)| {
                let value = self.overrides.get(name).unwrap_or(default);
                (name.clone(), value.clone())
            })
            .collect()
    }

    /// Register a model's parameters and resolve them.
    ///
    /// `declared` are the model's defaults, `explicit` the values its caller
    /// passed. Explicit values become the new defaults; overrides win over
    /// both. Only declared or explicit names are returned; an override that
    /// names neither is logged as a warning.
    pub fn register(&mut self, declared: &ValueMap, explicit: &ValueMap) -> ValueMap {
        for (name, default) in declared {
            self.add(name.clone(), default.clone());
        }
        for (name, value) in explicit {
            self.defaults.insert(name.clone(), value.clone());
        }
        for name in self.unclaimed_overrides(declared, explicit) {
            warn!(parameter = %name, "override matches no model parameter");
        }
        let values = self.get_param_values();
        declared
            .keys()
            .chain(explicit.keys())
            .filter_map(|name| values.get(name).map(|v| (name.clone(), v.clone())))
            .collect()
    }

    fn unclaimed_overrides<'a>(
        &'a self,
        declared: &'a ValueMap,
        explicit: &'a ValueMap,
    ) -> impl Iterator<Item = &'a str> {
        self.overrides
            .keys()
            .filter(|name| !declared.contains_key(*name) && !explicit.contains_key(*name))
            .map(String::as_str)
    }
}
