//! Match conditions: which source sheets a destination sheet receives from.
//!
//! For every destination level a model registers named condition
//! generators. Given the destination's properties, a generator yields a
//! [`MatchCondition`] that candidate sources are tested against. The
//! generator's name doubles as the match name, which selects the projection
//! rule and the projection's rank in the connection order.

use crate::error::TopoError;
use crate::value::{Properties, ValueMap, value_text};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Required property values for a source sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchCondition(ValueMap);

impl MatchCondition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style requirement.
    pub fn require(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Whether `src` satisfies every requirement.
    ///
    /// A requirement holds when the source's value text occurs inside the
    /// required value's text (`"ON"` satisfies `["ON","OFF"]`, and `1`
    /// satisfies `12`). Keys the source does not carry are ignored.
    pub fn holds(&self, src: &Properties) -> bool {
        self.0.iter().all(|(key, required)| match src.get(key) {
            Some(actual) => value_text(required).contains(&value_text(actual)),
            None => true,
        })
    }
}

impl From<ValueMap> for MatchCondition {
    fn from(map: ValueMap) -> Self {
        Self(map)
    }
}

/// Condition generator: destination properties → condition, or none.
pub type ConditionFn<Ctx> =
    Arc<dyn Fn(&Ctx, &Properties) -> Option<MatchCondition> + Send + Sync>;

/// Match name → computed condition (`None` never matches).
pub type Conditions = IndexMap<String, Option<MatchCondition>>;

/// Level → match name → condition generator.
pub struct MatchConditions<Ctx> {
    levels: IndexMap<String, IndexMap<String, ConditionFn<Ctx>>>,
}

impl<Ctx> MatchConditions<Ctx> {
    pub fn new() -> Self {
        Self {
            levels: IndexMap::new(),
        }
    }

    /// Add a generator under `(level, name)`, replacing any previous one.
    pub fn register<F>(&mut self, level: impl Into<String>, name: impl Into<String>, generator: F)
    where
        F: Fn(&Ctx, &Properties) -> Option<MatchCondition> + Send + Sync + 'static,
    {
        self.levels
            .entry(level.into())
            .or_default()
            .insert(name.into(), Arc::new(generator));
    }

    pub fn contains(&self, level: &str) -> bool {
        self.levels.contains_key(level)
    }

    /// Evaluate every generator registered for `level`.
    pub fn compute_conditions(
        &self,
        level: &str,
        ctx: &Ctx,
        properties: &Properties,
    ) -> Result<Conditions, TopoError> {
        let generators = self
            .levels
            .get(level)
            .ok_or_else(|| TopoError::UnknownMatchLevel(level.to_string()))?;
        Ok(generators
            .iter()
            .map(|(name, generator)| (name.clone(), generator(ctx, properties)))
            .collect())
    }
}

impl<Ctx> Default for MatchConditions<Ctx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ctx> Clone for MatchConditions<Ctx> {
    fn clone(&self) -> Self {
        Self {
            levels: self.levels.clone(),
        }
    }
}

impl<Ctx> fmt::Debug for MatchConditions<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (level, conds) in &self.levels {
            map.entry(level, &conds.keys().collect::<Vec<_>>());
        }
        map.finish()
    }
}
