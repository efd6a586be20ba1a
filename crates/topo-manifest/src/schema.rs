//! On-disk manifest shape.
//!
//! ```toml
//! name = "gcal"
//!
//! [parameters]
//! cortex_density = 47
//!
//! [levels.Retina]
//! sheet_type = "GeneratorSheet"
//!
//! [levels.V1]
//! sheet_type = "SettlingCFSheet"
//! args = [{ key = "SF", values = [1, 2] }]
//! parameters = { nominal_density = "{param.cortex_density}" }
//!
//! [[projections]]
//! match = "afferent_projections"
//! level = "V1"
//! projection_type = "CFProjection"
//! conditions = { level = "Retina" }
//! parameters = { name = "Afferent", strength = 1.5 }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use topo_kernel::ValueMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelManifest {
    pub name: String,
    /// Declared model parameters and their defaults.
    #[serde(default)]
    pub parameters: ValueMap,
    /// Dotted attribute path → value.
    #[serde(default)]
    pub attributes: ValueMap,
    /// Target sheet identity → opaque pattern description.
    #[serde(default)]
    pub training_patterns: ValueMap,
    #[serde(default)]
    pub levels: IndexMap<String, LevelManifest>,
    #[serde(default)]
    pub projections: Vec<ProjectionManifest>,
}

/// Sheets at one level.
///
/// With neither `sheets`, `identity` nor `args`, the level holds a single
/// sheet. `sheets = []` declares the level but builds nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LevelManifest {
    pub sheet_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheets: Option<Vec<ValueMap>>,
    #[serde(default)]
    pub identity: bool,
    /// Value lists combined by cartesian product, first varying slowest.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<ArgManifest>,
    /// Sheet parameters; may use `{props.KEY}` and `{param.KEY}`.
    #[serde(default)]
    pub parameters: ValueMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArgManifest {
    pub key: String,
    pub values: Vec<Value>,
}

/// One projection family into one destination level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectionManifest {
    #[serde(rename = "match")]
    pub matchname: String,
    /// Destination level.
    pub level: String,
    pub projection_type: String,
    /// Required source properties; may use `{dest.KEY}` and `{param.KEY}`.
    /// Empty matches every source.
    #[serde(default)]
    pub conditions: ValueMap,
    #[serde(default)]
    pub parameters: ParameterSets,
}

/// A single parameter table, or one table per projection to build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterSets {
    One(ValueMap),
    Many(Vec<ValueMap>),
}

impl Default for ParameterSets {
    fn default() -> Self {
        ParameterSets::One(ValueMap::new())
    }
}

impl ParameterSets {
    pub fn as_slice(&self) -> &[ValueMap] {
        match self {
            ParameterSets::One(set) => std::slice::from_ref(set),
            ParameterSets::Many(sets) => sets,
        }
    }
}
