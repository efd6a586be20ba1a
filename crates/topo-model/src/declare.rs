//! Declarative sheet generators.
//!
//! A model declares, per level, which sheets exist: an explicit list of
//! property maps, the identity generator (one sheet, no extra properties),
//! or an argument generator built from value lists, products and
//! concatenations.

use serde_json::Value;
use topo_kernel::ValueMap;

/// Ordered list of property maps built by combination.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertyArgs {
    specs: Vec<ValueMap>,
}

impl PropertyArgs {
    /// No sheets.
    pub fn empty() -> Self {
        Self::default()
    }

    /// One map per value: `list("polarity", ["On", "Off"])`.
    pub fn list<I, V>(key: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            specs: values
                .into_iter()
                .map(|value| {
                    let mut spec = ValueMap::new();
                    spec.insert(key.to_string(), value.into());
                    spec
                })
                .collect(),
        }
    }

    pub fn from_specs(specs: Vec<ValueMap>) -> Self {
        Self { specs }
    }

    /// Cartesian product; `self` varies slowest.
    pub fn product(self, other: PropertyArgs) -> Self {
        let mut specs = Vec::with_capacity(self.specs.len() * other.specs.len());
        for left in &self.specs {
            for right in &other.specs {
                let mut spec = left.clone();
                spec.extend(right.iter().map(|(k, v)| (k.clone(), v.clone())));
                specs.push(spec);
            }
        }
        Self { specs }
    }

    /// `self` followed by `other`.
    pub fn concat(mut self, other: PropertyArgs) -> Self {
        self.specs.extend(other.specs);
        self
    }

    pub fn specs(&self) -> &[ValueMap] {
        &self.specs
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

/// Sheets declared for one level.
#[derive(Debug, Clone, PartialEq)]
pub enum SheetDeclaration {
    /// Exactly one sheet with no properties beyond its level.
    Identity,
    /// One sheet per property map. Empty skips the level.
    Sheets(Vec<ValueMap>),
    Args(PropertyArgs),
}

impl SheetDeclaration {
    /// Property maps to build, one per sheet.
    pub fn expand(self) -> Vec<ValueMap> {
        match self {
            SheetDeclaration::Identity => vec![ValueMap::new()],
            SheetDeclaration::Sheets(specs) => specs,
            SheetDeclaration::Args(args) => args.specs,
        }
    }
}

impl From<PropertyArgs> for SheetDeclaration {
    fn from(args: PropertyArgs) -> Self {
        SheetDeclaration::Args(args)
    }
}

impl From<Vec<ValueMap>> for SheetDeclaration {
    fn from(specs: Vec<ValueMap>) -> Self {
        SheetDeclaration::Sheets(specs)
    }
}
