//! Rule registry: labelled parameter functions attached to object kinds.
//!
//! Each [`ObjectKind`] owns an [`ObjectClass`] holding the labels that build
//! objects of that kind. For sheets the label is a level name and the
//! function computes sheet parameters from the sheet's properties. For
//! projections the label is a match name and the function computes one or
//! more parameter sets from the source and destination properties.

use crate::kind::{ObjectKind, ObjectType, ProjectionKind, SheetKind};
use crate::value::{Parameters, Properties};
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// One parameter set, or several (one projection per set).
#[derive(Debug, Clone, PartialEq)]
pub enum ParamSets {
    One(Parameters),
    Many(Vec<Parameters>),
}

impl ParamSets {
    pub fn into_vec(self) -> Vec<Parameters> {
        match self {
            ParamSets::One(params) => vec![params],
            ParamSets::Many(sets) => sets,
        }
    }
}

impl From<Parameters> for ParamSets {
    fn from(params: Parameters) -> Self {
        ParamSets::One(params)
    }
}

impl From<Vec<Parameters>> for ParamSets {
    fn from(sets: Vec<Parameters>) -> Self {
        ParamSets::Many(sets)
    }
}

pub type SheetRuleFn<Ctx> = Arc<dyn Fn(&Ctx, &Properties) -> Parameters + Send + Sync>;

pub type ProjectionRuleFn<Ctx> =
    Arc<dyn Fn(&Ctx, &Properties, &Properties) -> ParamSets + Send + Sync>;

enum Rule<Ctx> {
    Sheet(SheetRuleFn<Ctx>),
    Projection(ProjectionRuleFn<Ctx>),
}

impl<Ctx> Clone for Rule<Ctx> {
    fn clone(&self) -> Self {
        match self {
            Rule::Sheet(f) => Rule::Sheet(Arc::clone(f)),
            Rule::Projection(f) => Rule::Projection(Arc::clone(f)),
        }
    }
}

/// Labelled rules for one object kind.
pub struct ObjectClass<Ctx> {
    name: String,
    kind: ObjectKind,
    labels: IndexMap<String, Rule<Ctx>>,
}

impl<Ctx> ObjectClass<Ctx> {
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            name: kind.type_name().to_lowercase(),
            kind,
            labels: IndexMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.keys().map(String::as_str)
    }

    /// Label → kind for every rule in this class.
    pub fn types(&self) -> IndexMap<String, ObjectKind> {
        self.labels
            .keys()
            .map(|label| (label.clone(), self.kind))
            .collect()
    }

    /// Convenience constructor for a parameter map.
    pub fn settings<I, K>(&self, entries: I) -> Parameters
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        entries.into_iter().map(|(k, v)| (k.into(), v)).collect()
    }
}

impl<Ctx> fmt::Debug for ObjectClass<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectClass({}, {})", self.name, self.kind)
    }
}

/// All object classes known to a model.
pub struct RuleRegistry<Ctx> {
    classes: IndexMap<ObjectKind, ObjectClass<Ctx>>,
}

impl<Ctx> RuleRegistry<Ctx> {
    /// Empty registry, no kinds registered.
    pub fn new() -> Self {
        Self {
            classes: IndexMap::new(),
        }
    }

    /// Registry with a class for every kind in the catalogue.
    pub fn with_catalogue() -> Self {
        let mut registry = Self::new();
        for kind in ObjectKind::all() {
            registry.register_decorator(kind);
        }
        registry
    }

    /// Create the class for `kind` if it does not exist yet.
    pub fn register_decorator(&mut self, kind: ObjectKind) -> &mut ObjectClass<Ctx> {
        self.classes
            .entry(kind)
            .or_insert_with(|| ObjectClass::new(kind))
    }

    pub fn class(&self, kind: ObjectKind) -> Option<&ObjectClass<Ctx>> {
        self.classes.get(&kind)
    }

    pub fn classes(&self) -> impl Iterator<Item = &ObjectClass<Ctx>> {
        self.classes.values()
    }

    /// Attach a level's parameter function to a sheet kind.
    ///
    /// A label lives in exactly one sheet class; re-registering moves it.
    pub fn register_sheet_rule<F>(&mut self, level: impl Into<String>, kind: SheetKind, rule: F)
    where
        F: Fn(&Ctx, &Properties) -> Parameters + Send + Sync + 'static,
    {
        let label = level.into();
        self.forget(&label, ObjectKind::is_sheet);
        self.register_decorator(kind.into())
            .labels
            .insert(label, Rule::Sheet(Arc::new(rule)));
    }

    /// Attach a match name's parameter function to a projection kind.
    pub fn register_projection_rule<F, P>(
        &mut self,
        matchname: impl Into<String>,
        kind: ProjectionKind,
        rule: F,
    ) where
        Ctx: 'static,
        F: Fn(&Ctx, &Properties, &Properties) -> P + Send + Sync + 'static,
        P: Into<ParamSets> + 'static,
    {
        let label = matchname.into();
        self.forget(&label, ObjectKind::is_projection);
        let rule: ProjectionRuleFn<Ctx> =
            Arc::new(move |ctx: &Ctx, src: &Properties, dest: &Properties| -> ParamSets {
                rule(ctx, src, dest).into()
            });
        self.register_decorator(kind.into())
            .labels
            .insert(label, Rule::Projection(rule));
    }

    fn forget(&mut self, label: &str, capability: fn(&ObjectKind) -> bool) {
        for class in self.classes.values_mut() {
            if capability(&class.kind) {
                class.labels.shift_remove(label);
            }
        }
    }

    /// Level → sheet parameter function.
    pub fn sheet_labels(&self) -> IndexMap<String, SheetRuleFn<Ctx>> {
        self.rules()
            .filter_map(|(label, rule)| match rule {
                Rule::Sheet(f) => Some((label.to_string(), Arc::clone(f))),
                Rule::Projection(_) => None,
            })
            .collect()
    }

    /// Level → sheet kind.
    pub fn sheet_types(&self) -> IndexMap<String, SheetKind> {
        self.kinds()
            .filter_map(|(label, kind)| match kind {
                ObjectKind::Sheet(kind) => Some((label, kind)),
                ObjectKind::Projection(_) => None,
            })
            .collect()
    }

    /// Match name → projection parameter function.
    pub fn projection_labels(&self) -> IndexMap<String, ProjectionRuleFn<Ctx>> {
        self.rules()
            .filter_map(|(label, rule)| match rule {
                Rule::Projection(f) => Some((label.to_string(), Arc::clone(f))),
                Rule::Sheet(_) => None,
            })
            .collect()
    }

    /// Match name → projection kind.
    pub fn projection_types(&self) -> IndexMap<String, ProjectionKind> {
        self.kinds()
            .filter_map(|(label, kind)| match kind {
                ObjectKind::Projection(kind) => Some((label, kind)),
                ObjectKind::Sheet(_) => None,
            })
            .collect()
    }

    fn rules(&self) -> impl Iterator<Item = (&str, &Rule<Ctx>)> {
        self.classes
            .values()
            .flat_map(|class| class.labels.iter().map(|(l, r)| (l.as_str(), r)))
    }

    fn kinds(&self) -> impl Iterator<Item = (String, ObjectKind)> + '_ {
        self.classes.values().flat_map(|class| class.types())
    }
}

impl<Ctx> Default for RuleRegistry<Ctx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ctx> Clone for RuleRegistry<Ctx> {
    fn clone(&self) -> Self {
        Self {
            classes: self
                .classes
                .iter()
                .map(|(kind, class)| {
                    (
                        *kind,
                        ObjectClass {
                            name: class.name.clone(),
                            kind: class.kind,
                            labels: class.labels.clone(),
                        },
                    )
                })
                .collect(),
        }
    }
}

impl<Ctx> fmt::Debug for RuleRegistry<Ctx> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.classes.values()).finish()
    }
}
